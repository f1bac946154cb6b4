//! Tabulates every numeric channel of a log into CSV rows on a common time
//! base.
//!
//! Used in two passes over the same buffer. The first pass (`scanning`)
//! discovers the channels and their first values; the caller then fixes the
//! output columns, automatically from the discovery order or explicitly,
//! and replays the buffer, which emits the rows.

use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};

use crate::bytes::{be_i16, be_i32, be_u16, be_u24, be_u32, le_i16, le_u16};
use crate::fmt;
use crate::scan::Handler;
use crate::schema::{ChannelKey, Kind};

const TICKS_PER_SECOND: u32 = 100;

pub type ColumnInfo = Vec<(ChannelKey, String)>;

pub struct AnalogueTable<W: Write> {
    out: W,
    scanning: bool,
    reporting_period: u32,
    values: HashMap<ChannelKey, f64>,
    first_values: HashMap<ChannelKey, f64>,
    discovery_order: Vec<ChannelKey>,
    headers: Vec<(String, ChannelKey)>,
    last_timestamp: u32,
    first_timestamp: u32,
    silent_until: u32,
    first_date: Option<NaiveDateTime>,
    separator: char,
    decimal_comma: bool,
}

impl<W: Write> AnalogueTable<W> {
    pub fn new(out: W, reporting_period_seconds: f64) -> AnalogueTable<W> {
        AnalogueTable {
            out,
            scanning: true,
            reporting_period: (reporting_period_seconds * TICKS_PER_SECOND as f64) as u32,
            values: HashMap::new(),
            first_values: HashMap::new(),
            discovery_order: Vec::new(),
            headers: Vec::new(),
            last_timestamp: 0,
            first_timestamp: 0,
            silent_until: 0,
            first_date: None,
            separator: ';',
            decimal_comma: false,
        }
    }

    pub fn use_decimal_comma(&mut self, enable: bool) {
        self.decimal_comma = enable;
    }

    /// Date and time of the first `date_storage` message, when the file had
    /// a valid one. Used by callers to title their output.
    pub fn first_date(&self) -> Option<NaiveDateTime> {
        self.first_date
    }

    /// Direct access to the output, for callers that put a preamble in
    /// front of the table.
    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    fn reset_counters(&mut self) {
        self.silent_until = 0;
        self.last_timestamp = 0;
        self.first_timestamp = 0;
    }

    /// Switches from the discovery pass to the emit pass, with one column
    /// per discovered channel in first-appearance order.
    pub fn start_emitting(&mut self) -> Result<()> {
        self.headers = self
            .discovery_order
            .iter()
            .map(|key| (format!("{}:{}", key.0, key.1), *key))
            .collect();
        for value in self.values.values_mut() {
            *value = 0.0;
        }
        self.reset_counters();
        self.scanning = false;
        self.print_header()
    }

    /// Switches to the emit pass with an explicit column set and order.
    /// Channels not mentioned are not printed; the latest-value map starts
    /// from the first observed values.
    pub fn set_columns(&mut self, columns: &ColumnInfo) -> Result<()> {
        self.values = self.first_values.clone();
        self.headers.clear();
        for (key, name) in columns {
            self.values.entry(*key).or_insert(0.0);
            self.headers.push((name.clone(), *key));
        }
        self.reset_counters();
        self.scanning = false;
        self.print_header()
    }

    fn print_header(&mut self) -> Result<()> {
        write!(self.out, "time [s]")?;
        for (name, _) in &self.headers {
            write!(self.out, "{}{}", self.separator, name)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn format(&self, value: f64) -> String {
        let text = fmt::float8(value);
        if self.decimal_comma {
            fmt::with_decimal_comma(&text)
        } else {
            text
        }
    }

    fn print_row(&mut self, time_ticks: u32) -> Result<()> {
        let time = self.format(time_ticks as f64 / TICKS_PER_SECOND as f64);
        write!(self.out, "{}", time)?;
        for index in 0..self.headers.len() {
            let key = self.headers[index].1;
            let value = self.values.get(&key).copied().unwrap_or(0.0);
            let text = self.format(value);
            write!(self.out, "{}{}", self.separator, text)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn emit_values(&mut self) -> Result<()> {
        if self.scanning || self.last_timestamp == 0 {
            return Ok(());
        }

        if self.reporting_period == 0 {
            if self.first_timestamp == 0 {
                self.first_timestamp = self.last_timestamp;
            }
            return self.print_row(self.last_timestamp.wrapping_sub(self.first_timestamp));
        }

        if self.last_timestamp > self.silent_until {
            if self.silent_until == 0 {
                // skip the partial interval before the first full period
                self.silent_until = self.last_timestamp + self.reporting_period;
                self.first_timestamp = self.last_timestamp;
            } else {
                let elapsed = self.silent_until - self.first_timestamp - self.reporting_period;
                self.print_row(elapsed)?;
                self.silent_until += self.reporting_period;
            }
        }
        Ok(())
    }

    fn new_value(&mut self, header: u8, index: u8, value: f64) -> Result<()> {
        let key = (header, index);
        if !self.first_values.contains_key(&key) {
            self.first_values.insert(key, value);
            self.discovery_order.push(key);
        }
        self.values.insert(key, value);
        self.emit_values()
    }

    fn capture_first_date(&mut self, frame: &[u8]) {
        if self.first_date.is_some() {
            return;
        }
        let (second, minute, hour) = (frame[1], frame[2], frame[3]);
        let (day, month) = (frame[4], frame[5]);
        let year = be_u16(&frame[6..]);
        // an invalid calendar date leaves first_date unset
        self.first_date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
            .and_then(|date| {
                date.and_hms_opt(u32::from(hour), u32::from(minute), u32::from(second))
            });
    }
}

impl<W: Write> Handler for AnalogueTable<W> {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        let header = frame[0];
        match kind {
            Kind::Timestamp => {
                self.last_timestamp = be_u24(&frame[1..]);
                if self.first_timestamp == 0 {
                    self.first_timestamp = self.last_timestamp;
                }
                if self.reporting_period != 0 {
                    self.emit_values()?;
                }
                Ok(())
            }
            Kind::GpsPosition => {
                let longitude = f64::from(be_i32(&frame[1..])) * 1e-7;
                let latitude = f64::from(be_i32(&frame[5..])) * 1e-7;
                let accuracy = f64::from(be_u32(&frame[9..])) / 1000.0;
                self.new_value(header, 0, longitude)?;
                self.new_value(header, 1, latitude)?;
                self.new_value(header, 2, accuracy)
            }
            Kind::Accelerations => {
                let lateral = f64::from(be_i16(&frame[1..])) / 256.0;
                let longitudinal = f64::from(be_i16(&frame[3..])) / 256.0;
                self.new_value(header, 0, lateral)?;
                self.new_value(header, 1, longitudinal)
            }
            Kind::GpsRawSpeed => {
                // raw value is cm/s
                let speed = f64::from(be_u32(&frame[1..])) * (3.6 / 100.0);
                self.new_value(header, 0, speed)
            }
            Kind::GpsTimeStorage => {
                let seconds = f64::from(be_u32(&frame[1..])) / 1000.0;
                self.new_value(header, 0, seconds)
            }
            Kind::Analogue => {
                let value = f64::from(be_u16(&frame[1..])) / 1000.0;
                self.new_value(header, 0, value)
            }
            Kind::ExternalTemperature => {
                let value = f64::from(le_i16(&frame[2..])) / 10.0;
                self.new_value(header, frame[1], value)
            }
            Kind::ExternalAuxiliary | Kind::ExternalFrequency => {
                let value = f64::from(le_u16(&frame[2..])) / 10.0;
                self.new_value(header, frame[1], value)
            }
            Kind::ExternalMisc => {
                let value = f64::from(le_u16(&frame[2..])) / 100.0;
                self.new_value(header, frame[1], value)
            }
            Kind::DateStorage => {
                self.capture_first_date(frame);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
