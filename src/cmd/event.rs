use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::bytes::{be_i32, be_u24, be_u32};
use crate::cmd;
use crate::fmt::float8;
use crate::scan::{scan, Handler};
use crate::schema::Kind;

/// The high-resolution timer event type this tool extracts.
const EVENT_TYPE: u8 = 64;

const SEPARATOR: char = ',';

/// Collects position, distance and both clocks, and prints one CSV line
/// with the collected data whenever a matching high-resolution timer event
/// occurs.
struct DataAtEvent<'a, W: Write> {
    out: W,
    source_name: &'a Path,
    longitude: f64,
    latitude: f64,
    last_gps_time: u32,
    last_distance: f64,
    last_timestamp: u32,
    first_timestamp: u32,
}

impl<'a, W: Write> DataAtEvent<'a, W> {
    fn new(out: W, source_name: &'a Path) -> DataAtEvent<'a, W> {
        DataAtEvent {
            out,
            source_name,
            longitude: 0.0,
            latitude: 0.0,
            last_gps_time: 0,
            last_distance: 0.0,
            last_timestamp: 0,
            first_timestamp: 0,
        }
    }

    fn print_header(mut out: impl Write) -> Result<()> {
        writeln!(out, "run,type,distance,time,reltime,longitude,latitude")?;
        Ok(())
    }

    fn output_line(&mut self, event_type: u8) -> Result<()> {
        let time = crate::fmt::gps_week_time(self.last_gps_time).time();
        let reltime = f64::from(self.last_timestamp - self.first_timestamp) / 100.0;
        writeln!(
            self.out,
            "{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
            self.source_name.display(),
            event_type,
            float8(self.last_distance),
            time,
            float8(reltime),
            float8(self.longitude),
            float8(self.latitude),
            sep = SEPARATOR
        )?;
        Ok(())
    }
}

impl<W: Write> Handler for DataAtEvent<'_, W> {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        match kind {
            Kind::GpsPosition => {
                self.longitude = f64::from(be_i32(&frame[1..])) * 1e-7;
                self.latitude = f64::from(be_i32(&frame[5..])) * 1e-7;
            }
            Kind::GpsTimeStorage => {
                self.last_gps_time = be_u32(&frame[1..]);
            }
            Kind::Timestamp => {
                self.last_timestamp = be_u24(&frame[1..]);
                if self.first_timestamp == 0 {
                    self.first_timestamp = self.last_timestamp;
                }
            }
            Kind::PrecalcDistanceData => {
                self.last_distance = f64::from(be_u32(&frame[1..])) / 1000.0;
            }
            Kind::HighResTimer => {
                if frame[1] == EVENT_TYPE {
                    self.output_line(frame[1])?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

pub fn run(inputs: &[PathBuf]) -> Result<()> {
    let stdout = std::io::stdout();
    DataAtEvent::<std::io::StdoutLock>::print_header(stdout.lock())?;
    cmd::for_each_input(inputs, |path| {
        let buffer = cmd::load_file(path)?;
        let stdout = std::io::stdout();
        let mut printer = DataAtEvent::new(stdout.lock(), path);
        scan(&mut printer, &buffer)?;
        printer.flush()
    })
}
