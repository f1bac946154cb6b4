use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::bytes::{be_u24, be_u32};
use crate::cmd;
use crate::fmt::weekday_time;
use crate::scan::{scan, Handler};
use crate::schema::Kind;

/// Below this many ticks per GPS second the logger clock counts as slow.
const SLOW_CLOCK_THRESHOLD: f64 = 50.0;

/// This many consecutive slow intervals flag the file.
const SLOW_CLOCK_COUNT_TRIGGER: i32 = 10;

/// Prints one line per GPS time message:
/// `<last timestamp>\t<weekday time>\t<ticks per gps second>`, and reports
/// the file name on stderr once if the tick rate stays below 50/s for ten
/// consecutive GPS intervals.
struct GpsTimePrinter<'a, W: Write> {
    out: W,
    filename: &'a Path,
    last_timestamp: u32,
    last_gps_timestamp: u32,
    last_timestamp_at_gps: u32,
    slow_clock_count: i32,
}

impl<'a, W: Write> GpsTimePrinter<'a, W> {
    fn new(out: W, filename: &'a Path) -> GpsTimePrinter<'a, W> {
        GpsTimePrinter {
            out,
            filename,
            last_timestamp: 0,
            last_gps_timestamp: 0,
            last_timestamp_at_gps: 0,
            slow_clock_count: 0,
        }
    }
}

impl<W: Write> Handler for GpsTimePrinter<'_, W> {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        match kind {
            Kind::Timestamp => {
                self.last_timestamp = be_u24(&frame[1..]);
            }
            Kind::GpsTimeStorage => {
                let gps_timestamp = be_u32(&frame[1..]);
                let gps_interval = gps_timestamp.wrapping_sub(self.last_gps_timestamp);
                let logger_interval = self.last_timestamp.wrapping_sub(self.last_timestamp_at_gps);
                let rate = 1000.0 * f64::from(logger_interval) / f64::from(gps_interval);

                // a count below zero means the file was already reported
                if self.slow_clock_count >= 0 {
                    if rate < SLOW_CLOCK_THRESHOLD {
                        self.slow_clock_count += 1;
                        if self.slow_clock_count >= SLOW_CLOCK_COUNT_TRIGGER {
                            eprintln!("{}", self.filename.display());
                            self.slow_clock_count = -1;
                        }
                    } else {
                        self.slow_clock_count = 0;
                    }
                }

                writeln!(
                    self.out,
                    "{}\t{}\t{:.5}",
                    self.last_timestamp,
                    weekday_time(gps_timestamp),
                    rate
                )?;

                self.last_gps_timestamp = gps_timestamp;
                self.last_timestamp_at_gps = self.last_timestamp;
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
    cmd::for_each_input(inputs, |path| {
        let buffer = cmd::load_file(path)?;
        let stdout = std::io::stdout();
        let mut printer = GpsTimePrinter::new(stdout.lock(), path);
        scan(&mut printer, &buffer)?;
        printer.flush()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;

    fn timestamp_frame(value: u32) -> Vec<u8> {
        let mut frame = vec![9, (value >> 16) as u8, (value >> 8) as u8, value as u8, 0];
        checksum::seal(&mut frame);
        frame
    }

    fn gps_frame(value: u32) -> Vec<u8> {
        let mut frame = vec![7, 0, 0, 0, 0, 0];
        frame[1..5].copy_from_slice(&value.to_be_bytes());
        checksum::seal(&mut frame);
        frame
    }

    #[test]
    fn reports_tick_rate_per_gps_interval() {
        let mut out = Vec::new();
        {
            let mut printer = GpsTimePrinter::new(&mut out, Path::new("x.run"));
            printer.handle(Kind::Timestamp, &timestamp_frame(1000)).unwrap();
            printer.handle(Kind::GpsTimeStorage, &gps_frame(10_000)).unwrap();
            printer.handle(Kind::Timestamp, &timestamp_frame(1100)).unwrap();
            printer.handle(Kind::GpsTimeStorage, &gps_frame(11_000)).unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        let second = text.lines().nth(1).unwrap();
        // 100 ticks over one gps second
        assert!(second.ends_with("100.00000"), "{}", second);
    }
}
