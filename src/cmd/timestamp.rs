use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;

use crate::bytes::{be_u24, be_u32};
use crate::cmd;
use crate::scan::{scan, Handler};
use crate::schema::Kind;

const JUMP_THRESHOLD: u32 = 50_000;

/// Reports discontinuities in both clocks: jumps bigger than 50 000 units
/// forward, or any decrease.
struct TimestampReporter<W: Write> {
    out: W,
    last_timestamp: u32,
    last_gps_timestamp: u32,
    found_gps: bool,
}

impl<W: Write> TimestampReporter<W> {
    fn new(out: W) -> TimestampReporter<W> {
        TimestampReporter {
            out,
            last_timestamp: 0,
            last_gps_timestamp: 0,
            found_gps: false,
        }
    }

    fn report_jump(&mut self, label: &str, last: u32, value: u32) -> Result<()> {
        if last > value {
            writeln!(self.out, "{} jump: {} -> {} -{}", label, last, value, last - value)?;
        } else {
            writeln!(self.out, "{} jump: {} -> {} +{}", label, last, value, value - last)?;
        }
        Ok(())
    }
}

impl<W: Write> Handler for TimestampReporter<W> {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        match kind {
            Kind::Timestamp => {
                let value = be_u24(&frame[1..]);
                if self.last_timestamp != 0
                    && (self.last_timestamp > value || value - self.last_timestamp > JUMP_THRESHOLD)
                {
                    self.report_jump("log", self.last_timestamp, value)?;
                }
                self.last_timestamp = value;
            }
            Kind::GpsTimeStorage => {
                self.found_gps = true;
                let value = be_u32(&frame[1..]);
                if self.last_gps_timestamp != 0
                    && (self.last_gps_timestamp > value
                        || value - self.last_gps_timestamp > JUMP_THRESHOLD)
                {
                    self.report_jump("gps", self.last_gps_timestamp, value)?;
                }
                self.last_gps_timestamp = value;
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
        let mut reporter = TimestampReporter::new(stdout.lock());
        scan(&mut reporter, &buffer)?;
        if !reporter.found_gps {
            eprintln!("no gps timestamps in {}", path.display());
        }
        reporter.flush()
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

    #[test]
    fn reports_large_and_negative_jumps() {
        let mut out = Vec::new();
        {
            let mut reporter = TimestampReporter::new(&mut out);
            for value in [100u32, 200, 90_000, 89_000, 89_100] {
                reporter.handle(Kind::Timestamp, &timestamp_frame(value)).unwrap();
            }
        }
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![
            "log jump: 200 -> 90000 +89800",
            "log jump: 90000 -> 89000 -1000",
        ]);
    }
}
