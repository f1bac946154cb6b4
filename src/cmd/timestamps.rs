use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;

use crate::bytes::be_u24;
use crate::cmd;
use crate::scan::{scan, Handler};
use crate::schema::Kind;

/// Prints every timestamp value with its delta to the previous one, and the
/// covered time span at the end.
struct TimestampPrinter<W: Write> {
    out: W,
    last_timestamp: u32,
    first_timestamp: u32,
}

impl<W: Write> TimestampPrinter<W> {
    fn new(out: W) -> TimestampPrinter<W> {
        TimestampPrinter {
            out,
            last_timestamp: 0,
            first_timestamp: 0,
        }
    }
}

impl<W: Write> Handler for TimestampPrinter<W> {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        if kind != Kind::Timestamp {
            return Ok(());
        }
        let value = be_u24(&frame[1..]);
        if self.first_timestamp == 0 {
            self.first_timestamp = value;
        }
        writeln!(
            self.out,
            "{}\t{}",
            value,
            value.wrapping_sub(self.last_timestamp)
        )?;
        self.last_timestamp = value;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        writeln!(
            self.out,
            "time span: {}",
            self.last_timestamp.wrapping_sub(self.first_timestamp)
        )?;
        self.out.flush()?;
        Ok(())
    }
}

pub fn run(inputs: &[PathBuf]) -> Result<()> {
    cmd::for_each_input(inputs, |path| {
        let buffer = cmd::load_file(path)?;
        let stdout = std::io::stdout();
        let mut printer = TimestampPrinter::new(stdout.lock());
        scan(&mut printer, &buffer)?;
        printer.flush()
    })
}
