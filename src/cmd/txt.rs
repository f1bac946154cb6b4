use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;

use crate::bytes::{be_u24, be_u32};
use crate::cmd;
use crate::fmt::weekday_time;
use crate::scan::{scan, Handler};
use crate::schema::{schema, Kind};

/// Dumps every event as a tab-separated line: the message name, the raw
/// bytes, and a decoded suffix for the two clock messages.
struct TextPrinter<W: Write> {
    out: W,
}

impl<W: Write> Handler for TextPrinter<W> {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        let name = match kind {
            Kind::ParseError => "parse error".to_string(),
            _ => schema()
                .lookup(frame[0])
                .map(|entry| entry.description.to_string())
                .unwrap_or_default(),
        };
        write!(self.out, "{}", name)?;
        for byte in frame {
            write!(self.out, "\t{}", byte)?;
        }
        match kind {
            Kind::Timestamp => write!(self.out, "\t({})", be_u24(&frame[1..]))?,
            Kind::GpsTimeStorage => {
                write!(self.out, "\t({})", weekday_time(be_u32(&frame[1..])))?
            }
            _ => {}
        }
        writeln!(self.out)?;
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
        let mut printer = TextPrinter { out: stdout.lock() };
        scan(&mut printer, &buffer)?;
        printer.flush()
    })
}
