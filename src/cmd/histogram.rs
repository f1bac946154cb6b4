use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use serde_derive::Serialize;

use crate::cmd;
use crate::scan::{scan, Handler};
use crate::schema::{schema, Kind};

/// Counts messages and bytes per header value. Parse errors land in slot 0,
/// which no message kind claims.
struct HistogramCounter {
    byte_count: [u64; 256],
    message_count: [u64; 256],
}

#[derive(Serialize)]
struct HistogramEntry {
    name: String,
    header: u8,
    messages: u64,
    bytes: u64,
}

impl HistogramCounter {
    fn new() -> HistogramCounter {
        HistogramCounter {
            byte_count: [0; 256],
            message_count: [0; 256],
        }
    }

    fn entries(&self) -> Vec<HistogramEntry> {
        (0u16..256)
            .filter(|&i| self.message_count[i as usize] > 0)
            .map(|i| {
                let header = i as u8;
                let name = if header == 0 {
                    "parse error".to_string()
                } else {
                    schema().name(header).unwrap_or_default()
                };
                HistogramEntry {
                    name,
                    header,
                    messages: self.message_count[i as usize],
                    bytes: self.byte_count[i as usize],
                }
            })
            .collect()
    }

    fn print<W: Write>(&self, mut out: W) -> Result<()> {
        for entry in self.entries() {
            writeln!(
                out,
                "{}\t{}\t{}\t{}",
                entry.name, entry.header, entry.messages, entry.bytes
            )?;
        }
        Ok(())
    }

    fn print_json<W: Write>(&self, mut out: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut out, &self.entries())?;
        writeln!(out)?;
        Ok(())
    }
}

impl Handler for HistogramCounter {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        let slot = match kind {
            Kind::ParseError => 0,
            _ => frame[0] as usize,
        };
        self.byte_count[slot] += frame.len() as u64;
        self.message_count[slot] += 1;
        Ok(())
    }
}

pub fn run(inputs: &[PathBuf], json: bool) -> Result<()> {
    cmd::for_each_input(inputs, |path| {
        let buffer = cmd::load_file(path)?;
        let mut counter = HistogramCounter::new();
        scan(&mut counter, &buffer)?;
        let stdout = std::io::stdout();
        if json {
            counter.print_json(stdout.lock())
        } else {
            counter.print(stdout.lock())
        }
    })
}
