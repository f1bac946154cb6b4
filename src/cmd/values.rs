use std::path::PathBuf;

use anyhow::Result;

use crate::cmd;
use crate::scan::{scan, Handler};
use crate::table::AnalogueTable;

/// `values`: two passes over the file; the first discovers the channels,
/// the second prints a CSV row per value change.
pub fn run(input: &PathBuf, decimal_comma: bool) -> Result<()> {
    let buffer = cmd::load_file(input)?;
    let stdout = std::io::stdout();
    let mut table = AnalogueTable::new(stdout.lock(), 0.0);
    table.use_decimal_comma(decimal_comma);

    scan(&mut table, &buffer)?;
    table.start_emitting()?;
    scan(&mut table, &buffer)?;
    table.flush()
}
