use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::cmd;
use crate::correct::TimeCorrection;
use crate::csv::read_column_file;
use crate::filter::IslandRemover;
use crate::scan::{scan, Handler};
use crate::table::AnalogueTable;

fn csv_target(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("tno_{}.csv", stem))
}

/// `tnoify`: a periodic CSV export with a fixed column set, corrected
/// timestamps, and the decimal comma.
///
/// The first pass (through the island remover only) collects channels,
/// first values and the run date. The caller-supplied column file then
/// fixes the output columns, and the second pass runs through the island
/// remover and the clock corrector into the table.
pub fn run(args: &[PathBuf], column_file: &Path, period: f64) -> Result<()> {
    let columns = read_column_file(column_file)?;

    let pairs = cmd::resolve_targets(args, csv_target)?;
    cmd::for_each_target(&pairs, |source, target| {
        let buffer = cmd::load_file(source)?;
        let file = File::create(target)
            .with_context(|| format!("could not open output file: {}", target.display()))?;
        let mut out = BufWriter::new(file);

        let mut table = AnalogueTable::new(&mut out, period);
        table.use_decimal_comma(true);

        {
            let mut remover = IslandRemover::new(&mut table);
            scan(&mut remover, &buffer)?;
            remover.flush()?;
        }

        let exported = Local::now().format("%d-%m-%Y");
        let start = match table.first_date() {
            Some(date) => date.format("%d-%m-%Y %H:%M:%S").to_string(),
            None => "unknown".to_string(),
        };
        {
            let out = table.writer();
            writeln!(out, "Data output van Race Technology opname apparaat")?;
            writeln!(out, "Date Exported: {}", exported)?;
            writeln!(out, "Start Time/Date of exported data: {}", start)?;
            writeln!(out)?;
            writeln!(out)?;
        }

        table.set_columns(&columns)?;
        {
            let corrector = TimeCorrection::new(&mut table);
            let mut remover = IslandRemover::new(corrector);
            scan(&mut remover, &buffer)?;
            remover.flush()?;
        }
        out.flush()?;
        Ok(())
    })
}
