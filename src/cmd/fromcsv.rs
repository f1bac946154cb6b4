use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::cmd;
use crate::csv::{check_encodable, parse_line, read_column_file, LogEncoder};
use crate::write::BinaryWriter;

fn run_target(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("RUN_{}.run", stem))
}

/// `fromcsv`: the reverse direction, encoding CSV rows back into a framed,
/// checksummed binary log.
pub fn run(args: &[PathBuf], column_file: &Path) -> Result<()> {
    let columns = read_column_file(column_file)?;
    // fail before any file is touched when a definition cannot be encoded
    check_encodable(&columns)?;

    let pairs = cmd::resolve_targets(args, run_target)?;
    cmd::for_each_target(&pairs, |source, target| {
        let input = File::open(source)
            .with_context(|| format!("could not open file: {}", source.display()))?;
        let mut lines = BufReader::new(input).lines();

        let Some(header_line) = lines.next().transpose()? else {
            bail!("could not read header row from file: {}", source.display());
        };
        let header = parse_line(&header_line);

        let output = File::create(target)
            .with_context(|| format!("could not open output file: {}", target.display()))?;
        let writer = BinaryWriter::new(BufWriter::new(output))?;
        let mut encoder = LogEncoder::new(&columns, &header, writer)?;

        for line in lines {
            encoder.handle_row(&parse_line(&line?))?;
        }
        encoder.finish()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_name_gets_run_prefix_and_extension() {
        assert_eq!(
            run_target(Path::new("/data/export.csv")),
            Path::new("/data/RUN_export.run")
        );
    }
}
