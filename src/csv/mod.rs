//! The CSV side of the toolbox: column-definition files, CSV line parsing,
//! and the reverse direction of turning CSV rows back into framed log
//! messages.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

use crate::checksum;
use crate::scan::Handler;
use crate::schema::{schema, ByteOrder, Entry, Field};
use crate::table::ColumnInfo;

/// Schema-level failures surfaced before any file is processed.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("no message kind with header {header} in the schema")]
    UnknownHeader { header: u8 },
    #[error("header {header}:{sub_index} has no field layout, cannot encode it")]
    NoEncoder { header: u8, sub_index: u8 },
}

/// Reads a column-definition file: one `header:sub_index = display name`
/// entry per line. Lines that do not match the syntax are ignored.
pub fn read_column_file(path: &Path) -> Result<ColumnInfo> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not open column definition file: {}", path.display()))?;

    let line_re = Regex::new(r"^(\d+):(\d+)\s*=\s*(.*?)\s*$").unwrap();
    let mut columns = ColumnInfo::new();
    for line in text.lines() {
        if let Some(captures) = line_re.captures(line) {
            let header = captures[1]
                .parse::<u8>()
                .with_context(|| format!("channel out of range in '{}'", line))?;
            let sub_index = captures[2]
                .parse::<u8>()
                .with_context(|| format!("channel index out of range in '{}'", line))?;
            columns.push(((header, sub_index), captures[3].to_string()));
        }
    }
    Ok(columns)
}

/// Splits one CSV line into trimmed cells. Double-quoted cells may contain
/// the separator.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                cells.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// Finds the catalogue entry claiming a header, the way the encoder walks
/// the schema: over all entries, matching ranges by membership.
fn entry_for(header: u8) -> Option<&'static Entry> {
    schema()
        .iter()
        .find(|entry| (entry.header..=entry.last_header()).contains(&header))
}

/// Requires every definition to map to a message the schema can rebuild.
/// Called once at startup, before any file is touched.
pub fn check_encodable(columns: &ColumnInfo) -> Result<()> {
    for ((header, sub_index), _) in columns {
        let entry = entry_for(*header).ok_or(SchemaError::UnknownHeader { header: *header })?;
        if entry.fields.is_empty() {
            return Err(SchemaError::NoEncoder {
                header: *header,
                sub_index: *sub_index,
            }
            .into());
        }
    }
    Ok(())
}

struct ColumnWriter {
    column: usize,
    header: u8,
    sub_index: u8,
    entry: &'static Entry,
}

/// Turns CSV rows into framed, checksummed messages and hands them to a
/// downstream handler (normally the binary file writer).
pub struct LogEncoder<H> {
    writers: Vec<ColumnWriter>,
    downstream: H,
}

impl<H: Handler> LogEncoder<H> {
    /// Binds the column definitions to the positions found in the CSV
    /// header row. Definitions whose display name does not appear in the
    /// header row are skipped, as are CSV columns nobody defined.
    pub fn new(columns: &ColumnInfo, header_row: &[String], downstream: H) -> Result<LogEncoder<H>> {
        let mut writers = Vec::new();
        for ((header, sub_index), name) in columns {
            let Some(column) = header_row.iter().position(|cell| cell == name) else {
                continue;
            };
            let entry =
                entry_for(*header).ok_or(SchemaError::UnknownHeader { header: *header })?;
            if entry.fields.is_empty() {
                return Err(SchemaError::NoEncoder {
                    header: *header,
                    sub_index: *sub_index,
                }
                .into());
            }
            writers.push(ColumnWriter {
                column,
                header: *header,
                sub_index: *sub_index,
                entry,
            });
        }
        Ok(LogEncoder { writers, downstream })
    }

    pub fn handle_row(&mut self, row: &[String]) -> Result<()> {
        for writer in &self.writers {
            let Some(cell) = row.get(writer.column) else {
                continue;
            };
            if cell.is_empty() {
                continue;
            }
            let frame = encode_message(writer.entry, writer.header, writer.sub_index, cell)?;
            self.downstream.handle(writer.entry.kind, &frame)?;
        }
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        self.downstream.flush()
    }
}

/// Builds one framed message from a cooked CSV cell value.
fn encode_message(entry: &Entry, header: u8, sub_index: u8, cell: &str) -> Result<Vec<u8>> {
    let mut frame = vec![header];
    for field in entry.fields {
        match field {
            Field::ChannelId => frame.push(sub_index),
            Field::Ignore(n) => frame.extend(std::iter::repeat(0).take(*n as usize)),
            Field::Float32 => {
                let value: f32 = cell
                    .parse()
                    .with_context(|| format!("could not convert this to a number: '{}'", cell))?;
                frame.extend_from_slice(&value.to_le_bytes());
            }
            Field::Int {
                bytes,
                order,
                signed: _,
                denominator,
            } => {
                let cooked: f64 = cell
                    .parse()
                    .with_context(|| format!("could not convert this to a number: '{}'", cell))?;
                let raw = (cooked * f64::from(*denominator)).round() as i64;
                match order {
                    ByteOrder::Big => {
                        for shift in (0..*bytes).rev() {
                            frame.push((raw >> (8 * shift)) as u8);
                        }
                    }
                    ByteOrder::Little => {
                        for shift in 0..*bytes {
                            frame.push((raw >> (8 * shift)) as u8);
                        }
                    }
                }
            }
        }
    }
    frame.push(0);
    checksum::seal(&mut frame);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::{be_u24, le_i16};
    use crate::scan::testing::Recorder;
    use crate::schema::Kind;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn parses_definition_lines() {
        let dir = std::env::temp_dir().join("runlog-csv-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("columns.txt");
        std::fs::write(
            &path,
            "72:3 = outside temp\nnot a definition\n20:0=throttle  \n",
        )
        .unwrap();

        let columns = read_column_file(&path).unwrap();
        assert_eq!(
            columns,
            vec![
                ((72, 3), "outside temp".to_string()),
                ((20, 0), "throttle".to_string()),
            ]
        );
    }

    #[test]
    fn splits_lines_with_quotes() {
        assert_eq!(
            parse_line(r#"a, "b, c" ,d"#),
            vec!["a".to_string(), "b, c".to_string(), "d".to_string()]
        );
        assert_eq!(parse_line(""), vec!["".to_string()]);
    }

    #[test]
    fn encodes_negative_temperature() {
        let entry = schema().lookup(72).unwrap();
        let frame = encode_message(entry, 72, 3, "-12.3").unwrap();
        // sum of 72, 3, 0x85 and 0xff, mod 256
        assert_eq!(frame, vec![72, 0x03, 0x85, 0xff, 0xcf]);
        assert!(checksum::frame_valid(&frame));
    }

    #[test]
    fn encodes_timestamp_seconds() {
        let entry = schema().lookup(9).unwrap();
        let frame = encode_message(entry, 9, 0, "0.1").unwrap();
        assert_eq!(be_u24(&frame[1..]), 10);
        assert!(checksum::frame_valid(&frame));
    }

    #[test]
    fn round_trips_within_granularity() {
        let entry = schema().lookup(74).unwrap();
        for cooked in [0.0, 0.1, 10.0, 99.95, 3276.7] {
            let frame = encode_message(entry, 74, 1, &cooked.to_string()).unwrap();
            assert!(checksum::frame_valid(&frame));
            let decoded = f64::from(le_i16(&frame[2..])) / 10.0;
            assert!((decoded - cooked).abs() <= 0.05, "{} -> {}", cooked, decoded);
        }
    }

    #[test]
    fn unknown_csv_columns_are_ignored() {
        let columns: ColumnInfo = vec![((72, 3), "temp".to_string())];
        let header = strings(&["time", "rpm", "temp"]);
        let mut recorder = Recorder::default();
        let mut encoder = LogEncoder::new(&columns, &header, &mut recorder).unwrap();

        encoder.handle_row(&strings(&["1.0", "4500", "21.5"])).unwrap();
        assert_eq!(recorder.kinds(), vec![Kind::ExternalTemperature]);
    }

    #[test]
    fn empty_cells_emit_nothing() {
        let columns: ColumnInfo = vec![((72, 3), "temp".to_string())];
        let header = strings(&["temp"]);
        let mut recorder = Recorder::default();
        let mut encoder = LogEncoder::new(&columns, &header, &mut recorder).unwrap();

        encoder.handle_row(&strings(&[""])).unwrap();
        assert!(recorder.events.is_empty());
    }

    #[test]
    fn defined_header_without_layout_errors_at_startup() {
        // gps position carries no field layout, so it cannot be rebuilt
        let columns: ColumnInfo = vec![((10, 0), "gps".to_string())];
        assert!(check_encodable(&columns).is_err());

        let header = strings(&["gps"]);
        let mut recorder = Recorder::default();
        assert!(LogEncoder::new(&columns, &header, &mut recorder).is_err());
    }

    #[test]
    fn bad_cell_is_a_conversion_error() {
        let columns: ColumnInfo = vec![((72, 3), "temp".to_string())];
        let header = strings(&["temp"]);
        let mut recorder = Recorder::default();
        let mut encoder = LogEncoder::new(&columns, &header, &mut recorder).unwrap();
        assert!(encoder.handle_row(&strings(&["warm"])).is_err());
    }
}
