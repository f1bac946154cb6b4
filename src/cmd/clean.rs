use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::bytes::be_u24;
use crate::cmd;
use crate::scan::{scan, Handler};
use crate::schema::Kind;
use crate::write::FILE_MAGIC;

/// A jump bigger than this many ticks (or any decrease) starts a new file.
const JUMP_THRESHOLD: u32 = 5000;

/// Writes all correctly parsed messages back out, splitting into a fresh
/// file (`<stem>a<ext>`, `<stem>b<ext>`, ... next to the input) whenever
/// the timestamp makes a large jump or runs backwards. Unparseable bytes
/// and the bulky raw GPS pass-through messages are left out.
struct CleanFileWriter {
    directory: PathBuf,
    stem: String,
    extension: String,
    suffix: char,
    output: Option<BufWriter<File>>,
    last_timestamp: u32,
}

impl CleanFileWriter {
    fn new(source: &Path) -> Result<CleanFileWriter> {
        let directory = source.parent().unwrap_or(Path::new("")).to_path_buf();
        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = source
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let mut writer = CleanFileWriter {
            directory,
            stem,
            extension,
            suffix: 'a',
            output: None,
            last_timestamp: 0,
        };
        writer.open_next_file()?;
        Ok(writer)
    }

    fn open_next_file(&mut self) -> Result<()> {
        let name = format!("{}{}{}", self.stem, self.suffix, self.extension);
        let path = self.directory.join(name);
        info!("writing {}", path.display());
        let file = File::create(&path)
            .with_context(|| format!("could not open output file: {}", path.display()))?;
        let mut output = BufWriter::new(file);
        output.write_all(&FILE_MAGIC)?;
        self.output = Some(output);
        self.suffix = (self.suffix as u8 + 1) as char;
        Ok(())
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.output
            .as_mut()
            .expect("output file is open")
            .write_all(frame)?;
        Ok(())
    }
}

impl Handler for CleanFileWriter {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        match kind {
            Kind::ParseError | Kind::RawGps => Ok(()),
            Kind::Timestamp => {
                let value = be_u24(&frame[1..]);
                if self.last_timestamp != 0
                    && (self.last_timestamp > value || value - self.last_timestamp > JUMP_THRESHOLD)
                {
                    info!("jump: {} -> {}", self.last_timestamp, value);
                    self.open_next_file()?;
                }
                self.write_frame(frame)?;
                self.last_timestamp = value;
                Ok(())
            }
            _ => self.write_frame(frame),
        }
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(output) = self.output.as_mut() {
            output.flush()?;
        }
        Ok(())
    }
}

pub fn run(inputs: &[PathBuf]) -> Result<()> {
    cmd::for_each_input(inputs, |path| {
        let buffer = cmd::load_file(path)?;
        let mut writer = CleanFileWriter::new(path)?;
        scan(&mut writer, &buffer)?;
        writer.flush()
    })
}
