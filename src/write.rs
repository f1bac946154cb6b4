use anyhow::Result;
use std::io::Write;

use crate::scan::Handler;
use crate::schema::Kind;

/// Magic prepended to every binary log file the tools create.
pub const FILE_MAGIC: [u8; 8] = [0x98, 0x1d, 0x00, 0x00, 0xc8, 0x00, 0x00, 0x00];

/// Sink that writes every event verbatim to a binary log file.
pub struct BinaryWriter<W: Write> {
    out: W,
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(mut out: W) -> Result<BinaryWriter<W>> {
        out.write_all(&FILE_MAGIC)?;
        Ok(BinaryWriter { out })
    }
}

impl<W: Write> Handler for BinaryWriter<W> {
    fn handle(&mut self, _kind: Kind, frame: &[u8]) -> Result<()> {
        self.out.write_all(frame)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
