use anyhow::Result;
use std::mem;

use crate::scan;
use crate::schema::Kind;

/// The contract every pipeline stage and sink implements.
///
/// `handle` receives the kind tag and the full framed bytes (header through
/// checksum); for [`Kind::ParseError`] the slice covers the unrecognised run
/// instead. Implementations may copy the slice but must not keep it past the
/// call. `flush` is the end-of-stream hook; stages forward it downstream
/// after emptying their own buffers.
pub trait Handler {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Lets a pipeline stage borrow its downstream sink, so tools can keep using
/// the sink after the stage is dropped (the two-pass table relies on this).
impl<H: Handler + ?Sized> Handler for &mut H {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        (**self).handle(kind, frame)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Reusable byte buffer for stages that hold messages back and replay them
/// later. Replay goes through the scanner again, so the downstream handler
/// sees ordinary typed events.
#[derive(Default)]
pub struct MessageBuffer {
    bytes: Vec<u8>,
}

impl MessageBuffer {
    pub fn new() -> MessageBuffer {
        MessageBuffer::default()
    }

    pub fn push(&mut self, frame: &[u8]) {
        self.bytes.extend_from_slice(frame);
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Feeds the buffered bytes back through the scanner into `downstream`
    /// and empties the buffer.
    pub fn flush_through<H: Handler + ?Sized>(&mut self, downstream: &mut H) -> Result<()> {
        let bytes = mem::take(&mut self.bytes);
        scan::scan(downstream, &bytes)
    }
}
