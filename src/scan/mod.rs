//! Greedy framing scanner over a log buffer.
//!
//! The scanner walks the input once. At each position it asks the schema for
//! a candidate entry, sizes the frame, and verifies the checksum; a framed
//! event is dispatched to the handler, anything else is swept into a
//! parse-error event that is emitted just before the next good frame (or at
//! end of input). Concatenating all emitted byte ranges reproduces the input
//! exactly.

mod handler;

pub use self::handler::{Handler, MessageBuffer};

#[cfg(test)]
pub use self::handler::testing;

use anyhow::Result;

use crate::checksum;
use crate::schema::{schema, Entry, Kind, Size};

/// Frame length for a candidate at the start of `rest`, or `None` when the
/// message would not fit in the remaining input.
fn frame_size(entry: &Entry, rest: &[u8]) -> Option<usize> {
    let size = match entry.size {
        Size::Fixed(n) => n as usize,
        Size::Variable => *rest.get(1)? as usize + 3,
    };
    (size <= rest.len()).then_some(size)
}

/// Scans `bytes` and dispatches every event to `handler`, in input order.
///
/// The scanner itself never fails; any error is the handler's and is
/// propagated as-is. No scanner state survives the call, so scanning the
/// same buffer twice (the two-pass table does) is safe.
pub fn scan<H: Handler + ?Sized>(handler: &mut H, bytes: &[u8]) -> Result<()> {
    let mut cursor = 0;
    let mut garbage_begin = 0;

    while cursor < bytes.len() {
        let candidate = schema()
            .lookup(bytes[cursor])
            .and_then(|entry| frame_size(entry, &bytes[cursor..]).map(|size| (entry, size)))
            .filter(|(_, size)| checksum::frame_valid(&bytes[cursor..cursor + size]));

        match candidate {
            Some((entry, size)) => {
                if garbage_begin < cursor {
                    handler.handle(Kind::ParseError, &bytes[garbage_begin..cursor])?;
                }
                handler.handle(entry.kind, &bytes[cursor..cursor + size])?;
                cursor += size;
                garbage_begin = cursor;
            }
            None => cursor += 1,
        }
    }

    if garbage_begin < cursor {
        handler.handle(Kind::ParseError, &bytes[garbage_begin..cursor])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::testing::Recorder;
    use super::*;

    fn scan_into(bytes: &[u8]) -> Recorder {
        let mut recorder = Recorder::default();
        scan(&mut recorder, bytes).unwrap();
        recorder
    }

    #[test]
    fn empty_input() {
        assert!(scan_into(&[]).events.is_empty());
    }

    #[test]
    fn single_timestamp() {
        let recorder = scan_into(&[0x09, 0x00, 0x00, 0x0a, 0x13]);
        assert_eq!(recorder.kinds(), vec![Kind::Timestamp]);
    }

    #[test]
    fn bad_checksum_becomes_parse_error() {
        let recorder = scan_into(&[0x09, 0x00, 0x00, 0x0a, 0x14]);
        assert_eq!(recorder.events.len(), 1);
        let (kind, bytes) = &recorder.events[0];
        assert_eq!(*kind, Kind::ParseError);
        assert_eq!(bytes.len(), 5);
    }

    #[test]
    fn garbage_before_frame() {
        let recorder = scan_into(&[0xff, 0x09, 0x00, 0x00, 0x0a, 0x13]);
        assert_eq!(recorder.kinds(), vec![Kind::ParseError, Kind::Timestamp]);
        assert_eq!(recorder.events[0].1, vec![0xff]);
        assert_eq!(recorder.events[1].1.len(), 5);
    }

    #[test]
    fn trailing_garbage() {
        let recorder = scan_into(&[0x09, 0x00, 0x00, 0x0a, 0x13, 0x09, 0x00]);
        assert_eq!(recorder.kinds(), vec![Kind::Timestamp, Kind::ParseError]);
        assert_eq!(recorder.events[1].1, vec![0x09, 0x00]);
    }

    #[test]
    fn variable_length_zero_frames_to_three_bytes() {
        // raw gps with declared payload length 0: header, length byte, checksum
        let recorder = scan_into(&[0x03, 0x00, 0x03]);
        assert_eq!(recorder.kinds(), vec![Kind::RawGps]);
        assert_eq!(recorder.events[0].1.len(), 3);
    }

    #[test]
    fn variable_length_message() {
        let mut frame = vec![0x03, 0x02, 0xaa, 0xbb, 0x00];
        checksum::seal(&mut frame);
        let recorder = scan_into(&frame);
        assert_eq!(recorder.kinds(), vec![Kind::RawGps]);
        assert_eq!(recorder.events[0].1.len(), 5);
    }

    #[test]
    fn truncated_frame_is_garbage() {
        let recorder = scan_into(&[0x09, 0x00, 0x00]);
        assert_eq!(recorder.kinds(), vec![Kind::ParseError]);
        assert_eq!(recorder.events[0].1.len(), 3);
    }

    #[test]
    fn byte_coverage() {
        // valid frames interleaved with junk; every input byte must come
        // back out exactly once, in order.
        let mut input = vec![0x55, 0x54];
        input.extend_from_slice(&[0x09, 0x00, 0x00, 0x0a, 0x13]);
        input.push(0xfe);
        let mut analogue = vec![20, 0x01, 0x02, 0x00];
        checksum::seal(&mut analogue);
        input.extend_from_slice(&analogue);
        input.extend_from_slice(&[0x09, 0x00]);

        let recorder = scan_into(&input);
        assert_eq!(recorder.bytes(), input);
    }

    #[test]
    fn rescanning_output_is_stable() {
        let mut input = vec![0x01];
        input.extend_from_slice(&[0x09, 0x00, 0x00, 0x0a, 0x13]);
        let first = scan_into(&input);
        let second = scan_into(&first.bytes());
        assert_eq!(first.bytes(), second.bytes());
    }
}
