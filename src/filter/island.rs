use anyhow::Result;

use crate::scan::{Handler, MessageBuffer};
use crate::schema::Kind;

/// Drops "islands": single messages that frame correctly but sit alone in
/// the middle of unparseable data, which makes them likely false positives
/// of the framer. Parse-error events themselves are swallowed too.
///
/// A valid message arriving right after an error run is held back; it is
/// only forwarded once a second valid message follows it. A message still
/// held at end of stream has an error run before it and nothing after, so it
/// is discarded.
pub struct IslandRemover<H> {
    downstream: H,
    buffer: MessageBuffer,
    last_was_error: bool,
}

impl<H: Handler> IslandRemover<H> {
    pub fn new(downstream: H) -> IslandRemover<H> {
        IslandRemover {
            downstream,
            buffer: MessageBuffer::new(),
            last_was_error: true,
        }
    }
}

impl<H: Handler> Handler for IslandRemover<H> {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        if kind == Kind::ParseError {
            self.buffer.clear();
            self.last_was_error = true;
            return Ok(());
        }

        if self.last_was_error {
            self.buffer.clear();
            self.buffer.push(frame);
        } else {
            self.buffer.flush_through(&mut self.downstream)?;
            self.downstream.handle(kind, frame)?;
        }
        self.last_was_error = false;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.buffer.clear();
        self.downstream.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;
    use crate::scan::{scan, testing::Recorder};

    fn timestamp_frame(value: u32) -> Vec<u8> {
        let mut frame = vec![9, (value >> 16) as u8, (value >> 8) as u8, value as u8, 0];
        checksum::seal(&mut frame);
        frame
    }

    #[test]
    fn island_is_dropped() {
        let mut recorder = Recorder::default();
        let mut remover = IslandRemover::new(&mut recorder);

        remover.handle(Kind::ParseError, &[0xff]).unwrap();
        remover.handle(Kind::Timestamp, &timestamp_frame(10)).unwrap();
        remover.handle(Kind::ParseError, &[0xfe]).unwrap();
        remover.handle(Kind::Timestamp, &timestamp_frame(20)).unwrap();
        remover.handle(Kind::Timestamp, &timestamp_frame(30)).unwrap();
        remover.flush().unwrap();

        // the island (10) and the error runs disappear; 20 survives because
        // 30 follows it
        let values: Vec<u32> = recorder
            .events
            .iter()
            .map(|(_, frame)| crate::bytes::be_u24(&frame[1..]))
            .collect();
        assert_eq!(values, vec![20, 30]);
    }

    #[test]
    fn leading_message_is_held_until_confirmed() {
        let mut recorder = Recorder::default();
        let mut remover = IslandRemover::new(&mut recorder);

        // the stream starts in "after error" state
        remover.handle(Kind::Timestamp, &timestamp_frame(1)).unwrap();
        assert!(!remover.buffer.is_empty());
        remover.handle(Kind::Timestamp, &timestamp_frame(2)).unwrap();

        assert_eq!(recorder.events.len(), 2);
    }

    #[test]
    fn buffered_message_discarded_at_end() {
        let mut recorder = Recorder::default();
        let mut remover = IslandRemover::new(&mut recorder);

        remover.handle(Kind::ParseError, &[0x00]).unwrap();
        remover.handle(Kind::Timestamp, &timestamp_frame(5)).unwrap();
        remover.flush().unwrap();

        assert!(recorder.events.is_empty());
        assert!(recorder.flushed);
    }

    #[test]
    fn no_event_between_two_error_runs_survives() {
        // full pipeline check through the scanner
        let mut input = vec![0xff, 0xfb];
        input.extend_from_slice(&timestamp_frame(10));
        input.push(0xfc);
        input.extend_from_slice(&timestamp_frame(20));
        input.extend_from_slice(&timestamp_frame(21));

        let mut recorder = Recorder::default();
        {
            let mut remover = IslandRemover::new(&mut recorder);
            scan(&mut remover, &input).unwrap();
            remover.flush().unwrap();
        }

        assert_eq!(recorder.kinds(), vec![Kind::Timestamp, Kind::Timestamp]);
    }
}
