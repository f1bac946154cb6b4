use anyhow::Result;

use crate::bytes::{be_u24, le_i16};
use crate::checksum;
use crate::scan::{self, Handler, MessageBuffer};
use crate::schema::Kind;

const EXTERNAL_AUXILIARY_HEADER: u8 = 74;

/// Raises the sample rate of one external-auxiliary channel by linear
/// interpolation.
///
/// Events are buffered between two consecutive observations of the tracked
/// channel. When the second observation arrives the buffer is replayed, and
/// a synthesised auxiliary message is injected at each timestamp boundary
/// inside the gap with the value interpolated between the two observations.
/// Messages are only injected before the last observation in the actual
/// data: a stream that ends without a further observation is flushed as-is.
pub struct Interpolator<H> {
    downstream: H,
    channel: u8,
    buffer: MessageBuffer,
    last_timestamp: u32,
    last_value_time: u32,
    last_value: i16,
}

impl<H: Handler> Interpolator<H> {
    pub fn new(downstream: H, channel: u8) -> Interpolator<H> {
        Interpolator {
            downstream,
            channel,
            buffer: MessageBuffer::new(),
            last_timestamp: 0,
            last_value_time: 0,
            last_value: 0,
        }
    }
}

impl<H: Handler> Handler for Interpolator<H> {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        match kind {
            Kind::Timestamp => {
                self.last_timestamp = be_u24(&frame[1..]);
                self.buffer.push(frame);
                Ok(())
            }
            Kind::ExternalAuxiliary if frame[1] == self.channel => {
                let new_value = le_i16(&frame[2..]);

                if self.last_value_time == 0 || self.last_timestamp <= self.last_value_time {
                    // first observation, or no tick in between: nothing to
                    // interpolate over
                    self.buffer.flush_through(&mut self.downstream)?;
                } else {
                    let mut injector = Injector {
                        downstream: &mut self.downstream,
                        channel: self.channel,
                        first_value_time: self.last_value_time,
                        first_value: self.last_value,
                        last_value_time: self.last_timestamp,
                        last_value: new_value,
                        previous_time: 0,
                    };
                    self.buffer.flush_through(&mut injector)?;
                }

                self.last_value_time = self.last_timestamp;
                self.last_value = new_value;
                self.downstream.handle(Kind::ExternalAuxiliary, frame)
            }
            _ => {
                self.buffer.push(frame);
                Ok(())
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.buffer.flush_through(&mut self.downstream)?;
        self.downstream.flush()
    }
}

/// Replays one buffered gap, emitting an interpolated auxiliary message at
/// every timestamp boundary between the two observations.
struct Injector<'a, H> {
    downstream: &'a mut H,
    channel: u8,
    first_value_time: u32,
    first_value: i16,
    last_value_time: u32,
    last_value: i16,
    previous_time: u32,
}

impl<H: Handler> Injector<'_, H> {
    fn value_at(&self, time: u32) -> i16 {
        let rise = i64::from(self.last_value) - i64::from(self.first_value);
        let run = i64::from(self.last_value_time) - i64::from(self.first_value_time);
        let elapsed = i64::from(time) - i64::from(self.first_value_time);
        (i64::from(self.first_value) + rise * elapsed / run) as i16
    }

    fn emit(&mut self, value: i16) -> Result<()> {
        let raw = value as u16;
        let mut message = [
            EXTERNAL_AUXILIARY_HEADER,
            self.channel,
            raw as u8,
            (raw >> 8) as u8,
            0,
        ];
        checksum::seal(&mut message);
        // a scanner roundtrip, so downstream sees an ordinary typed event
        scan::scan(&mut *self.downstream, &message)
    }
}

impl<H: Handler> Handler for Injector<'_, H> {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        if kind != Kind::Timestamp {
            return self.downstream.handle(kind, frame);
        }

        let time = be_u24(&frame[1..]);
        if self.previous_time != 0 && time > self.first_value_time + 1 {
            let interpolated = self.value_at(self.previous_time);
            self.emit(interpolated)?;
        }
        self.previous_time = time;
        self.downstream.handle(Kind::Timestamp, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::testing::Recorder;

    fn timestamp_frame(value: u32) -> Vec<u8> {
        let mut frame = vec![9, (value >> 16) as u8, (value >> 8) as u8, value as u8, 0];
        checksum::seal(&mut frame);
        frame
    }

    fn aux_frame(channel: u8, value: i16) -> Vec<u8> {
        let raw = value as u16;
        let mut frame = vec![74, channel, raw as u8, (raw >> 8) as u8, 0];
        checksum::seal(&mut frame);
        frame
    }

    fn feed<H: Handler>(interpolator: &mut Interpolator<H>, frames: &[(Kind, Vec<u8>)]) {
        for (kind, frame) in frames {
            interpolator.handle(*kind, frame).unwrap();
        }
    }

    fn aux_values(recorder: &Recorder, channel: u8) -> Vec<i16> {
        recorder
            .events
            .iter()
            .filter(|(kind, frame)| *kind == Kind::ExternalAuxiliary && frame[1] == channel)
            .map(|(_, frame)| le_i16(&frame[2..]))
            .collect()
    }

    #[test]
    fn injects_linear_values_inside_gap() {
        let mut recorder = Recorder::default();
        let mut interpolator = Interpolator::new(&mut recorder, 37);

        feed(
            &mut interpolator,
            &[
                (Kind::Timestamp, timestamp_frame(100)),
                (Kind::ExternalAuxiliary, aux_frame(37, 0)),
                (Kind::Timestamp, timestamp_frame(101)),
                (Kind::Timestamp, timestamp_frame(102)),
                (Kind::Timestamp, timestamp_frame(103)),
                (Kind::Timestamp, timestamp_frame(104)),
                (Kind::ExternalAuxiliary, aux_frame(37, 40)),
            ],
        );
        interpolator.flush().unwrap();

        // observations at ticks 100 and 104, values 0 and 40; boundaries in
        // between get one injected message each
        assert_eq!(aux_values(&recorder, 37), vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn injected_frames_are_checksummed() {
        let mut recorder = Recorder::default();
        let mut interpolator = Interpolator::new(&mut recorder, 37);

        feed(
            &mut interpolator,
            &[
                (Kind::Timestamp, timestamp_frame(10)),
                (Kind::ExternalAuxiliary, aux_frame(37, -100)),
                (Kind::Timestamp, timestamp_frame(11)),
                (Kind::Timestamp, timestamp_frame(12)),
                (Kind::ExternalAuxiliary, aux_frame(37, 100)),
            ],
        );
        interpolator.flush().unwrap();

        for (_, frame) in &recorder.events {
            assert!(checksum::frame_valid(frame));
        }
    }

    #[test]
    fn other_channels_pass_untouched() {
        let mut recorder = Recorder::default();
        let mut interpolator = Interpolator::new(&mut recorder, 37);

        feed(
            &mut interpolator,
            &[
                (Kind::Timestamp, timestamp_frame(50)),
                (Kind::ExternalAuxiliary, aux_frame(36, 7)),
                (Kind::Timestamp, timestamp_frame(51)),
            ],
        );
        interpolator.flush().unwrap();

        assert_eq!(aux_values(&recorder, 36), vec![7]);
        assert_eq!(aux_values(&recorder, 37), Vec::<i16>::new());
    }

    #[test]
    fn stream_without_second_observation_is_flushed_verbatim() {
        let mut recorder = Recorder::default();
        let mut interpolator = Interpolator::new(&mut recorder, 37);

        feed(
            &mut interpolator,
            &[
                (Kind::Timestamp, timestamp_frame(10)),
                (Kind::ExternalAuxiliary, aux_frame(37, 5)),
                (Kind::Timestamp, timestamp_frame(11)),
                (Kind::Timestamp, timestamp_frame(12)),
            ],
        );
        interpolator.flush().unwrap();

        assert_eq!(aux_values(&recorder, 37), vec![5]);
        assert_eq!(
            recorder.kinds(),
            vec![
                Kind::Timestamp,
                Kind::ExternalAuxiliary,
                Kind::Timestamp,
                Kind::Timestamp
            ]
        );
    }
}
