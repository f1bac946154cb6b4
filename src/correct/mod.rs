//! Timestamp correction against the GPS clock.
//!
//! The logger's 100 Hz tick counter drifts and jumps relative to the GPS
//! millisecond clock. This stage looks for "wedges": a `T G T` succession
//! where the two timestamp values are less than ten ticks apart, tight
//! enough to correlate the GPS value with the first timestamp. Each wedge
//! pins the stream to the GPS rate, piecewise-linearly.
//!
//! Everything that arrives is buffered verbatim (parse errors excepted);
//! each wedge after the first programs the slope corrector for the segment
//! between the previous wedge and this one and replays the buffer through
//! it.

mod slope;

pub use self::slope::{SlopeCorrector, TICK_MASK};

use anyhow::Result;
use log::debug;

use crate::bytes::{be_u24, be_u32};
use crate::scan::{Handler, MessageBuffer};
use crate::schema::Kind;

/// Two timestamps bracket a GPS event when they are closer than this.
const CLOSE_TIME_THRESHOLD: u32 = 10;

/// Corrected value assigned to the first wedge's timestamp. Not zero, so
/// messages logged before the first GPS fix still map to positive values.
const FIRST_TIMESTAMP: u32 = 15000;

/// GPS time advances 1000/s, the tick counter 100/s.
const GPS_TICK_RATIO: u32 = 10;

/// The wedge finder proper. It looks for `T G T` with the two `T` values
/// close together:
///
/// ```text
///     +-gps-+             +-time-+
///     v     |             v      |
///  (searching) --time--> (ts_found) ---gps--> (gps_found) --time[close]--> wedge
///      ^                   ^                     |   |
///      |                   +--time[not close]----+   |
///      +--------------------gps----------------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WedgeState {
    Searching,
    TsFound,
    GpsFound,
}

/// Outer machine: `Initial` until the first wedge fixes the correlation
/// base, `Searching` from then on, flushing a segment per further wedge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    Searching,
}

pub struct TimeCorrection<H> {
    corrector: SlopeCorrector<H>,
    buffer: MessageBuffer,
    phase: Phase,
    state: WedgeState,
    last_timestamp: u32,
    last_gps_time: u32,
    first_gps_time: u32,
    previous_timestamp: u32,
    previous_gps_time: u32,
}

impl<H: Handler> TimeCorrection<H> {
    pub fn new(downstream: H) -> TimeCorrection<H> {
        TimeCorrection {
            corrector: SlopeCorrector::new(downstream),
            buffer: MessageBuffer::new(),
            phase: Phase::Initial,
            state: WedgeState::Searching,
            last_timestamp: 0,
            last_gps_time: 0,
            first_gps_time: 0,
            previous_timestamp: 0,
            previous_gps_time: 0,
        }
    }

    fn on_time(&mut self, value: u32) -> Result<()> {
        match self.state {
            WedgeState::Searching | WedgeState::TsFound => {
                self.state = WedgeState::TsFound;
                self.last_timestamp = value;
            }
            WedgeState::GpsFound => {
                let close = value > self.last_timestamp
                    && value - self.last_timestamp < CLOSE_TIME_THRESHOLD;
                if close {
                    self.on_wedge()?;
                    self.state = WedgeState::Searching;
                } else {
                    self.state = WedgeState::TsFound;
                    self.last_timestamp = value;
                }
            }
        }
        Ok(())
    }

    fn on_gps(&mut self, value: u32) {
        match self.state {
            WedgeState::Searching => {}
            WedgeState::TsFound => {
                self.state = WedgeState::GpsFound;
                self.last_gps_time = value;
            }
            WedgeState::GpsFound => self.state = WedgeState::Searching,
        }
    }

    /// A wedge fired; its correlation point is the first timestamp of the
    /// triple and the bracketed GPS value.
    fn on_wedge(&mut self) -> Result<()> {
        let (timestamp, gps_time) = (self.last_timestamp, self.last_gps_time);
        match self.phase {
            Phase::Initial => {
                debug!("first wedge at {} / gps {}", timestamp, gps_time);
                self.previous_timestamp = timestamp;
                self.previous_gps_time = gps_time;
                self.first_gps_time = gps_time;
                self.phase = Phase::Searching;
                Ok(())
            }
            Phase::Searching => self.flush_segment(timestamp, gps_time),
        }
    }

    /// Reprograms the corrector for the segment `[previous wedge, this
    /// wedge]` and replays the buffer through it.
    fn flush_segment(&mut self, timestamp: u32, gps_time: u32) -> Result<()> {
        if timestamp > self.previous_timestamp {
            // The corrected value this wedge's timestamp should get, given
            // the progression of the gps clock. May exceed 2^24; the
            // emitted counter values roll over with the frame encoding.
            let corrected_pivot = self.previous_gps_time.wrapping_sub(self.first_gps_time)
                / GPS_TICK_RATIO
                + FIRST_TIMESTAMP;
            let skew = (gps_time.wrapping_sub(self.previous_gps_time) as f64
                / GPS_TICK_RATIO as f64)
                / (timestamp - self.previous_timestamp) as f64;
            debug!(
                "wedge at {}: pivot {} -> {}, skew {}",
                timestamp, self.previous_timestamp, corrected_pivot, skew
            );
            self.corrector
                .set_skew(self.previous_timestamp, corrected_pivot, skew);
        }

        // With a wrapped counter the range itself still works: it covers
        // [previous, MAX] plus [0, timestamp].
        self.corrector
            .set_allowed_range(self.previous_timestamp, timestamp);
        self.buffer.flush_through(&mut self.corrector)?;

        self.previous_timestamp = timestamp;
        self.previous_gps_time = gps_time;
        Ok(())
    }
}

impl<H: Handler> Handler for TimeCorrection<H> {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        match kind {
            // unparseable bytes do not survive correction
            Kind::ParseError => Ok(()),
            Kind::Timestamp => {
                self.buffer.push(frame);
                self.on_time(be_u24(&frame[1..]))
            }
            Kind::GpsTimeStorage => {
                self.buffer.push(frame);
                self.on_gps(be_u32(&frame[1..]));
                Ok(())
            }
            _ => {
                self.buffer.push(frame);
                Ok(())
            }
        }
    }

    /// Replays whatever is still buffered with the last programmed skew and
    /// no range restriction.
    fn flush(&mut self) -> Result<()> {
        self.corrector.set_allowed_range(0, TICK_MASK);
        self.buffer.flush_through(&mut self.corrector)?;
        self.corrector.flush()
    }
}
