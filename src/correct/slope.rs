use anyhow::Result;

use crate::bytes::be_u24;
use crate::checksum;
use crate::scan::Handler;
use crate::schema::Kind;

/// The timestamp counter is 24 bits wide; all range arithmetic wraps there.
pub const TICK_MASK: u32 = 0x00ff_ffff;

const TIMESTAMP_HEADER: u8 = 9;

/// Rewrites timestamp values along one straight line and forwards everything
/// else verbatim.
///
/// Timestamp values describe a line through a pivot point; the corrector
/// multiplies by a skew rate to change the slope and shifts the pivot to its
/// corrected position:
///
/// ```text
///                   ++  corrected slope
///                 ++
///               ++
///   cpivot->  *+          xxxx  original slope
///           ++^       xxxx
///         ++  |   xxxx
///             xx*x
///               ^
///               pivot
/// ```
///
/// One instance can only apply a single linear correction, so it also
/// carries an allowed input range; the clock-correction machine cuts the
/// stream into segments where the relation is linear, programs this class
/// per segment, and replays. Timestamps outside the allowed range are
/// dropped.
pub struct SlopeCorrector<H> {
    downstream: H,
    pivot: u32,
    corrected_pivot: u32,
    skew: f64,
    range_begin: u32,
    range_span: u32,
}

impl<H: Handler> SlopeCorrector<H> {
    pub fn new(downstream: H) -> SlopeCorrector<H> {
        SlopeCorrector {
            downstream,
            pivot: 0,
            corrected_pivot: 0,
            skew: 1.0,
            range_begin: 0,
            range_span: TICK_MASK,
        }
    }

    pub fn set_skew(&mut self, pivot: u32, corrected_pivot: u32, skew: f64) {
        self.pivot = pivot & TICK_MASK;
        self.corrected_pivot = corrected_pivot;
        self.skew = skew;
    }

    /// Allows only timestamps in the inclusive range `[lo, hi]`. The bounds
    /// are taken modulo 2²⁴, so `lo > hi` means the wrapping range
    /// `[lo, MAX] ∪ [0, hi]`.
    pub fn set_allowed_range(&mut self, lo: u32, hi: u32) {
        self.range_begin = lo & TICK_MASK;
        self.range_span = hi.wrapping_sub(lo) & TICK_MASK;
    }

    fn in_range(&self, value: u32) -> bool {
        value.wrapping_sub(self.range_begin) & TICK_MASK <= self.range_span
    }
}

impl<H: Handler> Handler for SlopeCorrector<H> {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        if kind != Kind::Timestamp {
            return self.downstream.handle(kind, frame);
        }

        let value = be_u24(&frame[1..]);
        if !self.in_range(value) {
            return Ok(());
        }

        let offset = value.wrapping_sub(self.pivot) & TICK_MASK;
        let corrected = (offset as f64 * self.skew + self.corrected_pivot as f64) as u32;

        let mut message = [
            TIMESTAMP_HEADER,
            (corrected >> 16) as u8,
            (corrected >> 8) as u8,
            corrected as u8,
            0,
        ];
        checksum::seal(&mut message);
        self.downstream.handle(Kind::Timestamp, &message)
    }

    fn flush(&mut self) -> Result<()> {
        self.downstream.flush()
    }
}
