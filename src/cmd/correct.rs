use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cmd;
use crate::correct::TimeCorrection;
use crate::filter::IslandRemover;
use crate::scan::{scan, Handler};
use crate::write::BinaryWriter;

/// `correct`: rewrite the logger timestamps against the GPS clock.
///
/// Pipeline: scanner → island remover → clock-correction machine → slope
/// corrector → binary writer.
pub fn run(args: &[PathBuf]) -> Result<()> {
    let pairs = cmd::resolve_targets(args, |source| cmd::prefixed_target(source, "corrected_"))?;
    cmd::for_each_target(&pairs, |source, target| {
        let buffer = cmd::load_file(source)?;
        let file = File::create(target)
            .with_context(|| format!("could not open output file: {}", target.display()))?;
        let writer = BinaryWriter::new(BufWriter::new(file))?;
        let corrector = TimeCorrection::new(writer);
        let mut remover = IslandRemover::new(corrector);
        scan(&mut remover, &buffer)?;
        remover.flush()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::be_u24;
    use crate::checksum;
    use crate::scan::testing::Recorder;
    use crate::schema::Kind;

    fn timestamp_frame(value: u32) -> Vec<u8> {
        let mut frame = vec![9, (value >> 16) as u8, (value >> 8) as u8, value as u8, 0];
        checksum::seal(&mut frame);
        frame
    }

    fn gps_frame(value: u32) -> Vec<u8> {
        let mut frame = vec![7, 0, 0, 0, 0, 0];
        frame[1..5].copy_from_slice(&value.to_be_bytes());
        checksum::seal(&mut frame);
        frame
    }

    #[test]
    fn full_pipeline_corrects_and_strips_islands() {
        // two wedges with junk in between; the island is removed before it
        // can confuse the clock machine
        let mut input = Vec::new();
        input.extend_from_slice(&timestamp_frame(100));
        input.extend_from_slice(&gps_frame(1_000_000));
        input.extend_from_slice(&timestamp_frame(105));
        input.push(0xff);
        input.extend_from_slice(&timestamp_frame(999_999));
        input.push(0xfe);
        input.extend_from_slice(&timestamp_frame(1100));
        input.extend_from_slice(&gps_frame(1_010_000));
        input.extend_from_slice(&timestamp_frame(1103));

        let mut recorder = Recorder::default();
        {
            let corrector = TimeCorrection::new(&mut recorder);
            let mut remover = IslandRemover::new(corrector);
            scan(&mut remover, &input).unwrap();
            remover.flush().unwrap();
        }

        let values: Vec<u32> = recorder
            .events
            .iter()
            .filter(|(kind, _)| *kind == Kind::Timestamp)
            .map(|(_, frame)| be_u24(&frame[1..]))
            .collect();

        // the island timestamp 999_999 never reaches the output, and the
        // emitted values start at the pinned base
        assert!(!values.contains(&999_999));
        assert_eq!(values.first(), Some(&15000));
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "{:?}", values);
    }
}
