use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cmd;
use crate::filter::Interpolator;
use crate::scan::{scan, Handler};
use crate::write::BinaryWriter;

/// `interpolate`: inject linearly interpolated samples for one
/// external-auxiliary channel.
pub fn run(args: &[PathBuf], channel: u8) -> Result<()> {
    let pairs = cmd::resolve_targets(args, |source| cmd::prefixed_target(source, "interpolated_"))?;
    cmd::for_each_target(&pairs, |source, target| {
        let buffer = cmd::load_file(source)?;
        let file = File::create(target)
            .with_context(|| format!("could not open output file: {}", target.display()))?;
        let writer = BinaryWriter::new(BufWriter::new(file))?;
        let mut interpolator = Interpolator::new(writer, channel);
        scan(&mut interpolator, &buffer)?;
        interpolator.flush()
    })
}
