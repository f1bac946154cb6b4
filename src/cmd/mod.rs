//! One module per CLI verb, plus the plumbing they share.

pub mod clean;
pub mod correct;
pub mod event;
pub mod fromcsv;
pub mod gpstime;
pub mod histogram;
pub mod interpolate;
pub mod kml;
pub mod timestamp;
pub mod timestamps;
pub mod tnoify;
pub mod txt;
pub mod values;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;

/// Reads a whole log file into memory; the scanner and the two-pass tools
/// work on the buffer.
pub fn load_file(path: &Path) -> Result<Vec<u8>> {
    let buffer =
        fs::read(path).with_context(|| format!("could not open file: {}", path.display()))?;
    info!("{}: {} bytes", path.display(), buffer.len());
    Ok(buffer)
}

/// Runs `work` for every input. An error is fatal for that file only; the
/// remaining inputs are still processed and the first error is reported at
/// the end (making the exit code nonzero).
pub fn for_each_input<F>(inputs: &[PathBuf], mut work: F) -> Result<()>
where
    F: FnMut(&Path) -> Result<()>,
{
    if inputs.is_empty() {
        bail!("no input files given");
    }
    let mut failures = 0;
    for path in inputs {
        if let Err(error) = work(path) {
            eprintln!("{}: {:#}", path.display(), error);
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{} of {} input files failed", failures, inputs.len());
    }
    Ok(())
}

/// The target name a transforming tool invents when none is given: the
/// source name with a prefix, in the source's directory.
pub fn prefixed_target(source: &Path, prefix: &str) -> PathBuf {
    let name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{}{}", prefix, name))
}

/// Resolves a `<source>... [destination]` argument list into source/target
/// pairs.
///
/// One argument: the target name is invented. Two arguments: explicit
/// source and target (a directory target keeps the source file name). More:
/// when the last argument is a directory (or does not exist yet), it
/// receives all outputs under their invented names; otherwise every
/// argument is a source with an invented target.
pub fn resolve_targets<F>(args: &[PathBuf], invent: F) -> Result<Vec<(PathBuf, PathBuf)>>
where
    F: Fn(&Path) -> PathBuf,
{
    match args {
        [] => bail!("no input files given"),
        [source] => Ok(vec![(source.clone(), invent(source))]),
        [source, target] => {
            let target = if target.is_dir() {
                target.join(invent(source).file_name().unwrap_or_default())
            } else {
                target.clone()
            };
            Ok(vec![(source.clone(), target)])
        }
        _ => {
            let (last, sources) = args.split_last().unwrap();
            if last.is_dir() || !last.exists() {
                fs::create_dir_all(last)
                    .with_context(|| format!("could not create directory: {}", last.display()))?;
                Ok(sources
                    .iter()
                    .map(|source| {
                        let name = invent(source);
                        (
                            source.clone(),
                            last.join(name.file_name().unwrap_or_default()),
                        )
                    })
                    .collect())
            } else {
                Ok(args
                    .iter()
                    .map(|source| (source.clone(), invent(source)))
                    .collect())
            }
        }
    }
}

/// Like [`for_each_input`], for tools that write one output per input.
pub fn for_each_target<F>(pairs: &[(PathBuf, PathBuf)], mut work: F) -> Result<()>
where
    F: FnMut(&Path, &Path) -> Result<()>,
{
    let mut failures = 0;
    for (source, target) in pairs {
        if let Err(error) = work(source, target) {
            eprintln!("{}: {:#}", source.display(), error);
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{} of {} input files failed", failures, pairs.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invented_names_keep_the_directory() {
        let target = prefixed_target(Path::new("/data/run1.run"), "corrected_");
        assert_eq!(target, Path::new("/data/corrected_run1.run"));
    }

    #[test]
    fn single_source_gets_invented_target() {
        let pairs =
            resolve_targets(&[PathBuf::from("a.run")], |p| prefixed_target(p, "x_")).unwrap();
        assert_eq!(pairs, vec![(PathBuf::from("a.run"), PathBuf::from("x_a.run"))]);
    }

    #[test]
    fn explicit_target_is_kept() {
        let pairs = resolve_targets(
            &[PathBuf::from("a.run"), PathBuf::from("b.run")],
            |p| prefixed_target(p, "x_"),
        )
        .unwrap();
        assert_eq!(pairs, vec![(PathBuf::from("a.run"), PathBuf::from("b.run"))]);
    }

    #[test]
    fn empty_argument_list_is_a_usage_error() {
        assert!(resolve_targets(&[], |p| p.to_path_buf()).is_err());
    }
}
