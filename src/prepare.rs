//! One-shot decompression of compressed corpus fixtures.
//!
//! The checked-in corpus trees store listings as `.xz` files; this sweep
//! inflates each one next to its source before the pipeline runs. Files are
//! processed concurrently and independently, and a single file's failure
//! never aborts the sweep.

use crate::error::Result;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{error, info};
use walkdir::WalkDir;
use xz2::read::XzDecoder;

/// Outcome of a decompression sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Files decompressed successfully.
    pub decompressed: usize,
    /// Files that failed to decompress.
    pub failed: usize,
}

/// Default worker count for the sweep: decompression is cheap enough that
/// oversubscribing the cores keeps the IO queues full.
pub fn default_sweep_jobs() -> usize {
    2 * num_cpus::get()
}

/// Decompress one `.xz` file next to its source, returning the output path.
pub fn decompress_file(path: &Path) -> Result<PathBuf> {
    let output = path.with_extension("");
    let mut decoder = XzDecoder::new(File::open(path)?);
    let mut sink = File::create(&output)?;
    io::copy(&mut decoder, &mut sink)?;
    Ok(output)
}

/// Walk `root` for `.xz` files and decompress them all on `jobs` workers.
pub fn decompress_tree(root: &Path, jobs: usize) -> SweepSummary {
    let mut targets: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "xz")
        })
        .map(|entry| entry.into_path())
        .collect();
    targets.sort();

    info!(
        root = %root.display(),
        files = targets.len(),
        jobs,
        "decompressing fixtures"
    );

    let jobs = jobs.max(1);
    let (sender, receiver) = crossbeam_channel::unbounded::<PathBuf>();
    for target in targets {
        sender.send(target).expect("queue open");
    }
    drop(sender);

    let mut summary = SweepSummary::default();
    thread::scope(|scope| {
        let mut workers = Vec::with_capacity(jobs);
        for _ in 0..jobs {
            let receiver = receiver.clone();
            workers.push(scope.spawn(move || {
                let mut local = SweepSummary::default();
                while let Ok(path) = receiver.recv() {
                    match decompress_file(&path) {
                        Ok(output) => {
                            info!(from = %path.display(), to = %output.display(), "decompressed");
                            local.decompressed += 1;
                        }
                        Err(err) => {
                            error!(path = %path.display(), %err, "decompression failed");
                            local.failed += 1;
                        }
                    }
                }
                local
            }));
        }
        for worker in workers {
            let local = worker.join().expect("worker panicked");
            summary.decompressed += local.decompressed;
            summary.failed += local.failed;
        }
    });

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use xz2::write::XzEncoder;

    fn write_xz(path: &Path, content: &[u8]) {
        let file = File::create(path).unwrap();
        let mut encoder = XzEncoder::new(file, 6);
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_decompress_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addsub_imm-llvm.lst.xz");
        write_xz(&path, b"add w0, w1, #1\n");

        let output = decompress_file(&path).unwrap();
        assert_eq!(output, dir.path().join("addsub_imm-llvm.lst"));
        assert_eq!(std::fs::read(&output).unwrap(), b"add w0, w1, #1\n");
    }

    #[test]
    fn test_tree_sweep_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("addsub_imm");
        std::fs::create_dir_all(&nested).unwrap();

        write_xz(&nested.join("a.lst.xz"), b"one\n");
        write_xz(&dir.path().join("b.lst.xz"), b"two\n");
        // Not actually xz data.
        std::fs::write(dir.path().join("broken.lst.xz"), b"not xz").unwrap();
        // Not an xz file at all; must be ignored.
        std::fs::write(dir.path().join("plain.lst"), b"ignored").unwrap();

        let summary = decompress_tree(dir.path(), 2);
        assert_eq!(
            summary,
            SweepSummary {
                decompressed: 2,
                failed: 1
            }
        );
        assert!(nested.join("a.lst").is_file());
        assert!(dir.path().join("b.lst").is_file());
    }
}
