//! prepare CLI
//!
//! One-shot decompression of the checked-in `.xz` corpus fixtures before a
//! harness run.

use clap::Parser;
use disarm64_difftest::prepare::{decompress_tree, default_sweep_jobs};
use std::path::PathBuf;
use std::process::ExitCode;

/// Decompress `.xz` fixture files under the classes tree.
#[derive(Parser, Debug)]
#[command(name = "prepare")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Root directory to sweep for `.xz` files
    #[arg(default_value = "./test/classes")]
    root: PathBuf,

    /// Number of files to decompress concurrently
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let jobs = args.jobs.unwrap_or_else(default_sweep_jobs);
    let summary = decompress_tree(&args.root, jobs);

    println!(
        "Decompressed {} file(s), {} failure(s)",
        summary.decompressed, summary.failed
    );

    // Best-effort sweep: individual failures are logged, not fatal.
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["prepare"]).unwrap();
        assert_eq!(args.root, PathBuf::from("./test/classes"));
        assert_eq!(args.jobs, None);
    }

    #[test]
    fn test_args_custom_root() {
        let args = Args::try_parse_from(["prepare", "/tmp/classes", "-j", "8"]).unwrap();
        assert_eq!(args.root, PathBuf::from("/tmp/classes"));
        assert_eq!(args.jobs, Some(8));
    }
}
