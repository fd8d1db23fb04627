//! difftest CLI
//!
//! Command-line driver for the disarm64 differential-testing harness.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use disarm64_difftest::{
    config::{DisasmTool, HarnessConfig, MissingListingPolicy, StageConfig},
    invoke::{run_checked, Invocation, ProcessInvoker},
    orchestrator, report,
    registry::CategoryRegistry,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;

/// Differential tester for the disarm64 AArch64 disassembler.
///
/// Generates per-category machine-code corpora, disassembles them with
/// disarm64 and with the LLVM and GNU binutils reference disassemblers,
/// and compares the normalized listings.
#[derive(Parser, Debug)]
#[command(name = "difftest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Instruction categories to process, e.g. addsub_imm addsub_shift.
    /// Empty selection processes every registered category.
    categories: Vec<String>,

    /// Regenerate the binary corpus and ELF container for each category
    #[arg(short, long)]
    force: bool,

    /// Normalize the raw listings (builds the norm tool first)
    #[arg(short, long)]
    norm: bool,

    /// Disassembly tools to invoke; omitting runs none
    #[arg(short, long, value_enum, num_args = 0..)]
    disasm: Vec<DisasmTool>,

    /// Print the summary table after processing
    #[arg(short, long)]
    table: bool,

    /// Output format of the summary table
    #[arg(long, value_enum, default_value = "markdown", requires = "table")]
    report_format: ReportFormat,

    /// Fail a category when a requested comparison input is missing,
    /// instead of skipping the comparison
    #[arg(long)]
    strict: bool,

    /// Number of categories to process concurrently
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Root directory holding the per-category artifact directories
    #[arg(long, env = "DIFFTEST_CLASSES_ROOT", default_value = "./test/classes")]
    classes_root: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Summary-table output format.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    /// Markdown table
    Markdown,
    /// JSON array of rows
    Json,
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

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let registry = CategoryRegistry::new();
    let harness = HarnessConfig {
        classes_root: args.classes_root.clone(),
        ..HarnessConfig::new()
    };
    let config = StageConfig {
        generate_corpus: args.force,
        normalize: args.norm,
        disasm: args.disasm.iter().copied().collect(),
        missing_listing: if args.strict {
            MissingListingPolicy::Fail
        } else {
            MissingListingPolicy::Skip
        },
    };

    let categories: BTreeSet<String> = if args.categories.is_empty() {
        registry.iter().map(String::from).collect()
    } else {
        args.categories.iter().cloned().collect()
    };

    let invoker = ProcessInvoker;

    // The normalizer is built from this workspace; one build covers all
    // categories.
    if args.norm {
        run_checked(
            &invoker,
            &Invocation::new("cargo", "cargo").args(["build", "--release"]),
        )
        .context("building the norm tool")?;
    }

    let jobs = args.jobs.unwrap_or_else(orchestrator::default_jobs);
    orchestrator::run_categories(&categories, jobs, &registry, &config, &harness, &invoker);

    if args.table {
        let rows = report::collect_rows(&categories, &harness.classes_root)
            .context("aggregating the summary table")?;
        match args.report_format {
            ReportFormat::Markdown => print!("{}", report::render_markdown(&rows)),
            ReportFormat::Json => println!("{}", report::render_json(&rows)?),
        }
    }

    Ok(())
}
