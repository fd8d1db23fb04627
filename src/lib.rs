//! disarm64 differential-testing harness.
//!
//! This library drives a comparison of the `disarm64` AArch64 disassembler
//! against two reference disassemblers (LLVM objdump and GNU binutils
//! objdump) over a curated set of instruction-encoding categories.
//!
//! # Pipeline
//!
//! For each category, one [`pipeline::CategoryPipeline`] run:
//!
//! 1. synthesizes a machine-code corpus and wraps it into an ELF container,
//! 2. disassembles it with the requested tools,
//! 3. normalizes each raw listing into a canonical comparable form,
//! 4. diffs the tool under test against each reference listing,
//! 5. counts lines into a stats record,
//! 6. extracts the operand tags disarm64 does not format yet.
//!
//! All external tools are subprocesses reached through the
//! [`invoke::ToolInvoker`] capability, so the pipeline itself never parses
//! instructions. Categories run concurrently on a bounded worker pool
//! ([`orchestrator::run_categories`]); each category owns its own artifact
//! directory, so workers share nothing but the log stream.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use disarm64_difftest::{
//!     config::{HarnessConfig, StageConfig},
//!     invoke::ProcessInvoker,
//!     orchestrator,
//!     registry::CategoryRegistry,
//! };
//! use std::collections::BTreeSet;
//!
//! let registry = CategoryRegistry::new();
//! let categories: BTreeSet<String> = registry.iter().map(String::from).collect();
//! let harness = HarnessConfig::new();
//! let config = StageConfig::full();
//! orchestrator::run_categories(
//!     &categories,
//!     orchestrator::default_jobs(),
//!     &registry,
//!     &config,
//!     &harness,
//!     &ProcessInvoker,
//! );
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod invoke;
pub mod orchestrator;
pub mod pipeline;
pub mod prepare;
pub mod registry;
pub mod report;
pub mod stats;

pub use config::{DisasmTool, HarnessConfig, MissingListingPolicy, StageConfig, ToolPaths};
pub use error::{DifftestError, Result};
pub use invoke::{Invocation, ProcessInvoker, ToolInvoker};
pub use pipeline::{CategoryPaths, CategoryPipeline};
pub use registry::{CategoryRegistry, KNOWN_CATEGORIES};
pub use stats::Stats;

/// Get version information for this library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_registry_reexport() {
        let registry = CategoryRegistry::new();
        assert!(registry.contains("addsub_imm"));
    }
}
