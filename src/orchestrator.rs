//! Concurrent dispatch of category pipelines.
//!
//! Categories are submitted in sorted order to a bounded pool of worker
//! threads; completion order is unconstrained. Workers share nothing mutable
//! except the logging stream, so no locking exists between categories. A
//! category's failure is logged with its name and never cancels siblings or
//! the overall run.

use crate::config::{HarnessConfig, StageConfig};
use crate::invoke::ToolInvoker;
use crate::pipeline::CategoryPipeline;
use crate::registry::CategoryRegistry;
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use tracing::{debug, error, info};

/// Default worker-pool size: the host's available parallelism.
pub fn default_jobs() -> usize {
    num_cpus::get()
}

/// Process every category in `categories` on a pool of `jobs` workers.
///
/// Unrecognized categories are skipped by their own pipeline with a warning.
/// Per-category failures are logged and swallowed; the run itself always
/// completes, even when every category failed.
pub fn run_categories(
    categories: &BTreeSet<String>,
    jobs: usize,
    registry: &CategoryRegistry,
    config: &StageConfig,
    harness: &HarnessConfig,
    invoker: &dyn ToolInvoker,
) {
    let jobs = jobs.max(1);
    info!(
        categories = categories.len(),
        jobs, "dispatching category pipelines"
    );

    let (sender, receiver) = crossbeam_channel::unbounded::<&str>();
    // BTreeSet iteration gives the deterministic sorted submission order.
    for category in categories {
        sender.send(category.as_str()).expect("queue open");
    }
    drop(sender);

    thread::scope(|scope| {
        for worker in 0..jobs {
            let receiver = receiver.clone();
            scope.spawn(move || {
                debug!(worker, "worker started");
                while let Ok(category) = receiver.recv() {
                    let pipeline =
                        CategoryPipeline::new(category, registry, config, harness, invoker);
                    let outcome = catch_unwind(AssertUnwindSafe(|| pipeline.run()));
                    match outcome {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            error!(category, %err, "category pipeline failed");
                        }
                        Err(_) => {
                            error!(category, "category pipeline panicked");
                        }
                    }
                }
                debug!(worker, "worker finished");
            });
        }
    });

    info!("all category pipelines finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisasmTool;
    use crate::error::{DifftestError, Result};
    use crate::invoke::Invocation;
    use crate::pipeline::CategoryPaths;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writes an empty artifact for every capture, except that any
    /// invocation mentioning the poisoned category fails.
    struct PoisonOne {
        poisoned: &'static str,
        failures: AtomicUsize,
    }

    impl ToolInvoker for PoisonOne {
        fn run(&self, invocation: &Invocation) -> Result<i32> {
            let poisoned = invocation
                .args
                .iter()
                .any(|arg| arg.to_string_lossy().contains(self.poisoned));
            if poisoned {
                self.failures.fetch_add(1, Ordering::SeqCst);
                return Err(DifftestError::ToolFailed {
                    tool: invocation.tool.to_string(),
                    status: "exit code 1".to_string(),
                });
            }
            if let Some(out) = &invocation.stdout_to {
                std::fs::write(out, "")?;
            }
            Ok(0)
        }
    }

    #[test]
    fn test_poisoned_category_isolated() {
        let root = tempfile::tempdir().unwrap();
        let registry = CategoryRegistry::new();
        let harness = HarnessConfig::with_root(root.path());
        let config = StageConfig {
            disasm: [DisasmTool::Disarm64].into_iter().collect(),
            ..StageConfig::new()
        };
        let invoker = PoisonOne {
            poisoned: "compbranch",
            failures: AtomicUsize::new(0),
        };

        let categories: BTreeSet<String> = [
            "addsub_imm",
            "bitfield",
            "compbranch",
            "extract",
            "loadlit",
        ]
        .iter()
        .map(|name| name.to_string())
        .collect();

        run_categories(&categories, 2, &registry, &config, &harness, &invoker);

        for category in &categories {
            let paths = CategoryPaths::new(root.path(), category);
            if category == "compbranch" {
                assert!(!paths.stats().exists(), "poisoned category wrote stats");
            } else {
                assert!(paths.stats().is_file(), "missing stats for {category}");
            }
        }
        // The single disassembly invocation for the poisoned category failed.
        assert_eq!(invoker.failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_survives_all_failures() {
        let root = tempfile::tempdir().unwrap();
        let registry = CategoryRegistry::new();
        let harness = HarnessConfig::with_root(root.path());
        let config = StageConfig {
            disasm: [DisasmTool::Disarm64].into_iter().collect(),
            ..StageConfig::new()
        };
        // Every category name appears in its own artifact paths, so every
        // invocation fails.
        let invoker = PoisonOne {
            poisoned: "sve",
            failures: AtomicUsize::new(0),
        };

        let categories: BTreeSet<String> =
            ["sve_cpy", "sve_index", "sve_limm"].iter().map(|name| name.to_string()).collect();

        run_categories(&categories, 4, &registry, &config, &harness, &invoker);
        assert_eq!(invoker.failures.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unknown_categories_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let registry = CategoryRegistry::new();
        let harness = HarnessConfig::with_root(root.path());
        let config = StageConfig::new();
        let invoker = PoisonOne {
            poisoned: "never",
            failures: AtomicUsize::new(0),
        };

        let categories: BTreeSet<String> =
            ["bogus_class", "addsub_imm"].iter().map(|name| name.to_string()).collect();

        run_categories(&categories, 1, &registry, &config, &harness, &invoker);

        assert!(!root.path().join("bogus_class").exists());
        assert!(CategoryPaths::new(root.path(), "addsub_imm").stats().is_file());
    }
}
