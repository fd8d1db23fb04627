//! Per-category comparison pipeline.
//!
//! One [`CategoryPipeline`] run materializes (or reuses) the machine-code
//! corpus for a category, disassembles it with the requested tools,
//! normalizes the listings, diffs the tool under test against each reference,
//! and persists the stats and unhandled-operand artifacts. Stages run
//! strictly in order; every artifact lives under the category's own
//! directory, so concurrent pipelines never touch shared files.

use crate::config::{DisasmTool, HarnessConfig, MissingListingPolicy, StageConfig};
use crate::error::{DifftestError, Result};
use crate::invoke::{require_artifact, run_checked, run_expecting, Invocation, ToolInvoker};
use crate::registry::CategoryRegistry;
use crate::stats::{count_lines, find_unhandled_operands, serialize_unhandled, Stats};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// GNU diff configuration: whitespace- and trailing-CR-insensitive, common
/// lines suppressed, so the diff's line count is exactly the divergent-line
/// count.
pub const DIFF_FLAGS: &[&str] = &[
    "-waybB",
    "--speed-large-files",
    "--strip-trailing-cr",
    "--horizon-lines=0",
    "--suppress-common-lines",
];

/// File layout of one category's directory.
///
/// Artifacts are keyed by category name plus a stable suffix; the directory
/// itself is named after the category.
#[derive(Debug, Clone)]
pub struct CategoryPaths {
    category: String,
    dir: PathBuf,
}

impl CategoryPaths {
    /// Layout for `category` under the classes root.
    pub fn new(root: &Path, category: &str) -> Self {
        CategoryPaths {
            category: category.to_string(),
            dir: root.join(category),
        }
    }

    /// The category's directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Raw machine-code corpus, `<category>.bin`.
    pub fn bin(&self) -> PathBuf {
        self.dir.join(format!("{}.bin", self.category))
    }

    /// ELF container wrapping the corpus, `<category>.elf`.
    pub fn elf(&self) -> PathBuf {
        self.dir.join(format!("{}.elf", self.category))
    }

    /// Raw listing for one tool, `<category>-<tool>.lst`.
    pub fn listing(&self, tool: DisasmTool) -> PathBuf {
        self.dir.join(format!("{}-{}.lst", self.category, tool.name()))
    }

    /// Normalized listing for one tool, `<category>-<tool>.norm.lst`.
    pub fn normalized(&self, tool: DisasmTool) -> PathBuf {
        self.dir
            .join(format!("{}-{}.norm.lst", self.category, tool.name()))
    }

    /// Diff of disarm64 against LLVM, `<category>-llvm.diff`.
    pub fn diff_vs_llvm(&self) -> PathBuf {
        self.dir.join(format!("{}-llvm.diff", self.category))
    }

    /// Diff of disarm64 against binutils, `<category>-disarm64.diff`.
    pub fn diff_vs_binutils(&self) -> PathBuf {
        self.dir.join(format!("{}-disarm64.diff", self.category))
    }

    /// Line-count stats record, `<category>.stats`.
    pub fn stats(&self) -> PathBuf {
        self.dir.join(format!("{}.stats", self.category))
    }

    /// Unhandled-operand set, `<category>-disarm64.unhandled`.
    pub fn unhandled(&self) -> PathBuf {
        self.dir
            .join(format!("{}-disarm64.unhandled", self.category))
    }
}

/// One unit of work: the full stage sequence for a single category.
pub struct CategoryPipeline<'a> {
    category: &'a str,
    paths: CategoryPaths,
    registry: &'a CategoryRegistry,
    config: &'a StageConfig,
    harness: &'a HarnessConfig,
    invoker: &'a dyn ToolInvoker,
}

impl<'a> CategoryPipeline<'a> {
    /// Build the pipeline for `category`.
    pub fn new(
        category: &'a str,
        registry: &'a CategoryRegistry,
        config: &'a StageConfig,
        harness: &'a HarnessConfig,
        invoker: &'a dyn ToolInvoker,
    ) -> Self {
        CategoryPipeline {
            category,
            paths: CategoryPaths::new(&harness.classes_root, category),
            registry,
            config,
            harness,
            invoker,
        }
    }

    /// The category's file layout.
    pub fn paths(&self) -> &CategoryPaths {
        &self.paths
    }

    /// Run all configured stages in order.
    ///
    /// An unrecognized category logs a warning and returns `Ok` without
    /// touching the filesystem; any stage failure aborts the remaining
    /// stages for this category only.
    pub fn run(&self) -> Result<()> {
        if !self.registry.contains(self.category) {
            warn!(
                category = self.category,
                "not in the registry of known categories, skipping"
            );
            return Ok(());
        }

        info!(category = self.category, "processing");
        fs::create_dir_all(self.paths.dir())?;

        if self.config.generate_corpus {
            self.generate_corpus()?;
        }
        self.disassemble()?;
        if self.config.normalize {
            self.normalize()?;
        }
        self.diff()?;
        self.collect_stats()?;
        self.extract_unhandled()?;

        info!(category = self.category, "done");
        Ok(())
    }

    /// Stage 1: synthesize the corpus and wrap it into an ELF container.
    fn generate_corpus(&self) -> Result<()> {
        let tools = &self.harness.tools;
        let bin = self.paths.bin();
        let elf = self.paths.elf();

        info!(category = self.category, path = %bin.display(), "generating corpus");
        run_checked(
            self.invoker,
            &Invocation::new("disarm64_gen", &tools.corpus_generator)
                .arg(tools.instruction_spec.as_os_str())
                .arg("-c")
                .arg(self.category)
                .arg("-t")
                .arg(bin.as_os_str()),
        )?;
        require_artifact(&bin)?;

        info!(category = self.category, path = %elf.display(), "wrapping corpus");
        run_checked(
            self.invoker,
            &Invocation::new("objcopy", &tools.objcopy)
                .args([
                    "-I",
                    "binary",
                    "-O",
                    "elf64-littleaarch64",
                    "--rename-section=.data=.text,code",
                ])
                .arg(bin.as_os_str())
                .arg(elf.as_os_str()),
        )?;
        require_artifact(&elf)
    }

    /// Stage 2: run each requested disassembler against the corpus.
    ///
    /// Tools run independently; every requested tool is invoked even when an
    /// earlier one failed, and the first failure is propagated afterwards.
    fn disassemble(&self) -> Result<()> {
        let tools = &self.harness.tools;
        let mut first_failure = None;

        for tool in &self.config.disasm {
            let listing = self.paths.listing(*tool);
            info!(category = self.category, tool = %tool, path = %listing.display(), "disassembling");

            // LLVM objdump reads the ELF container; the other two take raw bytes.
            let invocation = match tool {
                DisasmTool::Llvm => Invocation::new("rust-objdump", &tools.llvm_objdump)
                    .arg("-d")
                    .arg(self.paths.elf().as_os_str()),
                DisasmTool::Binutils => Invocation::new("gnu-objdump", &tools.gnu_objdump)
                    .args(["-m", "aarch64", "-b", "binary", "-D"])
                    .arg(self.paths.bin().as_os_str()),
                DisasmTool::Disarm64 => Invocation::new("disarm64", &tools.disarm64)
                    .arg("bin")
                    .arg(self.paths.bin().as_os_str()),
            }
            .capture(&listing);

            if let Err(err) = run_checked(self.invoker, &invocation) {
                error!(category = self.category, tool = %tool, %err, "disassembly failed");
                first_failure.get_or_insert(err);
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Stage 3: normalize every raw listing that exists.
    fn normalize(&self) -> Result<()> {
        for tool in DisasmTool::ALL {
            let listing = self.paths.listing(tool);
            if !listing.is_file() {
                debug!(category = self.category, tool = %tool, "no raw listing, skipping normalize");
                continue;
            }
            let normalized = self.paths.normalized(tool);
            info!(category = self.category, tool = %tool, path = %normalized.display(), "normalizing");
            run_checked(
                self.invoker,
                &Invocation::new("norm", &self.harness.tools.normalizer)
                    .arg(listing.as_os_str())
                    .capture(&normalized),
            )?;
        }
        Ok(())
    }

    /// Stage 4: diff the tool under test against each reference listing.
    fn diff(&self) -> Result<()> {
        self.diff_pair(DisasmTool::Llvm, self.paths.diff_vs_llvm())?;
        self.diff_pair(DisasmTool::Binutils, self.paths.diff_vs_binutils())
    }

    fn diff_pair(&self, reference: DisasmTool, output: PathBuf) -> Result<()> {
        let under_test = self.paths.normalized(DisasmTool::Disarm64);
        let baseline = self.paths.normalized(reference);

        for input in [&under_test, &baseline] {
            if !input.is_file() {
                return match self.config.missing_listing {
                    MissingListingPolicy::Skip => {
                        debug!(
                            category = self.category,
                            reference = %reference,
                            missing = %input.display(),
                            "skipping diff"
                        );
                        Ok(())
                    }
                    MissingListingPolicy::Fail => Err(DifftestError::missing(input)),
                };
            }
        }

        info!(category = self.category, reference = %reference, path = %output.display(), "diffing");
        // diff exits 1 when the inputs differ; only >1 is an actual failure.
        run_expecting(
            self.invoker,
            &Invocation::new("diff", &self.harness.tools.diff)
                .args(DIFF_FLAGS)
                .arg(under_test.as_os_str())
                .arg(baseline.as_os_str())
                .capture(&output),
            &[0, 1],
        )
    }

    /// Stage 5: count lines in the normalized listings and diffs.
    fn collect_stats(&self) -> Result<()> {
        let stats = Stats {
            llvm: self.count_slot(&self.paths.normalized(DisasmTool::Llvm))?,
            binutils: self.count_slot(&self.paths.normalized(DisasmTool::Binutils))?,
            disarm64: self.count_slot(&self.paths.normalized(DisasmTool::Disarm64))?,
            llvm_diff: self.count_slot(&self.paths.diff_vs_llvm())?,
            disarm64_diff: self.count_slot(&self.paths.diff_vs_binutils())?,
        };
        let rendered = stats.serialize();
        fs::write(self.paths.stats(), &rendered)?;
        info!(category = self.category, stats = %rendered, "stats collected");
        Ok(())
    }

    fn count_slot(&self, path: &Path) -> Result<Option<u64>> {
        if path.is_file() {
            return count_lines(path).map(Some);
        }
        match self.config.missing_listing {
            MissingListingPolicy::Skip => Ok(None),
            MissingListingPolicy::Fail => Err(DifftestError::missing(path)),
        }
    }

    /// Stage 6: extract unhandled-operand tags from the disarm64 listing.
    fn extract_unhandled(&self) -> Result<()> {
        let normalized = self.paths.normalized(DisasmTool::Disarm64);
        if !normalized.is_file() {
            return match self.config.missing_listing {
                MissingListingPolicy::Skip => {
                    debug!(category = self.category, "no disarm64 listing, skipping unhandled scan");
                    Ok(())
                }
                MissingListingPolicy::Fail => Err(DifftestError::missing(&normalized)),
            };
        }

        let text = fs::read_to_string(&normalized)?;
        let tags = find_unhandled_operands(&text);
        let rendered = serialize_unhandled(&tags);
        fs::write(self.paths.unhandled(), &rendered)?;
        info!(category = self.category, unhandled = %rendered, "unhandled operands");
        Ok(())
    }
}
