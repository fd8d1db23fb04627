//! Harness configuration: which stages run, and where the external tools live.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// One of the three disassembly tools the harness can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DisasmTool {
    /// LLVM objdump (reference).
    Llvm,
    /// GNU binutils objdump (reference).
    Binutils,
    /// disarm64, the tool under test.
    Disarm64,
}

impl DisasmTool {
    /// All three tools, in listing-suffix order.
    pub const ALL: [DisasmTool; 3] = [DisasmTool::Llvm, DisasmTool::Binutils, DisasmTool::Disarm64];

    /// Short name used in artifact file suffixes and logs.
    pub fn name(self) -> &'static str {
        match self {
            DisasmTool::Llvm => "llvm",
            DisasmTool::Binutils => "binutils",
            DisasmTool::Disarm64 => "disarm64",
        }
    }
}

impl std::fmt::Display for DisasmTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What the diff and stats stages do when a normalized listing they would
/// read was never produced (for example because its tool was not requested).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingListingPolicy {
    /// Skip the affected comparison or count; record the slot as absent.
    #[default]
    Skip,
    /// Treat the missing listing as a stage failure for the category.
    Fail,
}

/// Per-run stage configuration for a category pipeline.
#[derive(Debug, Clone, Default)]
pub struct StageConfig {
    /// Regenerate the binary corpus and its ELF container.
    pub generate_corpus: bool,
    /// Run the normalizer over each raw listing present.
    pub normalize: bool,
    /// Which disassembly tools to invoke. Empty set runs none.
    pub disasm: BTreeSet<DisasmTool>,
    /// Missing-listing behavior for the diff and stats stages.
    pub missing_listing: MissingListingPolicy,
}

impl StageConfig {
    /// Configuration with every stage disabled. Diff, stats, and unhandled
    /// stages still run over whatever artifacts already exist on disk.
    pub fn new() -> Self {
        StageConfig::default()
    }

    /// Configuration with every stage and all three tools enabled.
    pub fn full() -> Self {
        StageConfig {
            generate_corpus: true,
            normalize: true,
            disasm: DisasmTool::ALL.iter().copied().collect(),
            missing_listing: MissingListingPolicy::Skip,
        }
    }
}

/// Locations of the external tools the pipeline shells out to.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    /// Corpus generator producing raw machine code for a category.
    pub corpus_generator: PathBuf,
    /// Instruction-table JSON the corpus generator reads.
    pub instruction_spec: PathBuf,
    /// objcopy used to wrap raw bytes into an executable-section ELF.
    pub objcopy: PathBuf,
    /// LLVM objdump binary.
    pub llvm_objdump: PathBuf,
    /// GNU binutils objdump binary (AArch64 cross build).
    pub gnu_objdump: PathBuf,
    /// The disassembler under test.
    pub disarm64: PathBuf,
    /// Listing normalizer, built on demand by `--norm`.
    pub normalizer: PathBuf,
    /// GNU diff binary.
    pub diff: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            corpus_generator: PathBuf::from("disarm64_gen"),
            instruction_spec: PathBuf::from("./aarch64.json"),
            objcopy: PathBuf::from("rust-objcopy"),
            llvm_objdump: PathBuf::from("rust-objdump"),
            gnu_objdump: PathBuf::from("aarch64-linux-gnu-objdump"),
            disarm64: PathBuf::from("disarm64"),
            normalizer: PathBuf::from("./target/release/norm"),
            diff: PathBuf::from("diff"),
        }
    }
}

/// Top-level harness configuration shared by all category pipelines.
#[derive(Debug, Clone, Default)]
pub struct HarnessConfig {
    /// Root directory holding one subdirectory per category.
    pub classes_root: PathBuf,
    /// External tool locations.
    pub tools: ToolPaths,
}

impl HarnessConfig {
    /// Configuration rooted at the conventional `./test/classes` layout.
    pub fn new() -> Self {
        HarnessConfig {
            classes_root: PathBuf::from("./test/classes"),
            tools: ToolPaths::default(),
        }
    }

    /// Configuration rooted at an arbitrary classes directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        HarnessConfig {
            classes_root: root.into(),
            tools: ToolPaths::default(),
        }
    }
}
