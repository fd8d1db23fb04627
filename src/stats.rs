//! Line-count statistics and unhandled-operand extraction.
//!
//! Both are pure functions of files already on disk, so re-running them
//! against unchanged artifacts reproduces identical output.

use crate::error::{DifftestError, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

/// Per-category line counts: three normalized listings, two diffs.
///
/// A `None` slot means the corresponding artifact was legitimately skipped
/// (its tool was not requested) and serializes as `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Lines in the normalized LLVM listing.
    pub llvm: Option<u64>,
    /// Lines in the normalized binutils listing.
    pub binutils: Option<u64>,
    /// Lines in the normalized disarm64 listing.
    pub disarm64: Option<u64>,
    /// Lines in the disarm64-vs-llvm diff.
    pub llvm_diff: Option<u64>,
    /// Lines in the disarm64-vs-binutils diff.
    pub disarm64_diff: Option<u64>,
}

impl Stats {
    /// Render as the persisted whitespace-joined form, e.g. `450 448 450 12 3`.
    pub fn serialize(&self) -> String {
        [
            self.llvm,
            self.binutils,
            self.disarm64,
            self.llvm_diff,
            self.disarm64_diff,
        ]
        .iter()
        .map(|slot| field(*slot))
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Parse the persisted form back. `path` is only used for error context.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(DifftestError::MalformedStats {
                path: path.to_path_buf(),
                message: format!("expected 5 fields, got {}", fields.len()),
            });
        }
        let mut slots = [None; 5];
        for (slot, raw) in slots.iter_mut().zip(&fields) {
            *slot = parse_field(raw, path)?;
        }
        Ok(Stats {
            llvm: slots[0],
            binutils: slots[1],
            disarm64: slots[2],
            llvm_diff: slots[3],
            disarm64_diff: slots[4],
        })
    }

    /// Discrepancy ratio of disarm64 against LLVM, `diffLines/totalLines`.
    pub fn llvm_ratio(&self) -> String {
        ratio(self.llvm_diff, self.llvm)
    }

    /// Discrepancy ratio of disarm64 against binutils, `diffLines/totalLines`.
    pub fn binutils_ratio(&self) -> String {
        ratio(self.disarm64_diff, self.disarm64)
    }
}

fn field(slot: Option<u64>) -> String {
    match slot {
        Some(count) => count.to_string(),
        None => "-".to_string(),
    }
}

fn parse_field(raw: &str, path: &Path) -> Result<Option<u64>> {
    if raw == "-" {
        return Ok(None);
    }
    raw.parse::<u64>()
        .map(Some)
        .map_err(|_| DifftestError::MalformedStats {
            path: path.to_path_buf(),
            message: format!("bad count {raw:?}"),
        })
}

fn ratio(diff: Option<u64>, total: Option<u64>) -> String {
    match (diff, total) {
        (Some(d), Some(t)) => format!("{d}/{t}"),
        _ => "-".to_string(),
    }
}

/// Count the lines of a text file without holding it in memory.
pub fn count_lines(path: &Path) -> Result<u64> {
    if !path.is_file() {
        return Err(DifftestError::missing(path));
    }
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0u64;
    for line in reader.lines() {
        line?;
        count += 1;
    }
    Ok(count)
}

fn unhandled_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Exactly a colon, one or more word characters, a colon. The normalizer
    // embeds these tags around operands disarm64 could not fully decode.
    PATTERN.get_or_init(|| Regex::new(r":(\w+):").expect("valid pattern"))
}

/// Collect the distinct unhandled-operand tag bodies in a normalized listing.
pub fn find_unhandled_operands(text: &str) -> BTreeSet<String> {
    unhandled_pattern()
        .captures_iter(text)
        .map(|capture| capture[1].to_string())
        .collect()
}

/// Render an unhandled-operand set as its persisted sorted, comma-joined form.
pub fn serialize_unhandled(tags: &BTreeSet<String>) -> String {
    tags.iter().cloned().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_stats_roundtrip() {
        let stats = Stats {
            llvm: Some(450),
            binutils: Some(448),
            disarm64: Some(450),
            llvm_diff: Some(12),
            disarm64_diff: Some(3),
        };
        let text = stats.serialize();
        assert_eq!(text, "450 448 450 12 3");
        assert_eq!(Stats::parse(&text, Path::new("x.stats")).unwrap(), stats);
    }

    #[test]
    fn test_stats_absent_slots() {
        let stats = Stats {
            llvm: Some(450),
            binutils: None,
            disarm64: Some(449),
            llvm_diff: Some(7),
            disarm64_diff: None,
        };
        let text = stats.serialize();
        assert_eq!(text, "450 - 449 7 -");
        let parsed = Stats::parse(&text, Path::new("x.stats")).unwrap();
        assert_eq!(parsed.binutils, None);
        assert_eq!(parsed.llvm_ratio(), "7/450");
        assert_eq!(parsed.binutils_ratio(), "-");
    }

    #[test]
    fn test_stats_parse_rejects_garbage() {
        let err = Stats::parse("1 2 3", Path::new("x.stats")).unwrap_err();
        assert!(matches!(err, DifftestError::MalformedStats { .. }));
        let err = Stats::parse("1 2 3 four 5", Path::new("x.stats")).unwrap_err();
        assert!(matches!(err, DifftestError::MalformedStats { .. }));
    }

    #[test]
    fn test_count_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing.norm.lst");

        std::fs::write(&path, "").unwrap();
        assert_eq!(count_lines(&path).unwrap(), 0);

        std::fs::write(&path, "add w0, w1, #1\nsub x2, x3, #2\n").unwrap();
        assert_eq!(count_lines(&path).unwrap(), 2);

        // Final line without a trailing newline still counts.
        let mut file = File::create(&path).unwrap();
        write!(file, "add w0, w1, #1\nsub x2, x3, #2").unwrap();
        drop(file);
        assert_eq!(count_lines(&path).unwrap(), 2);
    }

    #[test]
    fn test_count_lines_missing_file() {
        let err = count_lines(Path::new("/nonexistent/x.norm.lst")).unwrap_err();
        assert!(matches!(err, DifftestError::MissingArtifact { .. }));
    }

    #[test]
    fn test_unhandled_dedup_and_sort() {
        let tags = find_unhandled_operands("\":imm12:\" \":shift:\" \":imm12:\"");
        assert_eq!(serialize_unhandled(&tags), "imm12,shift");
    }

    #[test]
    fn test_unhandled_in_listing_context() {
        let listing = "add w0, w1, :imm12:\nldr x0, [x1, :simm9:]\nadd w2, w3, :imm12:\n";
        let tags = find_unhandled_operands(listing);
        assert_eq!(serialize_unhandled(&tags), "imm12,simm9");
    }

    #[test]
    fn test_unhandled_ignores_unbalanced_colons() {
        let tags = find_unhandled_operands("no tags here: just prose, x:y");
        assert!(tags.is_empty());
        // A lone trailing colon does not open a new tag.
        let tags = find_unhandled_operands(":a: b:");
        assert_eq!(serialize_unhandled(&tags), "a");
    }

    #[test]
    fn test_unhandled_empty_input() {
        assert!(find_unhandled_operands("").is_empty());
        assert_eq!(serialize_unhandled(&BTreeSet::new()), "");
    }
}
