//! Summary-report aggregation.
//!
//! Reads the persisted stats and unhandled-operand artifacts of already
//! processed categories and renders one row per category, in lexicographic
//! order regardless of pipeline completion order. A missing artifact is
//! fatal to report generation: a partially rendered table would be
//! misleading, so the caller is expected to only request categories whose
//! stats collection completed.

use crate::error::Result;
use crate::pipeline::CategoryPaths;
use crate::stats::Stats;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// One rendered row of the summary report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    /// Category name.
    pub category: String,
    /// Discrepancy ratio of disarm64 against LLVM, `diffLines/totalLines`.
    pub vs_llvm: String,
    /// Discrepancy ratio of disarm64 against binutils.
    pub vs_binutils: String,
    /// Sorted operand tags disarm64 does not format yet.
    pub unhandled: Vec<String>,
}

/// Collect one row per category, in sorted order.
///
/// Fails on the first category whose stats or unhandled file is missing or
/// malformed.
pub fn collect_rows(categories: &BTreeSet<String>, root: &Path) -> Result<Vec<ReportRow>> {
    let mut rows = Vec::with_capacity(categories.len());
    for category in categories {
        let paths = CategoryPaths::new(root, category);

        let stats_path = paths.stats();
        if !stats_path.is_file() {
            return Err(crate::error::DifftestError::missing(&stats_path));
        }
        let stats = Stats::parse(&fs::read_to_string(&stats_path)?, &stats_path)?;

        let unhandled_path = paths.unhandled();
        if !unhandled_path.is_file() {
            return Err(crate::error::DifftestError::missing(&unhandled_path));
        }
        let unhandled_text = fs::read_to_string(&unhandled_path)?;
        let unhandled = unhandled_text
            .split(',')
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();

        rows.push(ReportRow {
            category: category.clone(),
            vs_llvm: stats.llvm_ratio(),
            vs_binutils: stats.binutils_ratio(),
            unhandled,
        });
    }
    Ok(rows)
}

/// Render the rows as a markdown table.
pub fn render_markdown(rows: &[ReportRow]) -> String {
    let mut table = String::from(
        "| Category | disarm64 vs LLVM | disarm64 vs binutils | Implement formatting for |\n",
    );
    table.push_str(
        "|----------|-----------------:|---------------------:|--------------------------|\n",
    );
    for row in rows {
        let tags = if row.unhandled.is_empty() {
            String::new()
        } else {
            format!("`{}`", row.unhandled.join("`, `"))
        };
        table.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            row.category, row.vs_llvm, row.vs_binutils, tags
        ));
    }
    table
}

/// Render the rows as pretty-printed JSON.
pub fn render_json(rows: &[ReportRow]) -> Result<String> {
    serde_json::to_string_pretty(rows).map_err(|err| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, err).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DifftestError;
    use pretty_assertions::assert_eq;

    fn write_category(root: &Path, category: &str, stats: &str, unhandled: &str) {
        let dir = root.join(category);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{category}.stats")), stats).unwrap();
        fs::write(
            dir.join(format!("{category}-disarm64.unhandled")),
            unhandled,
        )
        .unwrap();
    }

    #[test]
    fn test_rows_sorted_regardless_of_insertion() {
        let root = tempfile::tempdir().unwrap();
        write_category(root.path(), "movewide", "10 10 10 0 0", "");
        write_category(root.path(), "addsub_imm", "450 448 450 12 3", "imm12,shift");
        write_category(root.path(), "bitfield", "64 64 64 4 4", "immr");

        let categories: BTreeSet<String> = ["movewide", "bitfield", "addsub_imm"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        let rows = collect_rows(&categories, root.path()).unwrap();

        let names: Vec<_> = rows.iter().map(|row| row.category.as_str()).collect();
        assert_eq!(names, vec!["addsub_imm", "bitfield", "movewide"]);
        assert_eq!(rows[0].vs_llvm, "12/450");
        assert_eq!(rows[0].vs_binutils, "3/450");
        assert_eq!(rows[0].unhandled, vec!["imm12", "shift"]);
        assert!(rows[2].unhandled.is_empty());
    }

    #[test]
    fn test_missing_stats_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        write_category(root.path(), "addsub_imm", "1 1 1 0 0", "");

        let categories: BTreeSet<String> = ["addsub_imm", "bitfield"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        let err = collect_rows(&categories, root.path()).unwrap_err();
        assert!(matches!(err, DifftestError::MissingArtifact { .. }));
    }

    #[test]
    fn test_markdown_rendering() {
        let rows = vec![
            ReportRow {
                category: "addsub_imm".to_string(),
                vs_llvm: "12/450".to_string(),
                vs_binutils: "3/450".to_string(),
                unhandled: vec!["imm12".to_string(), "shift".to_string()],
            },
            ReportRow {
                category: "movewide".to_string(),
                vs_llvm: "-".to_string(),
                vs_binutils: "0/10".to_string(),
                unhandled: Vec::new(),
            },
        ];
        let table = render_markdown(&rows);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("disarm64 vs binutils"));
        assert_eq!(lines[2], "| `addsub_imm` | 12/450 | 3/450 | `imm12`, `shift` |");
        assert_eq!(lines[3], "| `movewide` | - | 0/10 |  |");
    }

    #[test]
    fn test_json_rendering() {
        let rows = vec![ReportRow {
            category: "addsub_imm".to_string(),
            vs_llvm: "12/450".to_string(),
            vs_binutils: "3/450".to_string(),
            unhandled: vec!["imm12".to_string()],
        }];
        let json = render_json(&rows).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["category"], "addsub_imm");
        assert_eq!(value[0]["unhandled"][0], "imm12");
    }
}
