//! Error types for the differential-testing harness.
//!
//! This module defines all error types used throughout the harness,
//! providing per-category failure context for logging and triage.

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for the harness.
#[derive(Debug, Error)]
pub enum DifftestError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A requested category is not in the registry.
    #[error("Unknown instruction category: {name}")]
    UnknownCategory { name: String },

    /// An external tool could not be spawned at all.
    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool ran but exited with a failure status.
    #[error("{tool} exited with {status}")]
    ToolFailed { tool: String, status: String },

    /// An upstream artifact a stage depends on does not exist.
    #[error("Missing artifact: {path}")]
    MissingArtifact { path: PathBuf },

    /// A persisted stats file could not be parsed back.
    #[error("Malformed stats file {path}: {message}")]
    MalformedStats { path: PathBuf, message: String },
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, DifftestError>;

impl DifftestError {
    /// Missing-artifact constructor, used by every stage that reads upstream files.
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        DifftestError::MissingArtifact { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DifftestError::UnknownCategory {
            name: "not_a_class".to_string(),
        };
        assert!(err.to_string().contains("not_a_class"));
    }

    #[test]
    fn test_tool_failed_display() {
        let err = DifftestError::ToolFailed {
            tool: "disarm64_gen".to_string(),
            status: "exit status: 2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("disarm64_gen"));
        assert!(msg.contains("2"));
    }

    #[test]
    fn test_missing_artifact() {
        let err = DifftestError::missing("/tmp/x/addsub_imm.stats");
        assert!(err.to_string().contains("addsub_imm.stats"));
    }
}
