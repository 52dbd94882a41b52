//! Error types for patching and script I/O.
//!
//! ## Error Codes
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | P001 | Argument | Malformed name, body, anchor combination, or source |
//! | P002 | Target | Function defined more than once at top level |
//! | P003 | Storage | Reading or writing the script failed |
//!
//! A missing anchor is not an error: the patcher falls back to appending and
//! records `anchor_missing` in the outcome.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from [`crate::patch`] and the file layer.
#[derive(Debug, Error)]
pub enum PatchError {
    /// P001: The request cannot be applied as given.
    #[error("P001: invalid argument: {message}")]
    InvalidArgument { message: String },

    /// P002: More than one top-level definition of the target exists.
    #[error("P002: function '{name}' is defined more than once (lines {})", join_lines(.lines))]
    AmbiguousTarget { name: String, lines: Vec<usize> },

    /// P003: The storage layer failed.
    #[error("P003: I/O failure on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    /// Creates an [`PatchError::InvalidArgument`] error.
    pub fn invalid(message: impl Into<String>) -> Self {
        PatchError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an [`PatchError::Io`] error for `path`.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        PatchError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns the error code (e.g., "P001").
    pub fn code(&self) -> &'static str {
        match self {
            PatchError::InvalidArgument { .. } => "P001",
            PatchError::AmbiguousTarget { .. } => "P002",
            PatchError::Io { .. } => "P003",
        }
    }
}

fn join_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
