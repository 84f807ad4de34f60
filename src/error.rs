//! Error types for schema loading and payload validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading schema documents or decoding payloads.
///
/// Validation itself never fails for a well-formed document; everything in
/// here is raised before the first node is visited.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported number {number} at {path}: only integers are accepted")]
    UnsupportedNumber { path: String, number: String },

    // Schema errors (exit code 2)
    #[error("invalid schema at {path}: expected object, got {actual}")]
    NotASchema { path: String, actual: String },

    #[error("invalid {keyword} at {path}: {message}")]
    InvalidKeyword {
        path: String,
        keyword: String,
        message: String,
    },
}

/// Errors during validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("validation failed with {} violation(s)", violations.len())]
    Invalid { violations: Vec<Violation> },
}

/// One mismatch between a payload subtree and the constraint applying to it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Violation {
    /// Dotted/bracketed pointer, e.g. `payload.rules[1].type`.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::Invalid { .. } => 1,
        }
    }
}
