//! Error types and load result structures for the definition loader.

use std::path::PathBuf;

/// Errors that can occur while loading definitions.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Definition validation error (unknown kind, empty id, bad condition, duplicate id).
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result alias for loader operations.
pub type Result<T> = std::result::Result<T, DefinitionError>;

/// Outcome of loading a single definition file.
#[derive(Debug)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug, PartialEq)]
pub enum LoadStatus {
    /// Every definition in the file was loaded, in document order.
    Loaded { ids: Vec<String> },
    /// File was skipped (dotfile, non-YAML, no documents).
    Skipped { reason: String },
    /// Parse or validation error; nothing from the file was kept.
    Failed { error: String },
}
