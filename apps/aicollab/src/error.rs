use std::path::PathBuf;
use thiserror::Error;

/// A tool emitted something that is not a result record.
///
/// Raised, never swallowed at the producer boundary: every tool must emit the
/// standard shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("tool '{tool}': payload must be a JSON object, got {kind}")]
    NotAnObject { tool: String, kind: &'static str },

    #[error("tool '{tool}': missing 'summary' object")]
    MissingSummary { tool: String },

    #[error("tool '{tool}': summary is missing required field '{field}'")]
    MissingField { tool: String, field: &'static str },

    #[error("tool '{tool}': summary field '{field}' must be a non-negative integer, got {value}")]
    InvalidField {
        tool: String,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}
