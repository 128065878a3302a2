//! Error types for workmem-core
//!
//! Every error returned from the activity logging path is safe to ignore.
//! Callers treat logging as fire-and-forget instrumentation.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the workmem-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Activity directory could not be created
    #[error("failed to create activity dir {path:?}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Event could not be serialized (indicates a defect in event construction)
    #[error("failed to serialize event: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Stream file could not be opened or written
    #[error("failed to write stream file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stream line is JSON but matches neither the current nor the legacy schema
    #[error("unrecognised activity record: {0}")]
    UnrecognisedRecord(String),

    /// Session id cannot name a stream file under the activity directory
    #[error("invalid session id {0:?}")]
    InvalidSessionId(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for workmem-core
pub type Result<T> = std::result::Result<T, Error>;
