//! Error types for the record stores.

use std::path::PathBuf;

/// Errors that can occur while reading or persisting records.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The backing file could not be read or written.
    #[error("record file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but is not a valid record table.
    #[error("record file is corrupt: {0}")]
    Decode(#[from] serde_json::Error),
}
