use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by dataset extraction.
///
/// Malformed lines, unrecognized records and unmatched tool events are
/// absorbed where they occur and never show up here.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to open log file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Projects directory does not exist: {0:?}")]
    MissingDir(PathBuf),

    #[error("Failed to write dataset row: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to serialize dataset row: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
