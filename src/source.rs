//! Where version content comes from.

pub mod memory;
pub mod store;

pub use memory::MemorySource;
pub use store::{BlobStore, HistoryEntry};

use std::io;
use thiserror::Error;

/// Opaque identifier of one version of a file
pub type VersionId = String;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Version {version} not found for {file}")]
    VersionNotFound { file: String, version: VersionId },
}

/// Supplies the version list and content of files
pub trait VersionSource: Send + Sync {
    /// Version identifiers of a file, oldest first
    fn versions(&self, file: &str) -> Result<Vec<VersionId>, SourceError>;

    /// Raw content of one version; `None` when the file does not exist at
    /// that version
    fn content(&self, file: &str, version: &str) -> Result<Option<Vec<u8>>, SourceError>;
}
