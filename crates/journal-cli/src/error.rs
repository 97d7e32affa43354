use std::io;
use std::path::PathBuf;

use journal_core::ErrorCategory;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] journal_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Entry ID cannot be empty")]
    EmptyEntryId,
    #[error("Entry not found for id/prefix: {0}")]
    EntryNotFound(String),
    #[error("{0}")]
    AmbiguousEntryId(String),
    #[error("Failed to read image {}: {source}", path.display())]
    ImageRead { path: PathBuf, source: io::Error },
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Category of the underlying core error, if there is one.
    pub const fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Core(error) => Some(error.category()),
            _ => None,
        }
    }
}
