use std::io;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Coarse classification of a [`StoreError`], for callers that want to branch
/// on the failure without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    IoFailure,
    Cancelled,
    InvalidKey,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No content stored under '{0}'")]
    NotFound(String),

    #[error("I/O error on '{name}'")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Key '{0}' resolves outside of the storage root")]
    OutsideRoot(String),
}

impl StoreError {
    /// Wraps an I/O error raised while working on `name`, keeping "not found"
    /// distinguishable from other environment failures.
    pub fn io(name: &str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
            _ => StoreError::Io { name: name.to_string(), source },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Io { .. } => ErrorKind::IoFailure,
            StoreError::Cancelled => ErrorKind::Cancelled,
            StoreError::InvalidKey(_) | StoreError::OutsideRoot(_) => ErrorKind::InvalidKey,
        }
    }
}
