//! Error taxonomy for the dispatch layer.

use thiserror::Error;

/// Any fault raised by the store collaborator, carrying its original message.
#[derive(Debug, Clone, Error)]
#[error("store failure: {message}")]
pub struct StoreFailure {
    pub message: String,
}

impl StoreFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for StoreFailure {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

/// Why a dispatched call failed.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The operation name is not in the registry.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    /// A required argument was absent, null, or blank.
    #[error("missing required argument '{argument}' for {operation}")]
    MissingArgument {
        operation: &'static str,
        argument: String,
    },
    /// Arguments were present but did not fit the operation's schema.
    #[error("invalid arguments for {operation}: {reason}")]
    InvalidArgument {
        operation: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Store(#[from] StoreFailure),
    /// A handler panicked or could not serialize its result.
    #[error("{operation} failed: {reason}")]
    Internal {
        operation: &'static str,
        reason: String,
    },
}

pub type DispatchResult<T> = Result<T, DispatchError>;
