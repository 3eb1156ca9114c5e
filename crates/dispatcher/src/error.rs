//! Dispatcher error types

use std::path::PathBuf;

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Queue full - batch dropped
    #[error("queue full for sink '{sink_name}', batch {batch_id} dropped")]
    QueueFull { sink_name: String, batch_id: u64 },

    /// Results table could not be written or read back
    #[error("table '{path}': {message}")]
    Table { path: PathBuf, message: String },

    /// Sink write error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn table(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Table {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<DispatcherError> for contracts::ContractError {
    fn from(err: DispatcherError) -> Self {
        match err {
            DispatcherError::Contract(e) => e,
            DispatcherError::Io(e) => Self::Io(e),
            other => Self::Other(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatcherError>;
