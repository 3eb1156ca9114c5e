//! Error types for CLI operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse or validation error
    #[error("Invalid configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// Dataset or participants loading error
    #[error("Failed to load dataset: {0}")]
    Ingestion(#[from] ingestion::IngestionError),

    /// Sink creation or table export error
    #[error("Output failed: {0}")]
    Dispatcher(#[from] dispatcher::DispatcherError),

    /// No session could be loaded
    #[error("No sessions found under {path}")]
    EmptyCorpus { path: PathBuf },

    /// Collection run error
    #[error("Collection failed: {message}")]
    Collection { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.to_path_buf(),
        }
    }

    pub fn collection(message: impl Into<String>) -> Self {
        Self::Collection {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
