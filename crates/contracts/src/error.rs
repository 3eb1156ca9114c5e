//! Layered error definitions
//!
//! Categorized by source: config / dataset / analysis / sink

use thiserror::Error;

use crate::{Channel, SessionId};

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Dataset Errors =====
    /// Recorded file could not be parsed
    #[error("dataset parse error in '{path}': {message}")]
    DatasetParse { path: String, message: String },

    /// A sample carries a different channel set than the rest of its session
    #[error("session '{session}': sample {index} has a different channel set than sample 0")]
    InconsistentChannels { session: SessionId, index: usize },

    // ===== Analysis Errors =====
    /// Requested channel is not recorded in the session
    #[error("session '{session}' has no channel '{channel}'")]
    MissingChannel { session: SessionId, channel: Channel },

    /// Input too short (or otherwise degenerate) for the requested statistic
    #[error("{operation}: degenerate input of length {len}: {reason}")]
    DegenerateInput {
        operation: &'static str,
        len: usize,
        reason: String,
    },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create dataset parse error
    pub fn dataset_parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DatasetParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create missing channel error
    pub fn missing_channel(session: &SessionId, channel: Channel) -> Self {
        Self::MissingChannel {
            session: session.clone(),
            channel,
        }
    }

    /// Create degenerate input error
    pub fn degenerate(operation: &'static str, len: usize, reason: impl Into<String>) -> Self {
        Self::DegenerateInput {
            operation,
            len,
            reason: reason.into(),
        }
    }

    /// Short label of the variant, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::DatasetParse { .. } => "dataset_parse",
            Self::InconsistentChannels { .. } => "inconsistent_channels",
            Self::MissingChannel { .. } => "missing_channel",
            Self::DegenerateInput { .. } => "degenerate_input",
            Self::SinkWrite { .. } => "sink_write",
            Self::SinkConnection { .. } => "sink_connection",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
