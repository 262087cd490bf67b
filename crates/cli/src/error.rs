//! Error types for CLI operations.

use std::path::PathBuf;

use contracts::AlignError;
use dispatcher::DispatcherError;
use ingestion::IngestionError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Neither a config file nor enough flags to build a plan
    #[error("Missing input: {message}")]
    MissingInput { message: String },

    /// Pose log could not be read or written
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    /// Search or transform failed for one device
    #[error("Alignment of '{device}' failed: {source}")]
    Alignment {
        device: String,
        #[source]
        source: AlignError,
    },

    /// Configuration or contract error
    #[error(transparent)]
    Contract(#[from] AlignError),

    /// Report dispatch error
    #[error(transparent)]
    Dispatch(#[from] DispatcherError),

    /// Some devices could not be aligned
    #[error("{failed} of {total} devices failed to align")]
    DevicesFailed { failed: usize, total: usize },

    /// Background task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn missing_input(message: impl Into<String>) -> Self {
        Self::MissingInput {
            message: message.into(),
        }
    }

    pub fn alignment(device: impl Into<String>, source: AlignError) -> Self {
        Self::Alignment {
            device: device.into(),
            source,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
