//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// A sink could not be opened
    #[error("failed to create sink '{name}'")]
    SinkCreation {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Dispatcher input closed before the report was handed over
    #[error("dispatcher input closed, report for '{device}' not delivered")]
    InputClosed { device: String },

    /// A sink worker stopped while reports were still being queued
    #[error("worker of sink '{sink}' is gone")]
    WorkerGone { sink: String },
}

impl DispatcherError {
    pub fn sink_creation(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::SinkCreation {
            name: name.into(),
            source,
        }
    }
}
