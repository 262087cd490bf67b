//! Layered error definitions
//!
//! Categorized by source: input / geometry / search / config / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum AlignError {
    // ===== Input Errors =====
    /// Malformed pose record
    #[error("parse error in stream '{stream}' at line {line}: {message}")]
    Parse {
        stream: String,
        line: usize,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Pose field with an unexpected shape or non-finite values
    #[error("shape error in stream '{stream}' at sample {index}, field '{field}': {message}")]
    Shape {
        stream: String,
        index: usize,
        field: String,
        message: String,
    },

    /// Timestamps going backwards
    #[error(
        "timestamps of stream '{stream}' decrease at sample {index}: {previous} -> {current}"
    )]
    NonMonotonic {
        stream: String,
        index: usize,
        previous: f64,
        current: f64,
    },

    /// Zero-length stream
    #[error("stream '{stream}' is empty")]
    EmptyStream { stream: String },

    // ===== Geometry Errors =====
    /// Orientation required but not recorded for this sample
    #[error("stream '{stream}' has no orientation at sample {index}")]
    MissingOrientation { stream: String, index: usize },

    /// Degenerate pose used as anchor
    #[error("pose {index} of stream '{stream}' is not invertible")]
    SingularMatrix { stream: String, index: usize },

    // ===== Search Errors =====
    /// Device recording is longer than the tracker recording
    #[error(
        "tracker duration {tracker_duration}s does not cover device duration {device_duration}s"
    )]
    Coverage {
        tracker_duration: f64,
        device_duration: f64,
    },

    /// No tracker test sample falls inside the shifted device time span
    #[error("no overlapping test samples at offset {offset}s")]
    NoOverlap { offset: f64 },

    /// Every offset candidate had to be skipped
    #[error("metric '{metric}' produced no valid score over {candidates} candidates")]
    NoValidCandidate { metric: String, candidates: usize },

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

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    Sink { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AlignError {
    /// Create record parse error
    pub fn parse(stream: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            stream: stream.into(),
            line,
            message: message.into(),
            source: None,
        }
    }

    /// Create shape error
    pub fn shape(
        stream: impl Into<String>,
        index: usize,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Shape {
            stream: stream.into(),
            index,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create empty stream error
    pub fn empty_stream(stream: impl Into<String>) -> Self {
        Self::EmptyStream {
            stream: stream.into(),
        }
    }

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

    /// Create sink write error
    pub fn sink(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sink {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether a search may skip the candidate that produced this error.
    ///
    /// Only per-candidate numeric conditions qualify; input, coverage and
    /// configuration failures always abort.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SingularMatrix { .. } | Self::MissingOrientation { .. } | Self::NoOverlap { .. }
        )
    }

    /// Short label used as a metrics tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::Shape { .. } => "shape",
            Self::NonMonotonic { .. } => "non_monotonic",
            Self::EmptyStream { .. } => "empty_stream",
            Self::MissingOrientation { .. } => "missing_orientation",
            Self::SingularMatrix { .. } => "singular_matrix",
            Self::Coverage { .. } => "coverage",
            Self::NoOverlap { .. } => "no_overlap",
            Self::NoValidCandidate { .. } => "no_valid_candidate",
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::Sink { .. } => "sink",
            Self::Io(_) => "io",
        }
    }
}
