//! ResultSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{AlignError, AlignmentReport};

/// Report output trait
///
/// All sink implementations must implement this trait.
pub trait ResultSink: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one alignment report
    ///
    /// # Errors
    /// Returns write error (should include context)
    fn write(&mut self, report: &AlignmentReport) -> Result<(), AlignError>;

    /// Flush buffer (if any)
    fn flush(&mut self) -> Result<(), AlignError>;

    /// Close sink
    fn close(&mut self) -> Result<(), AlignError>;
}

impl<T: ResultSink + ?Sized> ResultSink for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write(&mut self, report: &AlignmentReport) -> Result<(), AlignError> {
        (**self).write(report)
    }

    fn flush(&mut self) -> Result<(), AlignError> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), AlignError> {
        (**self).close()
    }
}
