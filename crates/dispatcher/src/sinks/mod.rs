//! Sink implementations
//!
//! Contains LogSink and ReportFileSink.

mod file;
mod log;

pub use self::file::ReportFileSink;
pub use self::log::LogSink;
