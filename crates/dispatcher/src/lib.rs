//! # Dispatcher
//!
//! 对齐结果分发模块。
//!
//! 负责：
//! - 消费 `AlignmentReport`
//! - Fan-out 到多个 sinks（日志、JSON 报告文件）
//! - 隔离失败的 sink，不影响其他 sink

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{AlignmentReport, ResultSink};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{LogSink, ReportFileSink};
