//! Alignment run orchestration.

mod orchestrator;
mod stats;

pub(crate) use orchestrator::read_stream;
pub use orchestrator::Pipeline;
pub use stats::RunStats;
