//! # Ingestion
//!
//! Pose log loading and export.
//!
//! Responsibilities:
//! - Read line-delimited JSON pose logs into `PoseStream` (fail fast)
//! - Support top-level `position`/`rotation` records and named 3×4 pose fields
//! - Write transformed streams back, passing non-pose fields through
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::PoseLog;
//! use contracts::PoseLayout;
//!
//! let tracker = PoseLog::read("tracker.jsonl", "tracker", PoseLayout::TopLevel)?;
//! let device = PoseLog::read("vio.jsonl", "vio", PoseLayout::Named("VIO_pose".into()))?;
//!
//! // ... align ...
//! device.write_file(&aligned, "vio.aligned.jsonl")?;
//! ```

mod error;
mod log;
mod record;

// Re-exports
pub use contracts::{PoseLayout, PoseStream};
pub use error::{IngestionError, Result};
pub use log::PoseLog;
pub use record::Record;
