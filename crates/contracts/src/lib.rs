//! # Contracts
//!
//! Frozen interface contracts, defining inter-crate data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Timestamps are seconds (f64) on each recording's own clock
//! - A sync offset is added to device timestamps to express them on the tracker clock

mod blueprint;
mod error;
mod pose;
mod sink;
mod sync;
mod sync_engine_config;
mod transform;

pub use blueprint::*;
pub use error::*;
pub use pose::*;
pub use sink::*;
pub use sync::*;
pub use sync_engine_config::*;
pub use transform::*;
