//! AlignmentPlan - Config Loader output
//!
//! Describes one evaluation run: the tracker recording, the device
//! recordings to align against it, search settings and report routing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::SyncSearchConfig;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentPlan {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Ground-truth recording
    pub tracker: StreamInput,

    /// Recordings under evaluation
    pub devices: Vec<DeviceInput>,

    /// Search settings shared by all devices
    #[serde(default)]
    pub search: SyncSearchConfig,

    /// JSON report destination
    #[serde(default)]
    pub report: Option<ReportConfig>,
}

/// Input file with an optional named pose field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInput {
    /// Line-delimited JSON file
    pub path: PathBuf,

    /// Key of a 3×4 pose matrix; top-level `position`/`rotation` when absent
    #[serde(default)]
    pub pose_field: Option<String>,
}

/// Device recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInput {
    /// Unique name (used in logs and reports)
    pub name: String,

    /// Line-delimited JSON file
    pub path: PathBuf,

    /// Key of a 3×4 pose matrix; top-level `position`/`rotation` when absent
    #[serde(default)]
    pub pose_field: Option<String>,

    /// Where to write the transformed trajectory (compute-only when absent)
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// Report routing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// JSON report file
    pub path: PathBuf,

    /// Also log each report through tracing
    #[serde(default = "default_log")]
    pub log: bool,
}

fn default_log() -> bool {
    true
}

/// Where a stream keeps its pose inside each record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseLayout {
    /// `position {x,y,z}` plus optional `rotation {col0,col1,col2}`
    #[default]
    TopLevel,
    /// 3×4 matrix under the given key
    Named(String),
}

impl PoseLayout {
    pub fn from_field(field: Option<&str>) -> Self {
        match field {
            Some(name) => Self::Named(name.to_string()),
            None => Self::TopLevel,
        }
    }
}

impl StreamInput {
    pub fn layout(&self) -> PoseLayout {
        PoseLayout::from_field(self.pose_field.as_deref())
    }
}

impl DeviceInput {
    pub fn layout(&self) -> PoseLayout {
        PoseLayout::from_field(self.pose_field.as_deref())
    }
}
