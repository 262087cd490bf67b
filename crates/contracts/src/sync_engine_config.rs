//! Sync search configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sync search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSearchConfig {
    /// Alignment quality metric
    #[serde(default)]
    pub metric: MetricKind,

    /// Number of evenly spaced offset candidates
    #[serde(default = "default_num_candidates")]
    pub num_candidates: usize,

    /// Anchor positions as fractions of the device stream
    #[serde(default = "default_anchor_fractions")]
    pub anchor_fractions: Vec<f64>,

    /// Target number of tracker test samples (turned into a stride)
    #[serde(default = "default_test_samples")]
    pub test_samples: usize,

    /// Evaluate candidates on the rayon pool
    #[serde(default)]
    pub parallel: bool,

    /// Keep the per-offset score curve in the result
    #[serde(default = "default_true")]
    pub keep_score_curve: bool,

    /// Subtract each stream's first timestamp before searching
    #[serde(default = "default_true")]
    pub shift_to_origin: bool,

    /// Remove the mean of angular-speed sequences before the cosine similarity
    #[serde(default)]
    pub center_speeds: bool,
}

fn default_num_candidates() -> usize {
    1000
}

fn default_anchor_fractions() -> Vec<f64> {
    vec![0.2, 0.4, 0.6, 0.8]
}

fn default_test_samples() -> usize {
    100
}

fn default_true() -> bool {
    true
}

impl Default for SyncSearchConfig {
    fn default() -> Self {
        Self {
            metric: MetricKind::default(),
            num_candidates: default_num_candidates(),
            anchor_fractions: default_anchor_fractions(),
            test_samples: default_test_samples(),
            parallel: false,
            keep_score_curve: true,
            shift_to_origin: true,
            center_speeds: false,
        }
    }
}

/// Metric used to score an offset candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    /// Mean position residual after anchor-based rigid alignment (meters)
    #[default]
    PositionError,
    /// Cosine similarity of angular-speed sequences
    RotationCorrelation,
    /// Variance of the relative orientation angle (degrees²)
    OrientationVariance,
}

impl MetricKind {
    pub fn polarity(self) -> ScorePolarity {
        match self {
            Self::PositionError | Self::OrientationVariance => ScorePolarity::LowerIsBetter,
            Self::RotationCorrelation => ScorePolarity::HigherIsBetter,
        }
    }

    /// Whether the metric recovers a rigid transform alongside the offset
    pub fn recovers_transform(self) -> bool {
        matches!(self, Self::PositionError)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PositionError => "position-error",
            Self::RotationCorrelation => "rotation-correlation",
            Self::OrientationVariance => "orientation-variance",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which direction of a score is better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorePolarity {
    LowerIsBetter,
    HigherIsBetter,
}

impl ScorePolarity {
    /// Strictly better; ties keep the incumbent
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::LowerIsBetter => candidate < incumbent,
            Self::HigherIsBetter => candidate > incumbent,
        }
    }
}
