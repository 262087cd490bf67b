//! Alignment metrics.
//!
//! A metric turns a (tracker, device) pair into a [`CandidateEvaluator`]
//! once, then scores every offset candidate through it. Preparation holds
//! the per-pair work that does not depend on the offset (anchor selection,
//! angular speeds), so the candidate loop only pays for what varies.
//!
//! | Metric | Score | Polarity | Transform |
//! |--------|-------|----------|-----------|
//! | `position-error` | mean position residual (m) | lower | yes |
//! | `rotation-correlation` | cosine similarity of angular speeds | higher | no |
//! | `orientation-variance` | variance of relative orientation angle (deg²) | lower | no |

mod orientation;
mod position;
mod rotation;

pub use orientation::OrientationVarianceMetric;
pub use position::PositionErrorMetric;
pub use rotation::RotationCorrelationMetric;

use contracts::{AlignError, MetricKind, PoseStream, RigidTransform, ScorePolarity, SyncSearchConfig};

/// Score of one offset candidate
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub score: f64,
    pub transform: Option<RigidTransform>,
    /// Tracker anchor index behind `transform`
    pub anchor_index: Option<usize>,
}

impl CandidateScore {
    /// Score without an associated transform
    pub fn bare(score: f64) -> Self {
        Self {
            score,
            transform: None,
            anchor_index: None,
        }
    }
}

/// Offset scorer bound to one stream pair
///
/// Must be callable from several rayon workers at once.
pub trait CandidateEvaluator: Sync {
    /// Score a single offset (seconds added to device timestamps).
    ///
    /// Recoverable errors (see [`AlignError::is_recoverable`]) make the
    /// search skip this candidate; anything else aborts it.
    fn evaluate(&self, offset: f64) -> Result<CandidateScore, AlignError>;
}

/// Strategy for scoring offset hypotheses
pub trait AlignmentMetric: Send + Sync {
    fn kind(&self) -> MetricKind;

    fn polarity(&self) -> ScorePolarity {
        self.kind().polarity()
    }

    /// Bind the metric to a stream pair.
    ///
    /// # Errors
    /// Input conditions that make every candidate unscorable (empty streams,
    /// missing orientation for orientation based metrics).
    fn prepare<'a>(
        &self,
        tracker: &'a PoseStream,
        device: &'a PoseStream,
    ) -> Result<Box<dyn CandidateEvaluator + 'a>, AlignError>;
}

/// Metric selected by the search configuration
pub fn metric_for(config: &SyncSearchConfig) -> Box<dyn AlignmentMetric> {
    match config.metric {
        MetricKind::PositionError => Box::new(PositionErrorMetric::new(
            config.anchor_fractions.clone(),
            config.test_samples,
        )),
        MetricKind::RotationCorrelation => {
            Box::new(RotationCorrelationMetric::new(config.center_speeds))
        }
        MetricKind::OrientationVariance => Box::new(OrientationVarianceMetric),
    }
}
