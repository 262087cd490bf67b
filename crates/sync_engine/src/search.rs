//! Discretized offset search.

use std::time::Instant;

use contracts::{AlignError, OffsetScore, PoseStream, SearchResult, SyncCandidate, SyncSearchConfig};
use metrics::{counter, gauge, histogram};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::metric::{AlignmentMetric, CandidateScore};

/// Brute-force search over evenly spaced offset candidates
///
/// The admissible range starts where both streams begin together and ends
/// where they end together. Evaluation may run on the rayon pool, but the
/// winner is always picked in candidate order, so parallel and sequential
/// runs return the same result.
#[derive(Debug, Clone)]
pub struct SyncSearch {
    config: SyncSearchConfig,
}

/// Outcome of one candidate, before reduction
enum Outcome {
    Scored(CandidateScore),
    Skipped(&'static str),
    Failed(AlignError),
}

impl SyncSearch {
    pub fn new(config: SyncSearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncSearchConfig {
        &self.config
    }

    /// Offset grid for a stream pair, with its spacing.
    ///
    /// # Errors
    /// - `EmptyStream` if either stream has no samples
    /// - `Coverage` if the device recording outlasts the tracker recording
    pub fn candidates(
        &self,
        tracker: &PoseStream,
        device: &PoseStream,
    ) -> Result<(Vec<SyncCandidate>, f64), AlignError> {
        let (Some(tracker_first), Some(device_first)) =
            (tracker.first_timestamp(), device.first_timestamp())
        else {
            let empty = if tracker.is_empty() { tracker } else { device };
            return Err(AlignError::empty_stream(empty.name()));
        };

        let tracker_duration = tracker.duration();
        let device_duration = device.duration();
        if tracker_duration < device_duration {
            return Err(AlignError::Coverage {
                tracker_duration,
                device_duration,
            });
        }

        let base = tracker_first - device_first;
        let range = tracker_duration - device_duration;
        let count = self.config.num_candidates.max(1);
        let step = if count > 1 {
            range / (count - 1) as f64
        } else {
            0.0
        };

        let candidates = (0..count)
            .map(|index| {
                let offset = if count > 1 {
                    base + range * index as f64 / (count - 1) as f64
                } else {
                    base
                };
                SyncCandidate { index, offset }
            })
            .collect();
        Ok((candidates, step))
    }

    /// Find the best offset for `device` against `tracker`.
    ///
    /// Recoverable candidate failures and non-finite scores are skipped; the
    /// first non-recoverable failure in candidate order aborts the search.
    /// Ties go to the earliest candidate.
    #[instrument(
        name = "sync_search",
        skip(self, tracker, device, metric),
        fields(
            tracker = tracker.name(),
            device = device.name(),
            metric = %metric.kind(),
            candidates = self.config.num_candidates,
        )
    )]
    pub fn search(
        &self,
        tracker: &PoseStream,
        device: &PoseStream,
        metric: &dyn AlignmentMetric,
    ) -> Result<SearchResult, AlignError> {
        let started = Instant::now();
        let (candidates, step) = self.candidates(tracker, device)?;
        let evaluator = metric.prepare(tracker, device)?;

        let evaluate = |candidate: &SyncCandidate| match evaluator.evaluate(candidate.offset) {
            Ok(scored) if scored.score.is_finite() => Outcome::Scored(scored),
            Ok(_) => Outcome::Skipped("non_finite"),
            Err(err) if err.is_recoverable() => Outcome::Skipped(err.kind()),
            Err(err) => Outcome::Failed(err),
        };

        let outcomes: Vec<Outcome> = if self.config.parallel {
            candidates.par_iter().map(evaluate).collect()
        } else {
            candidates.iter().map(evaluate).collect()
        };
        counter!("vio_align_candidates_evaluated_total").increment(candidates.len() as u64);

        let polarity = metric.polarity();
        let mut best: Option<(usize, CandidateScore)> = None;
        let mut skipped = 0usize;
        let mut curve = self
            .config
            .keep_score_curve
            .then(|| Vec::with_capacity(candidates.len()));

        for (candidate, outcome) in candidates.iter().zip(outcomes) {
            let point = match outcome {
                Outcome::Failed(err) => return Err(err),
                Outcome::Skipped(reason) => {
                    skipped += 1;
                    counter!("vio_align_candidates_skipped_total", "reason" => reason)
                        .increment(1);
                    debug!(offset = candidate.offset, reason, "candidate skipped");
                    OffsetScore {
                        offset: candidate.offset,
                        score: None,
                        anchor_index: None,
                    }
                }
                Outcome::Scored(scored) => {
                    let point = OffsetScore {
                        offset: candidate.offset,
                        score: Some(scored.score),
                        anchor_index: scored.anchor_index,
                    };
                    let improves = best
                        .as_ref()
                        .is_none_or(|(_, incumbent)| polarity.is_better(scored.score, incumbent.score));
                    if improves {
                        best = Some((candidate.index, scored));
                    }
                    point
                }
            };
            if let Some(curve) = curve.as_mut() {
                curve.push(point);
            }
        }

        let Some((candidate_index, winner)) = best else {
            return Err(AlignError::NoValidCandidate {
                metric: metric.kind().to_string(),
                candidates: candidates.len(),
            });
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!("vio_align_search_duration_ms").record(elapsed_ms);
        gauge!("vio_align_best_score", "metric" => metric.kind().as_str()).set(winner.score);

        let result = SearchResult {
            metric: metric.kind(),
            offset: candidates[candidate_index].offset,
            score: winner.score,
            transform: winner.transform,
            anchor_index: winner.anchor_index,
            candidate_index,
            candidates: candidates.len(),
            step,
            skipped,
            score_curve: curve,
        };

        info!(
            offset = result.offset,
            score = result.score,
            skipped,
            elapsed_ms,
            "sync search finished"
        );
        Ok(result)
    }
}
