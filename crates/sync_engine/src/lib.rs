//! # Sync Engine
//!
//! 设备轨迹与追踪器轨迹的时间同步与刚体配准。
//!
//! 负责：
//! - 时间索引映射（单调扫描）
//! - 离散时间偏移搜索（可选 rayon 并行，结果与顺序执行一致）
//! - 锚点刚体变换估计与残差评估
//! - 输出对齐后的设备轨迹
//!
//! ## 使用示例
//!
//! ```ignore
//! use sync_engine::{AlignmentEngine, SyncSearchConfig};
//!
//! let engine = AlignmentEngine::new(SyncSearchConfig::default());
//! let alignment = engine.align(&tracker, &device)?;
//! println!("offset {:.3}s", alignment.clock_offset);
//! ```

mod engine;
mod evaluator;
mod index_map;
pub mod metric;
mod rigid;
mod rotation;
mod search;
mod transformer;

#[cfg(test)]
mod synthetic;

pub use engine::{Alignment, AlignmentEngine};
pub use evaluator::AlignmentEvaluator;
pub use index_map::{build_index_map, map_single_index};
pub use metric::{
    metric_for, AlignmentMetric, CandidateEvaluator, CandidateScore, OrientationVarianceMetric,
    PositionErrorMetric, RotationCorrelationMetric,
};
pub use rigid::{RigidTransformEstimator, SingularPose};
pub use rotation::{angle_between_rotations, angular_speeds, cosine_similarity};
pub use search::SyncSearch;
pub use transformer::TrajectoryTransformer;

// Re-export contracts types
pub use contracts::{
    AlignError, IndexMap, MetricKind, PoseStream, RigidTransform, ScorePolarity, SearchResult,
    SyncSearchConfig,
};
