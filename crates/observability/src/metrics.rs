//! 对齐结果指标收集模块
//!
//! 基于 `AlignmentReport` 收集和统计一次运行中各设备的对齐指标。

use std::collections::BTreeMap;

use contracts::AlignmentReport;
use metrics::{counter, gauge, histogram};

/// 从 AlignmentReport 记录指标
///
/// 每个设备完成对齐后调用一次。
pub fn record_report_metrics(report: &AlignmentReport) {
    let device = report.device.clone();
    let result = &report.result;

    counter!("vio_align_reports_total", "metric" => result.metric.as_str()).increment(1);

    gauge!("vio_align_offset_seconds", "device" => device.clone()).set(result.offset);
    gauge!("vio_align_clock_offset_seconds", "device" => device.clone()).set(report.clock_offset);
    gauge!("vio_align_score", "device" => device.clone()).set(result.score);

    if result.skipped > 0 {
        counter!("vio_align_report_skipped_candidates_total", "device" => device)
            .increment(result.skipped as u64);
    }

    histogram!("vio_align_alignment_duration_ms").record(report.elapsed_ms);
}

/// 对齐指标聚合器
///
/// 在内存中聚合指标，便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct AlignmentMetricsAggregator {
    /// 已对齐的设备数
    pub total_alignments: u64,

    /// 恢复出刚体变换的设备数
    pub transforms_recovered: u64,

    /// 评估过的候选总数
    pub total_candidates: u64,

    /// 被跳过的候选总数
    pub total_skipped: u64,

    /// 同步偏移统计（秒）
    pub offset_stats: RunningStats,

    /// 单设备耗时统计（毫秒）
    pub elapsed_stats: RunningStats,

    /// 各度量的得分统计
    pub score_stats: BTreeMap<String, RunningStats>,

    /// 各设备的时钟偏移
    pub device_offsets: BTreeMap<String, f64>,
}

impl AlignmentMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, report: &AlignmentReport) {
        let result = &report.result;

        self.total_alignments += 1;
        if result.transform.is_some() {
            self.transforms_recovered += 1;
        }
        self.total_candidates += result.candidates as u64;
        self.total_skipped += result.skipped as u64;

        self.offset_stats.push(result.offset);
        self.elapsed_stats.push(report.elapsed_ms);
        self.score_stats
            .entry(result.metric.as_str().to_string())
            .or_default()
            .push(result.score);
        self.device_offsets
            .insert(report.device.clone(), report.clock_offset);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_alignments: self.total_alignments,
            transforms_recovered: self.transforms_recovered,
            total_candidates: self.total_candidates,
            total_skipped: self.total_skipped,
            skip_rate: if self.total_candidates > 0 {
                self.total_skipped as f64 / self.total_candidates as f64 * 100.0
            } else {
                0.0
            },
            offset_s: StatsSummary::from(&self.offset_stats),
            elapsed_ms: StatsSummary::from(&self.elapsed_stats),
            scores: self
                .score_stats
                .iter()
                .map(|(metric, stats)| (metric.clone(), StatsSummary::from(stats)))
                .collect(),
            device_offsets: self.device_offsets.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_alignments: u64,
    pub transforms_recovered: u64,
    pub total_candidates: u64,
    pub total_skipped: u64,
    pub skip_rate: f64,
    pub offset_s: StatsSummary,
    pub elapsed_ms: StatsSummary,
    pub scores: BTreeMap<String, StatsSummary>,
    pub device_offsets: BTreeMap<String, f64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Alignment Summary ===")?;
        writeln!(f, "Devices aligned: {}", self.total_alignments)?;
        writeln!(f, "Transforms recovered: {}", self.transforms_recovered)?;
        writeln!(
            f,
            "Skipped candidates: {} of {} ({:.2}%)",
            self.total_skipped, self.total_candidates, self.skip_rate
        )?;
        writeln!(f, "Sync offset (s): {}", self.offset_s)?;
        writeln!(f, "Elapsed (ms): {}", self.elapsed_ms)?;

        for (metric, stats) in &self.scores {
            writeln!(f, "Score [{}]: {}", metric, stats)?;
        }

        if !self.device_offsets.is_empty() {
            writeln!(f, "Clock offsets:")?;
            for (device, offset) in &self.device_offsets {
                writeln!(f, "  {}: {:+.4} s", device, offset)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.4}, max={:.4}, mean={:.4}, std={:.4} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
