//! Run statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::AlignmentMetricsAggregator;

/// Statistics from one `align` run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Devices named by the plan
    pub devices: usize,

    /// Devices that could not be aligned
    pub failed: usize,

    /// Wall time of the whole run
    pub duration: Duration,

    /// Per-device result aggregation
    pub aggregator: AlignmentMetricsAggregator,

    /// Per-sink delivery counts
    pub sink_metrics: Vec<(String, MetricsSnapshot)>,
}

impl RunStats {
    pub fn aligned(&self) -> usize {
        self.devices - self.failed
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!();
        println!("=== Alignment Run ===");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Devices: {} aligned, {} failed", self.aligned(), self.failed);
        println!();
        print!("{}", self.aggregator.summary());

        if !self.sink_metrics.is_empty() {
            println!();
            println!("Sinks:");
            for (name, snapshot) in &self.sink_metrics {
                println!(
                    "  {}: {} written, {} failed",
                    name, snapshot.write_count, snapshot.failure_count
                );
            }
        }
        println!();
    }
}
