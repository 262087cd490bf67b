//! Pipeline orchestrator - loads recordings, aligns every device, dispatches reports.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use contracts::{AlignmentPlan, AlignmentReport, DeviceInput, PoseLayout, PoseStream};
use dispatcher::{create_dispatcher, DispatcherError};
use ingestion::PoseLog;
use observability::{record_report_metrics, AlignmentMetricsAggregator};
use sync_engine::AlignmentEngine;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, instrument};

use super::RunStats;
use crate::error::{CliError, Result};

/// Main pipeline orchestrator
pub struct Pipeline {
    plan: AlignmentPlan,
}

impl Pipeline {
    pub fn new(plan: AlignmentPlan) -> Self {
        Self { plan }
    }

    /// Align every device of the plan against its tracker.
    ///
    /// Devices run concurrently on the blocking pool. Reports are dispatched
    /// in input order once all devices have finished; a failed device is
    /// logged and the others are still reported.
    #[instrument(name = "pipeline_run", skip(self), fields(devices = self.plan.devices.len()))]
    pub async fn run(self) -> Result<RunStats> {
        let started = Instant::now();
        let plan = self.plan;

        let tracker_input = plan.tracker.clone();
        let tracker = tokio::task::spawn_blocking(move || {
            PoseLog::read(&tracker_input.path, "tracker", tracker_input.layout())
        })
        .await??
        .into_stream();
        let tracker = Arc::new(tracker);

        let (report_tx, report_rx) = mpsc::channel(plan.devices.len().max(1));
        let dispatcher = create_dispatcher(plan.report.as_ref(), report_rx)?.spawn();

        let engine = Arc::new(AlignmentEngine::new(plan.search.clone()));
        let mut tasks = JoinSet::new();
        for (index, device) in plan.devices.iter().cloned().enumerate() {
            let engine = Arc::clone(&engine);
            let tracker = Arc::clone(&tracker);
            tasks.spawn_blocking(move || (index, align_device(&engine, &tracker, &device)));
        }

        let mut outcomes: Vec<Option<Result<AlignmentReport>>> =
            (0..plan.devices.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined?;
            outcomes[index] = Some(outcome);
        }

        let mut aggregator = AlignmentMetricsAggregator::new();
        let mut failed = 0;
        for (device, outcome) in plan.devices.iter().zip(outcomes) {
            match outcome {
                Some(Ok(report)) => {
                    record_report_metrics(&report);
                    aggregator.update(&report);
                    report_tx
                        .send(report)
                        .await
                        .map_err(|_| DispatcherError::InputClosed {
                            device: device.name.clone(),
                        })?;
                }
                Some(Err(e)) => {
                    error!(device = %device.name, error = %e, "Device alignment failed");
                    failed += 1;
                }
                None => failed += 1,
            }
        }
        drop(report_tx);

        let sink_metrics = dispatcher.await?;
        let stats = RunStats {
            devices: plan.devices.len(),
            failed,
            duration: started.elapsed(),
            aggregator,
            sink_metrics,
        };

        if failed > 0 {
            stats.print_summary();
            return Err(CliError::DevicesFailed {
                failed,
                total: plan.devices.len(),
            });
        }
        Ok(stats)
    }
}

/// Read one device log, align it and export the result when requested.
#[instrument(name = "align_device", skip(engine, tracker, device), fields(device = %device.name))]
pub fn align_device(
    engine: &AlignmentEngine,
    tracker: &PoseStream,
    device: &DeviceInput,
) -> Result<AlignmentReport> {
    let log = PoseLog::read(&device.path, &device.name, device.layout())?;
    let alignment = engine
        .align(tracker, log.stream())
        .map_err(|e| CliError::alignment(&device.name, e))?;

    let output = match &device.output {
        Some(path) => {
            export(&log, &alignment.transformed, path)?;
            Some(path.display().to_string())
        }
        None => None,
    };

    info!(
        offset = alignment.result.offset,
        clock_offset = alignment.clock_offset,
        score = alignment.result.score,
        "Device aligned"
    );

    Ok(AlignmentReport {
        device: device.name.clone(),
        tracker: alignment.tracker,
        device_stream: alignment.device,
        result: alignment.result,
        clock_offset: alignment.clock_offset,
        output,
        elapsed_ms: alignment.elapsed_ms,
    })
}

fn export(log: &PoseLog, stream: &PoseStream, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ingestion::IngestionError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    log.write_file(stream, path)?;
    Ok(())
}

/// Read a log for summary purposes only.
pub(crate) fn read_stream(path: &Path, name: &str, layout: PoseLayout) -> Result<PoseStream> {
    Ok(PoseLog::read(path, name, layout)?.into_stream())
}
