//! Dispatcher - main loop for fan-out to sinks

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use contracts::{AlignmentReport, ReportConfig};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{LogSink, ReportFileSink};

const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Log every report through tracing
    pub log: bool,
    /// JSON report destination
    pub report_path: Option<PathBuf>,
    /// Per-sink queue capacity
    pub queue_capacity: usize,
}

impl DispatcherConfig {
    /// Sinks for a plan's report section; logging only when there is none
    pub fn from_report(report: Option<&ReportConfig>) -> Self {
        Self {
            log: report.is_none_or(|r| r.log),
            report_path: report.map(|r| r.path.clone()),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from_report(None)
    }
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<AlignmentReport>,
}

impl DispatcherBuilder {
    /// Create a new DispatcherBuilder
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<AlignmentReport>) -> Self {
        Self { config, input_rx }
    }

    /// Build and start the dispatcher
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub fn build(self) -> Result<Dispatcher, DispatcherError> {
        let handles = Self::initialize_handles(&self.config)?;

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
        })
    }

    fn initialize_handles(config: &DispatcherConfig) -> Result<Vec<SinkHandle>, DispatcherError> {
        let mut handles = Vec::with_capacity(2);
        if config.log {
            handles.push(SinkHandle::spawn(LogSink::new("log"), config.queue_capacity));
        }
        if let Some(path) = &config.report_path {
            let sink = ReportFileSink::new("report_file", path)
                .map_err(|e| DispatcherError::sink_creation("report_file", e))?;
            handles.push(SinkHandle::spawn(sink, config.queue_capacity));
        }
        Ok(handles)
    }
}

/// The main Dispatcher that fans out reports to sinks
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<AlignmentReport>,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles (for testing)
    pub fn with_handles(
        handles: Vec<SinkHandle>,
        input_rx: mpsc::Receiver<AlignmentReport>,
    ) -> Self {
        Self { handles, input_rx }
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run the dispatcher main loop
    ///
    /// Consumes reports from input and fans out to all sinks.
    /// Returns per-sink metrics once the input channel is closed and every
    /// sink has flushed.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> Vec<(String, MetricsSnapshot)> {
        info!(sinks = self.handles.len(), "Dispatcher started");

        let mut report_count: u64 = 0;
        while let Some(report) = self.input_rx.recv().await {
            report_count += 1;
            self.dispatch_report(Arc::new(report)).await;
        }

        info!(
            reports = report_count,
            "Dispatcher input closed, shutting down"
        );

        let metrics: Vec<_> = self
            .handles
            .iter()
            .map(|h| (h.name().to_string(), Arc::clone(h.metrics())))
            .collect();
        Self::shutdown_handles(self.handles).await;

        info!("Dispatcher shutdown complete");
        metrics
            .into_iter()
            .map(|(name, m)| (name, m.snapshot()))
            .collect()
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<Vec<(String, MetricsSnapshot)>> {
        tokio::spawn(self.run())
    }

    async fn dispatch_report(&self, report: Arc<AlignmentReport>) {
        for handle in &self.handles {
            if let Err(e) = handle.send(Arc::clone(&report)).await {
                warn!(device = %report.device, error = %e, "Report not delivered");
            }
        }
    }

    async fn shutdown_handles(handles: Vec<SinkHandle>) {
        for handle in handles {
            handle.shutdown().await;
        }
    }
}

/// Convenience function to create a dispatcher for a plan's report section
#[instrument(name = "dispatcher_create", skip(report, input_rx))]
pub fn create_dispatcher(
    report: Option<&ReportConfig>,
    input_rx: mpsc::Receiver<AlignmentReport>,
) -> Result<Dispatcher, DispatcherError> {
    DispatcherBuilder::new(DispatcherConfig::from_report(report), input_rx).build()
}
