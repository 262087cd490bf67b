//! SinkHandle - one sink behind its own bounded queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use contracts::{AlignmentReport, ResultSink};

use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;

type ReportQueue = mpsc::Receiver<Arc<AlignmentReport>>;

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<Arc<AlignmentReport>>,
    metrics: Arc<SinkMetrics>,
    worker: JoinHandle<()>,
}

impl SinkHandle {
    /// Move `sink` onto a worker task fed by a queue of `queue_capacity` reports
    pub fn spawn<S: ResultSink + 'static>(sink: S, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let worker = SinkWorker::new(sink);
        let name = worker.name.clone();
        let metrics = Arc::clone(&worker.metrics);

        Self {
            name,
            tx,
            metrics,
            worker: tokio::spawn(worker.run(rx)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a report, waiting while the queue is full.
    ///
    /// A slow sink slows the dispatcher down; reports are never dropped.
    pub async fn send(&self, report: Arc<AlignmentReport>) -> Result<(), DispatcherError> {
        self.tx
            .send(report)
            .await
            .map_err(|_| DispatcherError::WorkerGone {
                sink: self.name.clone(),
            })?;
        self.metrics
            .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
        Ok(())
    }

    /// Close the queue and wait until the worker has flushed and closed its sink
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        let Self {
            name, tx, worker, ..
        } = self;
        drop(tx);
        if let Err(e) = worker.await {
            error!(sink = %name, error = ?e, "Sink worker panicked");
        }
        debug!(sink = %name, "Sink stopped");
    }
}

/// Owns the sink on the worker side
struct SinkWorker<S> {
    sink: S,
    name: String,
    metrics: Arc<SinkMetrics>,
}

impl<S: ResultSink> SinkWorker<S> {
    fn new(sink: S) -> Self {
        Self {
            name: sink.name().to_string(),
            sink,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    #[instrument(name = "sink_worker", skip(self, rx), fields(sink = %self.name))]
    async fn run(mut self, mut rx: ReportQueue) {
        while let Some(report) = rx.recv().await {
            self.metrics.set_queue_len(rx.len());
            self.deliver(&report);
        }
        self.finish();
    }

    /// A failed write is counted and logged; the worker keeps going.
    fn deliver(&mut self, report: &AlignmentReport) {
        match self.sink.write(report) {
            Ok(()) => self.metrics.record_write(&self.name),
            Err(e) => {
                self.metrics.record_failure(&self.name);
                error!(device = %report.device, error = %e, "Report write failed");
            }
        }
    }

    fn finish(mut self) {
        if let Err(e) = self.sink.flush() {
            self.metrics.record_failure(&self.name);
            error!(error = %e, "Flush failed on shutdown");
        }
        if let Err(e) = self.sink.close() {
            error!(error = %e, "Close failed on shutdown");
        }
    }
}
