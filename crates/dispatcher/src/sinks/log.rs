//! LogSink - logs report summary via tracing

use contracts::{AlignError, AlignmentReport, ResultSink};
use tracing::{info, instrument};

/// Sink that logs one line per alignment report
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_report_summary(&self, report: &AlignmentReport) {
        let result = &report.result;
        let translation = result.transform.map(|t| t.translation());

        info!(
            sink = %self.name,
            device = %report.device,
            metric = %result.metric,
            offset = result.offset,
            clock_offset = report.clock_offset,
            score = result.score,
            candidates = result.candidates,
            skipped = result.skipped,
            translation = ?translation.map(|t| [t.x, t.y, t.z]),
            output = report.output.as_deref().unwrap_or("-"),
            "Alignment report"
        );
    }
}

impl ResultSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, report),
        fields(sink = %self.name, device = %report.device)
    )]
    fn write(&mut self, report: &AlignmentReport) -> Result<(), AlignError> {
        self.log_report_summary(report);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), AlignError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), AlignError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
