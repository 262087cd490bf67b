//! ReportFileSink - writes every report of a run into one JSON document

use contracts::{AlignError, AlignmentReport, ResultSink};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// On-disk report layout
#[derive(Serialize)]
struct ReportDocument<'a> {
    generated_at: String,
    reports: &'a [AlignmentReport],
}

/// Sink that collects reports and rewrites its JSON file on flush
pub struct ReportFileSink {
    name: String,
    path: PathBuf,
    reports: Vec<AlignmentReport>,
    dirty: bool,
}

impl ReportFileSink {
    /// Create a new ReportFileSink, creating the parent directory if needed
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        Ok(Self {
            name: name.into(),
            path,
            reports: Vec::new(),
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_document(&self) -> std::io::Result<()> {
        let document = ReportDocument {
            generated_at: chrono::Utc::now().to_rfc3339(),
            reports: &self.reports,
        };
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, &document)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    fn persist(&mut self) -> Result<(), AlignError> {
        if !self.dirty {
            return Ok(());
        }
        self.write_document().map_err(|e| {
            error!(sink = %self.name, path = %self.path.display(), error = %e, "Write failed");
            AlignError::sink(&self.name, e.to_string())
        })?;
        self.dirty = false;
        Ok(())
    }
}

impl ResultSink for ReportFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "report_file_sink_write",
        skip(self, report),
        fields(sink = %self.name, device = %report.device)
    )]
    fn write(&mut self, report: &AlignmentReport) -> Result<(), AlignError> {
        self.reports.push(report.clone());
        self.dirty = true;
        Ok(())
    }

    #[instrument(name = "report_file_sink_flush", skip(self))]
    fn flush(&mut self) -> Result<(), AlignError> {
        self.persist()
    }

    #[instrument(name = "report_file_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), AlignError> {
        self.persist()?;
        debug!(sink = %self.name, reports = self.reports.len(), "ReportFileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_report;
    use tempfile::tempdir;

    #[test]
    fn test_report_file_sink_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        let mut sink = ReportFileSink::new("report", &path).unwrap();
        sink.write(&sample_report("phone")).unwrap();
        sink.write(&sample_report("glasses")).unwrap();
        assert!(!path.exists(), "nothing is written before flush");

        sink.close().unwrap();

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(document["generated_at"].is_string());
        let reports = document["reports"].as_array().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1]["device"], "glasses");
        assert_eq!(reports[0]["result"]["metric"], "position-error");
    }

    #[test]
    fn test_unwritable_path_is_sink_error() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened as the report file
        let mut sink = ReportFileSink::new("report", dir.path()).unwrap();
        sink.write(&sample_report("phone")).unwrap();

        match sink.flush() {
            Err(AlignError::Sink { sink_name, .. }) => assert_eq!(sink_name, "report"),
            other => panic!("expected sink error, got {other:?}"),
        }
    }
}
