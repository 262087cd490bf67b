//! Line-delimited JSON pose logs.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use contracts::{PoseLayout, PoseStream};
use metrics::counter;
use tracing::{debug, info, instrument};

use crate::error::{IngestionError, Result};
use crate::record::{self, Location, Record};

/// A loaded pose log
///
/// Keeps the raw records next to the decoded stream so a transformed stream
/// can be written back with every non-pose field intact.
#[derive(Debug, Clone)]
pub struct PoseLog {
    name: String,
    layout: PoseLayout,
    stream: PoseStream,
    records: Vec<Record>,
}

impl PoseLog {
    /// Load and validate a pose log file.
    ///
    /// Fails on the first malformed record; blank lines are ignored.
    #[instrument(name = "pose_log_read", skip(path, layout), fields(file = %path.as_ref().display()))]
    pub fn read(path: impl AsRef<Path>, name: &str, layout: PoseLayout) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| IngestionError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let log = Self::from_reader(BufReader::new(file), name, layout).map_err(|err| match err {
            IngestionError::Read { source, .. } => IngestionError::Read {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        info!(
            stream = name,
            samples = log.stream.len(),
            duration = log.stream.duration(),
            "pose log loaded"
        );
        Ok(log)
    }

    /// Parse a pose log from any buffered reader.
    pub fn from_reader(reader: impl BufRead, name: &str, layout: PoseLayout) -> Result<Self> {
        let mut records = Vec::new();
        let mut samples = Vec::new();

        for (line_index, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| IngestionError::Read {
                path: name.into(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let at = Location {
                stream: name,
                line: line_index + 1,
                index: samples.len(),
            };
            let parsed = record::parse_line(&line, at)?;
            samples.push(record::decode(&parsed, &layout, at)?);
            records.push(parsed);
        }

        let stream = PoseStream::new(name, samples)?;
        counter!("vio_align_records_loaded_total", "stream" => name.to_string())
            .increment(records.len() as u64);
        debug!(stream = name, records = records.len(), "records decoded");

        Ok(Self {
            name: name.to_string(),
            layout,
            stream,
            records,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &PoseLayout {
        &self.layout
    }

    pub fn stream(&self) -> &PoseStream {
        &self.stream
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_stream(self) -> PoseStream {
        self.stream
    }

    /// Re-encode `stream` into this log's records.
    ///
    /// Everything is encoded before any byte is written, so a bad sample
    /// never leaves a truncated output behind.
    fn encode_stream(&self, stream: &PoseStream) -> Result<Vec<Record>> {
        if stream.len() != self.records.len() {
            return Err(IngestionError::LengthMismatch {
                stream: stream.name().to_string(),
                samples: stream.len(),
                records: self.records.len(),
            });
        }
        self.records
            .iter()
            .zip(stream.iter())
            .enumerate()
            .map(|(index, (template, sample))| {
                record::encode(template, &sample, &self.layout, stream.name(), index)
                    .map_err(IngestionError::from)
            })
            .collect()
    }

    /// Write `stream` using this log's records as templates.
    ///
    /// `stream` must have one sample per record, in record order.
    pub fn write_stream(&self, stream: &PoseStream, writer: impl Write) -> Result<usize> {
        let encoded = self.encode_stream(stream)?;
        write_records(&encoded, writer).map_err(|source| IngestionError::Write {
            path: self.name.clone().into(),
            source,
        })
    }

    /// Write `stream` to a file, see [`PoseLog::write_stream`].
    #[instrument(name = "pose_log_write", skip(self, stream, path), fields(file = %path.as_ref().display()))]
    pub fn write_file(&self, stream: &PoseStream, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let encoded = self.encode_stream(stream)?;

        let write_error = |source| IngestionError::Write {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(write_error)?;
        let written = write_records(&encoded, file).map_err(write_error)?;

        counter!("vio_align_records_written_total", "stream" => self.name.clone())
            .increment(written as u64);
        info!(stream = %self.name, records = written, "pose log written");
        Ok(written)
    }
}

fn write_records(records: &[Record], writer: impl Write) -> std::io::Result<usize> {
    let mut writer = BufWriter::new(writer);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(records.len())
}
