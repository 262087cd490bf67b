//! Ingestion 错误类型

use std::path::PathBuf;

use contracts::AlignError;
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 无法打开输入文件
    #[error("failed to open pose log {path}: {source}")]
    Open {
        /// 文件路径
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 读取中途失败
    #[error("failed to read pose log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 写出失败
    #[error("failed to write pose log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 输出流与原始记录数量不一致
    #[error("stream '{stream}' has {samples} samples but the log holds {records} records")]
    LengthMismatch {
        stream: String,
        samples: usize,
        records: usize,
    },

    /// 记录内容错误（解析 / 形状 / 时间戳）
    #[error(transparent)]
    Record(#[from] AlignError),
}

impl IngestionError {
    /// Record-level error, if this is one
    pub fn as_record(&self) -> Option<&AlignError> {
        match self {
            Self::Record(err) => Some(err),
            _ => None,
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
