//! Ingestion 错误类型

use contracts::ContractError;
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 目录或文件无法访问
    #[error("cannot read '{path}': {source}")]
    Io {
        /// 出错的路径
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV 结构错误 (缺少时间列、数值无法解析等)
    #[error("failed to parse '{path}': {message}")]
    ParseFailed {
        /// 文件路径
        path: String,
        /// 错误消息
        message: String,
    },

    /// 参与者问卷缺少必需列
    #[error("participants file '{path}' has no column '{column}'")]
    MissingColumn {
        /// 文件路径
        path: String,
        /// 缺失的列名
        column: String,
    },

    /// 传感器读取失败
    #[error("sensor {sensor} read failed: {source}")]
    SensorRead {
        /// 传感器名称
        sensor: String,
        #[source]
        source: ContractError,
    },

    /// 批次通道已关闭
    #[error("batch channel closed after {batches} batches")]
    ChannelClosed {
        /// 已发送的批次数
        batches: u64,
    },

    /// 数据模型约束失败 (通道集合不一致等)
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl IngestionError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub(crate) fn parse(path: impl AsRef<std::path::Path>, message: impl Into<String>) -> Self {
        Self::ParseFailed {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }
}

impl From<IngestionError> for ContractError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::Contract(e) => e,
            IngestionError::Io { source, .. } => ContractError::Io(source),
            IngestionError::ParseFailed { path, message } => {
                ContractError::dataset_parse(path, message)
            }
            other => ContractError::Other(other.to_string()),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
