//! # Dispatcher
//!
//! 批次分发与结果导出模块。
//!
//! 负责：
//! - 消费采集循环产生的 `ReadingBatch`
//! - Fan-out 到多个 sinks，每个 sink 独立队列，慢 sink 只丢弃自己的批次
//! - 将分析结果写成 CSV / JSON 表
//!
//! ## Usage Example
//!
//! ```ignore
//! use dispatcher::create_dispatcher;
//! use tokio::sync::mpsc;
//!
//! let (tx, rx) = mpsc::channel(4);
//! let dispatcher = create_dispatcher(blueprint.sinks.clone(), rx).await?;
//! let handle = dispatcher.spawn();
//! collector.run(tx).await?;
//! let report = handle.await?;
//! ```

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;
pub mod table;

pub use contracts::{BatchSink, ReadingBatch};
pub use dispatcher::{
    create_dispatcher, DispatchReport, Dispatcher, DispatcherBuilder, DispatcherConfig,
};
pub use error::{DispatcherError, Result};
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{
    FileSink, FileSinkConfig, LogSink, NetworkSink, NetworkSinkConfig, ReadingRecord,
};
pub use table::{
    read_results_csv, write_merged_csv, write_participants_csv, write_results_csv,
    write_results_json, MERGED_FILE, PARTICIPANTS_FILE, STATIONARITY_FILE,
};
