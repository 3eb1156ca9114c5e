//! Sink implementations
//!
//! LogSink (monitoring), FileSink (dataset CSV layout), NetworkSink (HTTP JSON upload).

mod file;
mod log;
mod network;

pub use self::file::{FileSink, FileSinkConfig, TIME_FORMAT, UNLABELED_FOLDER};
pub use self::log::{BatchSummary, LogSink};
pub use self::network::{NetworkSink, NetworkSinkConfig, ReadingRecord};
