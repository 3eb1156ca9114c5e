//! # Ingestion
//!
//! Chair sensor data ingestion module.
//!
//! Responsibilities:
//! - Load recorded sessions from the dataset directory (`DatasetLoader`)
//! - Load the participants questionnaire
//! - Sample a `ChairSensor` periodically and cut the stream into
//!   `ReadingBatch`es for the dispatcher (`CollectorLoop`)
//!
//! ## Usage Example (Dataset)
//!
//! ```ignore
//! use ingestion::{load_configured, DatasetLoader};
//!
//! let loaded = DatasetLoader::new(&blueprint.dataset, &blueprint.analysis).load()?;
//! for skipped in &loaded.skipped {
//!     eprintln!("skipped {}: {}", skipped.path.display(), skipped.reason);
//! }
//! let participants = load_configured(&blueprint.dataset)?;
//! ```
//!
//! ## Usage Example (Collection)
//!
//! ```ignore
//! use ingestion::{CollectorLoop, SimulatedChair};
//! use tokio::sync::mpsc;
//!
//! let (tx, mut rx) = mpsc::channel(4);
//! let collector = CollectorLoop::new(SimulatedChair::seeded(42), blueprint.collector.clone());
//! tokio::spawn(collector.run(tx));
//! while let Some(batch) = rx.recv().await {
//!     dispatcher.dispatch(batch);
//! }
//! ```

mod collector;
mod config;
mod dataset;
mod error;
mod participants;
mod simulated;

// Re-exports
pub use collector::{CollectorLoop, CollectorSummary, ReadingCollector};
pub use config::{CollectorMetrics, MetricsSnapshot};
pub use contracts::{ChairSensor, ReadingBatch};
pub use dataset::{
    parse_timestamp, read_chair_csv, DatasetLoader, LoadedCorpus, SkippedFile, TIME_COLUMNS,
};
pub use error::{IngestionError, Result};
pub use participants::{load_configured, load_participants, FIRST_NAME_COLUMN, LAST_NAME_COLUMN};
pub use simulated::{SimulatedChair, SimulatedChairConfig};
