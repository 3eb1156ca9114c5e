//! # Contracts
//!
//! Frozen data model shared by every crate of the chair statistics workspace.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Model
//! - A `Session` is one recording, stored column-wise (`Channel -> Vec<f64>`)
//! - Timestamps are wall-clock `NaiveDateTime`, not guaranteed monotonic
//! - A `StatsRecord` is produced once per session and never mutated

mod analysis_config;
mod batch;
mod blueprint;
mod chair_sensor;
mod channel;
mod error;
mod record;
mod session;
mod session_id;
mod sink;

pub use analysis_config::*;
pub use batch::ReadingBatch;
pub use blueprint::*;
pub use chair_sensor::ChairSensor;
pub use channel::{Axis, Channel, SensorFamily};
pub use error::*;
pub use record::*;
pub use session::{Corpus, Sample, Session};
pub use session_id::SessionId;
pub use sink::*;
