//! ReadingBatch - Collector output
//!
//! The unit handed to sinks: every sample captured during one send period.

use serde::{Deserialize, Serialize};

use crate::{ContractError, Sample, Session, SessionId};

/// One collected batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingBatch {
    /// Sequence number within the run (starts at 0)
    pub batch_id: u64,

    /// Free-form run label
    pub label: String,

    pub meta: String,

    /// Participant identifier, used as the session folder by file sinks
    pub person_id: String,

    /// Samples in capture order
    pub samples: Vec<Sample>,
}

impl ReadingBatch {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// View the batch as a session, e.g. for on-line diagnostics.
    ///
    /// # Errors
    /// `InconsistentChannels` if samples carry different channel sets.
    pub fn to_session(&self, measurement_interval: f64) -> Result<Session, ContractError> {
        let id = if self.person_id.is_empty() {
            SessionId::from(format!("batch-{}", self.batch_id))
        } else {
            SessionId::from_folder_name(&self.person_id)
        };
        Session::from_samples(id, measurement_interval, &self.samples)
    }
}
