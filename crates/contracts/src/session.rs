//! Session - one recorded chair session
//!
//! Samples arrive row-wise (collector, CSV rows) but every statistic works on
//! whole channels, so a session stores them column-wise.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Channel, ContractError, SessionId};

/// One reading of the chair sensor.
///
/// `values` is sparse: a channel that was not recorded is absent, which is
/// not the same as a zero reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock time of the reading (not guaranteed monotonic)
    pub timestamp: NaiveDateTime,
    pub values: BTreeMap<Channel, f64>,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, channel: Channel, value: f64) -> Self {
        self.values.insert(channel, value);
        self
    }
}

/// Recorded session, immutable once handed to analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: SessionId,
    /// Nominal sampling interval (seconds); configuration, not measured
    measurement_interval: f64,
    timestamps: Vec<NaiveDateTime>,
    columns: BTreeMap<Channel, Vec<f64>>,
}

/// All sessions of a dataset, ordered by id
pub type Corpus = BTreeMap<SessionId, Session>;

impl Session {
    /// Build a session from row-wise samples.
    ///
    /// # Errors
    /// `InconsistentChannels` when a sample's channel set differs from the
    /// first sample's.
    pub fn from_samples(
        id: SessionId,
        measurement_interval: f64,
        samples: &[Sample],
    ) -> Result<Self, ContractError> {
        let mut timestamps = Vec::with_capacity(samples.len());
        let mut columns: BTreeMap<Channel, Vec<f64>> = samples
            .first()
            .map(|first| {
                first
                    .values
                    .keys()
                    .map(|&c| (c, Vec::with_capacity(samples.len())))
                    .collect()
            })
            .unwrap_or_default();

        for (index, sample) in samples.iter().enumerate() {
            if sample.values.len() != columns.len()
                || !sample.values.keys().all(|c| columns.contains_key(c))
            {
                return Err(ContractError::InconsistentChannels {
                    session: id,
                    index,
                });
            }
            timestamps.push(sample.timestamp);
            for (channel, value) in &sample.values {
                if let Some(column) = columns.get_mut(channel) {
                    column.push(*value);
                }
            }
        }

        Ok(Self {
            id,
            measurement_interval,
            timestamps,
            columns,
        })
    }

    /// Build a session from already columnar data.
    ///
    /// # Errors
    /// `InconsistentChannels` when a column is shorter or longer than the
    /// timestamp column; `index` is the first row where they disagree.
    pub fn from_columns(
        id: SessionId,
        measurement_interval: f64,
        timestamps: Vec<NaiveDateTime>,
        columns: BTreeMap<Channel, Vec<f64>>,
    ) -> Result<Self, ContractError> {
        if let Some(len) = columns
            .values()
            .map(Vec::len)
            .find(|&len| len != timestamps.len())
        {
            return Err(ContractError::InconsistentChannels {
                session: id,
                index: len.min(timestamps.len()),
            });
        }
        Ok(Self {
            id,
            measurement_interval,
            timestamps,
            columns,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn measurement_interval(&self) -> f64 {
        self.measurement_interval
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Recorded channels in column order
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.columns.keys().copied()
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.columns.contains_key(&channel)
    }

    /// Column of one channel.
    ///
    /// # Errors
    /// `MissingChannel` if the channel was not recorded.
    pub fn channel(&self, channel: Channel) -> Result<&[f64], ContractError> {
        self.columns
            .get(&channel)
            .map(Vec::as_slice)
            .ok_or_else(|| ContractError::missing_channel(&self.id, channel))
    }

    pub fn columns(&self) -> &BTreeMap<Channel, Vec<f64>> {
        &self.columns
    }

    /// Row `index` as a sample
    pub fn sample(&self, index: usize) -> Option<Sample> {
        let timestamp = *self.timestamps.get(index)?;
        let values = self
            .columns
            .iter()
            .map(|(&c, column)| (c, column[index]))
            .collect();
        Some(Sample { timestamp, values })
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len()).filter_map(|i| self.sample(i))
    }

    /// Append another recording of the same session (multi-file sessions).
    ///
    /// # Errors
    /// `InconsistentChannels` if the channel sets differ; `index` is the
    /// position the first appended sample would have had.
    pub fn append(&mut self, other: Session) -> Result<(), ContractError> {
        if self.is_empty() && self.columns.is_empty() {
            self.timestamps = other.timestamps;
            self.columns = other.columns;
            return Ok(());
        }
        if !self.columns.keys().eq(other.columns.keys()) {
            return Err(ContractError::InconsistentChannels {
                session: self.id.clone(),
                index: self.len(),
            });
        }
        self.timestamps.extend(other.timestamps);
        for (channel, values) in other.columns {
            if let Some(column) = self.columns.get_mut(&channel) {
                column.extend(values);
            }
        }
        Ok(())
    }

    /// Copy of the session keeping only rows where `keep` is true
    pub fn filter_rows(&self, keep: &[bool]) -> Session {
        let pick = |column: &[f64]| -> Vec<f64> {
            column
                .iter()
                .zip(keep)
                .filter_map(|(v, &k)| k.then_some(*v))
                .collect()
        };
        Session {
            id: self.id.clone(),
            measurement_interval: self.measurement_interval,
            timestamps: self
                .timestamps
                .iter()
                .zip(keep)
                .filter_map(|(t, &k)| k.then_some(*t))
                .collect(),
            columns: self
                .columns
                .iter()
                .map(|(&c, column)| (c, pick(column)))
                .collect(),
        }
    }

    /// Copy of the session with every column transformed by `f`.
    ///
    /// `f` must return a column of the same length as its input.
    pub fn map_columns(&self, mut f: impl FnMut(Channel, &[f64]) -> Vec<f64>) -> Session {
        Session {
            id: self.id.clone(),
            measurement_interval: self.measurement_interval,
            timestamps: self.timestamps.clone(),
            columns: self
                .columns
                .iter()
                .map(|(&c, column)| {
                    let mapped = f(c, column);
                    debug_assert_eq!(
                        mapped.len(),
                        self.timestamps.len(),
                        "map_columns changed the length of {c}"
                    );
                    (c, mapped)
                })
                .collect(),
        }
    }
}
