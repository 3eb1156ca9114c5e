//! Result records and the flat tables built from them
//!
//! One `StatsRecord` per session; a `ResultsTable` is the row-per-session view
//! used for export and for the join with the participants table.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::SessionId;

/// Name of the session key column in exported tables
pub const PLAYER_NAME_COLUMN: &str = "player_name";

/// Name of the label column appended by the participants join
pub const SKILL_COLUMN: &str = "Skill";

/// Presentation names of the truncated view, `(record key, display name)`
pub const TRUNCATED_COLUMNS: [(&str, &str); 4] = [
    ("mess_portion_acc", "Momentum"),
    ("mess_portion_mag", "Rotational movement"),
    ("lean_back_portion", "Lean back"),
    ("oscillation_acc", "Oscillation"),
];

/// Per-session statistics, metric name -> value.
///
/// Values may be NaN when an input channel carried NaN; they are kept as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub session: SessionId,
    pub metrics: BTreeMap<String, f64>,
}

impl StatsRecord {
    pub fn new(session: SessionId, metrics: BTreeMap<String, f64>) -> Self {
        Self { session, metrics }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }

    /// Presentation view: keeps the four headline metrics under their
    /// display names and drops everything else.
    pub fn truncated(&self) -> StatsRecord {
        let metrics = TRUNCATED_COLUMNS
            .iter()
            .filter_map(|(key, display)| self.get(key).map(|v| (display.to_string(), v)))
            .collect();
        StatsRecord::new(self.session.clone(), metrics)
    }
}

/// One row of the participants questionnaire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// `First Name` + " " + `Last Name`
    pub name: String,
    /// Categorical skill label (`None` is normalized to `Small` on load)
    pub skill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub session: SessionId,
    /// One value per table column, NaN where the record had no such metric
    pub values: Vec<f64>,
}

/// Row-per-session table over the union of all record keys (sorted)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsTable {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl ResultsTable {
    pub fn from_records(records: &[StatsRecord]) -> Self {
        let columns: Vec<String> = records
            .iter()
            .flat_map(|r| r.metrics.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let rows = records
            .iter()
            .map(|record| TableRow {
                session: record.session.clone(),
                values: columns
                    .iter()
                    .map(|c| record.get(c).unwrap_or(f64::NAN))
                    .collect(),
            })
            .collect();
        Self { columns, rows }
    }

    pub fn to_records(&self) -> Vec<StatsRecord> {
        self.rows
            .iter()
            .map(|row| {
                let metrics = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.values.iter().copied())
                    .collect();
                StatsRecord::new(row.session.clone(), metrics)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row.values[index]).collect())
    }

    /// Inner join on `participant.name == player_name`, attaching the skill
    /// label. Rows follow participant order (the participants table is the
    /// left side); a participant matching several rows yields one per match.
    pub fn inner_join(&self, participants: &[ParticipantRecord]) -> MergedTable {
        let rows = participants
            .iter()
            .flat_map(|p| {
                self.rows
                    .iter()
                    .filter(move |row| row.session == p.name)
                    .map(move |row| MergedRow {
                        session: row.session.clone(),
                        skill: p.skill.clone(),
                        values: row.values.clone(),
                    })
            })
            .collect();
        MergedTable {
            columns: self.columns.clone(),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub session: SessionId,
    pub skill: String,
    pub values: Vec<f64>,
}

/// Results joined with participant labels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedTable {
    /// Metric columns; exported after `player_name` and `Skill`
    pub columns: Vec<String>,
    pub rows: Vec<MergedRow>,
}

impl MergedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, pairs: &[(&str, f64)]) -> StatsRecord {
        StatsRecord::new(
            name.into(),
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        )
    }

    #[test]
    fn truncated_keeps_and_renames_headline_metrics() {
        let full = record(
            "p1",
            &[
                ("mess_portion_acc", 0.1),
                ("mess_portion_acc_x", 0.2),
                ("mess_portion_mag", 0.3),
                ("lean_back_portion", 0.4),
                ("oscillation_acc", 0.5),
                ("acc_x__nonstationary_portion", 0.6),
            ],
        );
        let view = full.truncated();
        let keys: Vec<&str> = view.metrics.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Lean back", "Momentum", "Oscillation", "Rotational movement"]);
        assert_eq!(view.get("Momentum"), Some(0.1));
        assert_eq!(view.get("Oscillation"), Some(0.5));
    }

    #[test]
    fn table_uses_union_of_keys() {
        let table = ResultsTable::from_records(&[
            record("a", &[("x", 1.0)]),
            record("b", &[("y", 2.0)]),
        ]);
        assert_eq!(table.columns, ["x", "y"]);
        assert_eq!(table.rows[0].values[0], 1.0);
        assert!(table.rows[0].values[1].is_nan());
        assert_eq!(table.column("y").unwrap()[1], 2.0);
    }

    #[test]
    fn inner_join_drops_unmatched_rows() {
        let table = ResultsTable::from_records(&[
            record("Anna Smirnova", &[("x", 1.0)]),
            record("Nobody", &[("x", 2.0)]),
        ]);
        let participants = vec![
            ParticipantRecord {
                name: "Ghost".into(),
                skill: "Small".into(),
            },
            ParticipantRecord {
                name: "Anna Smirnova".into(),
                skill: "Large".into(),
            },
        ];
        let merged = table.inner_join(&participants);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.rows[0].session, "Anna Smirnova");
        assert_eq!(merged.rows[0].skill, "Large");
        assert_eq!(merged.rows[0].values, vec![1.0]);
    }
}
