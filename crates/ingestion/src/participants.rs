//! 参与者问卷加载

use std::path::Path;

use contracts::{DatasetConfig, ParticipantRecord};
use tracing::{debug, instrument};

use crate::error::{IngestionError, Result};

pub const FIRST_NAME_COLUMN: &str = "First Name";
pub const LAST_NAME_COLUMN: &str = "Last Name";

/// 问卷中 "None" 与 "Small" 同义
const SKILL_ALIASES: [(&str, &str); 1] = [("None", "Small")];

/// Read the participants questionnaire.
///
/// `player_name` is `First Name + " " + Last Name`; the skill label comes
/// from `skill_column`. Header matching is exact (the questionnaire export
/// keeps a leading space on some headers).
///
/// # Errors
/// `Io`/`ParseFailed` for an unreadable file, `MissingColumn` when one of
/// the three columns is absent.
#[instrument(name = "participants_load", skip(path, skill_column), fields(path = %path.display()))]
pub fn load_participants(
    path: &Path,
    delimiter: char,
    skill_column: &str,
) -> Result<Vec<ParticipantRecord>> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| IngestionError::parse(path, format!("delimiter '{delimiter}' is not ASCII")))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| IngestionError::parse(path, e.to_string()))?;
    let headers = reader
        .headers()
        .map_err(|e| IngestionError::parse(path, e.to_string()))?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| IngestionError::MissingColumn {
                path: path.display().to_string(),
                column: name.to_string(),
            })
    };
    let first = column(FIRST_NAME_COLUMN)?;
    let last = column(LAST_NAME_COLUMN)?;
    let skill = column(skill_column)?;

    let mut participants = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestionError::parse(path, e.to_string()))?;
        let field = |i: usize| record.get(i).unwrap_or_default();
        participants.push(ParticipantRecord {
            name: format!("{} {}", field(first), field(last)),
            skill: normalize_skill(field(skill)),
        });
    }
    debug!(count = participants.len(), "participants loaded");
    Ok(participants)
}

/// [`load_participants`] with the dataset's configured path and columns.
///
/// Returns `Ok(None)` when no participants file is configured.
pub fn load_configured(dataset: &DatasetConfig) -> Result<Option<Vec<ParticipantRecord>>> {
    dataset
        .participants_path
        .as_deref()
        .map(|path| {
            load_participants(path, dataset.participants_delimiter, &dataset.skill_column)
        })
        .transpose()
}

fn normalize_skill(label: &str) -> String {
    let label = label.trim();
    SKILL_ALIASES
        .iter()
        .find(|(from, _)| *from == label)
        .map_or(label, |&(_, to)| to)
        .to_string()
}
