//! 结果表导出
//!
//! Results, merged and participants tables are written as CSV with
//! `player_name` as first column. NaN is written as an empty cell, like
//! the analysis notebooks expect, and read back as NaN.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use contracts::{
    MergedTable, ParticipantRecord, ResultsTable, SessionId, StatsRecord, TableRow,
    PLAYER_NAME_COLUMN, SKILL_COLUMN,
};
use tracing::{debug, instrument};

use crate::error::{DispatcherError, Result};

/// Default file names in the output directory
pub const STATIONARITY_FILE: &str = "df_nonstationary_values_portion.csv";
pub const PARTICIPANTS_FILE: &str = "df_players.csv";
pub const MERGED_FILE: &str = "df_merged.csv";

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        // Display 为最短可精确回读的表示
        value.to_string()
    }
}

fn parse_value(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        Some(f64::NAN)
    } else {
        cell.parse().ok()
    }
}

fn create_writer(path: &Path) -> Result<csv::Writer<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    csv::Writer::from_path(path).map_err(|e| DispatcherError::table(path, e))
}

fn write_rows<'a>(
    path: &Path,
    header: Vec<&str>,
    rows: impl Iterator<Item = (Vec<&'a str>, &'a [f64])>,
) -> Result<usize> {
    let mut writer = create_writer(path)?;
    writer
        .write_record(&header)
        .map_err(|e| DispatcherError::table(path, e))?;

    let mut count = 0;
    for (keys, values) in rows {
        let record = keys
            .into_iter()
            .map(str::to_string)
            .chain(values.iter().map(|v| format_value(*v)));
        writer
            .write_record(record)
            .map_err(|e| DispatcherError::table(path, e))?;
        count += 1;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = count, "Table written");
    Ok(count)
}

/// Write a results table: `player_name`, then one column per metric.
#[instrument(name = "table_write_results", skip_all, fields(path = %path.display()))]
pub fn write_results_csv(path: &Path, table: &ResultsTable) -> Result<usize> {
    let header = std::iter::once(PLAYER_NAME_COLUMN)
        .chain(table.columns.iter().map(String::as_str))
        .collect();
    let rows = table
        .rows
        .iter()
        .map(|row| (vec![row.session.as_str()], row.values.as_slice()));
    write_rows(path, header, rows)
}

/// Read a table written by [`write_results_csv`].
///
/// # Errors
/// `Table` when the first column is not `player_name`, a row has the wrong
/// length or a cell is not a number.
#[instrument(name = "table_read_results", skip_all, fields(path = %path.display()))]
pub fn read_results_csv(path: &Path) -> Result<ResultsTable> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| DispatcherError::table(path, e))?;
    let headers = reader
        .headers()
        .map_err(|e| DispatcherError::table(path, e))?
        .clone();

    if headers.get(0) != Some(PLAYER_NAME_COLUMN) {
        return Err(DispatcherError::table(
            path,
            format!("first column must be '{}'", PLAYER_NAME_COLUMN),
        ));
    }
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DispatcherError::table(path, e))?;
        let session = SessionId::from(record.get(0).unwrap_or_default().to_string());
        let values = record
            .iter()
            .skip(1)
            .map(|cell| {
                parse_value(cell).ok_or_else(|| {
                    DispatcherError::table(
                        path,
                        format!("line {}: invalid number '{}'", line + 2, cell),
                    )
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(TableRow { session, values });
    }

    Ok(ResultsTable { columns, rows })
}

/// Write a merged table: `player_name`, `Skill`, then the metric columns.
#[instrument(name = "table_write_merged", skip_all, fields(path = %path.display()))]
pub fn write_merged_csv(path: &Path, table: &MergedTable) -> Result<usize> {
    let header = [PLAYER_NAME_COLUMN, SKILL_COLUMN]
        .into_iter()
        .chain(table.columns.iter().map(String::as_str))
        .collect();
    let rows = table.rows.iter().map(|row| {
        (
            vec![row.session.as_str(), row.skill.as_str()],
            row.values.as_slice(),
        )
    });
    write_rows(path, header, rows)
}

/// Write the cleaned participants table: `player_name`, `Skill`.
#[instrument(name = "table_write_participants", skip_all, fields(path = %path.display()))]
pub fn write_participants_csv(path: &Path, participants: &[ParticipantRecord]) -> Result<usize> {
    let rows = participants
        .iter()
        .map(|p| (vec![p.name.as_str(), p.skill.as_str()], &[][..]));
    write_rows(path, vec![PLAYER_NAME_COLUMN, SKILL_COLUMN], rows)
}

/// Write records as pretty JSON (non-finite values become `null`).
#[instrument(name = "table_write_json", skip_all, fields(path = %path.display()))]
pub fn write_results_json(path: &Path, records: &[StatsRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, records).map_err(|e| DispatcherError::table(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn record(name: &str, pairs: &[(&str, f64)]) -> StatsRecord {
        StatsRecord::new(
            name.into(),
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn table() -> ResultsTable {
        ResultsTable::from_records(&[
            record("Ann Smith", &[("lean_back_portion", 0.1), ("mess_portion_acc", 1.0 / 3.0)]),
            record("Bob Stone", &[("lean_back_portion", f64::NAN), ("mess_portion_acc", 2e-7)]),
        ])
    }

    #[test]
    fn test_results_csv_reads_back_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join(STATIONARITY_FILE);
        let table = table();

        assert_eq!(write_results_csv(&path, &table).unwrap(), 2);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("player_name,lean_back_portion,mess_portion_acc\n"));
        assert!(text.contains("Bob Stone,,"));

        let back = read_results_csv(&path).unwrap();
        assert_eq!(back.columns, table.columns);
        assert_eq!(back.rows[0], table.rows[0]);
        assert!(back.rows[1].values[0].is_nan());
        assert_eq!(back.rows[1].values[1], 2e-7);
    }

    #[test]
    fn test_merged_csv_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MERGED_FILE);
        let participants = vec![
            ParticipantRecord {
                name: "Bob Stone".to_string(),
                skill: "High".to_string(),
            },
            ParticipantRecord {
                name: "Eve Moss".to_string(),
                skill: "Small".to_string(),
            },
        ];
        let merged = table().inner_join(&participants);

        assert_eq!(write_merged_csv(&path, &merged).unwrap(), 1);
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "player_name,Skill,lean_back_portion,mess_portion_acc");
        assert_eq!(lines[1], "Bob Stone,High,,0.0000002");
    }

    #[test]
    fn test_participants_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(PARTICIPANTS_FILE);
        let participants = vec![ParticipantRecord {
            name: "Ann Smith".to_string(),
            skill: "Small".to_string(),
        }];
        write_participants_csv(&path, &participants).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "player_name,Skill\nAnn Smith,Small\n"
        );
    }

    #[test]
    fn test_read_rejects_foreign_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.csv");
        fs::write(&path, "name,value\nAnn,1\n").unwrap();
        assert!(matches!(
            read_results_csv(&path),
            Err(DispatcherError::Table { .. })
        ));

        fs::write(&path, "player_name,value\nAnn,abc\n").unwrap();
        let err = read_results_csv(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_json_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        write_results_json(&path, &table().to_records()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["session"], "Ann Smith");
        assert!(value[1]["metrics"]["lean_back_portion"].is_null());
    }
}
