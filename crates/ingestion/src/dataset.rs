//! 数据集加载
//!
//! 目录布局: `data_path/<session 目录>/<prefix>_<date>_<time>.csv`。
//! 同一目录下前缀相同的文件按文件名顺序拼接为一个 session；
//! 读取失败的文件记录并跳过，不影响其余文件。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use contracts::{AnalysisConfig, Channel, Corpus, DatasetConfig, Session, SessionId};
use metrics::counter;
use stats_engine::{scale_raw_counts, ScaleCoefficients};
use tracing::{debug, info, instrument, warn};

use crate::error::{IngestionError, Result};

/// Accepted names of the timestamp column
pub const TIME_COLUMNS: [&str; 4] = ["time", "datetime_now", "timestamp", "datetime"];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A file that could not be loaded
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of loading a dataset directory
#[derive(Debug, Default)]
pub struct LoadedCorpus {
    pub corpus: Corpus,
    pub skipped: Vec<SkippedFile>,
}

/// Loads chair sessions from a dataset directory.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    data_path: PathBuf,
    prefix: String,
    measurement_interval: f64,
    scale: Option<ScaleCoefficients>,
}

impl DatasetLoader {
    pub fn new(dataset: &DatasetConfig, analysis: &AnalysisConfig) -> Self {
        Self {
            data_path: dataset.data_path.clone(),
            prefix: dataset.chair_file_prefix.clone(),
            measurement_interval: analysis.measurement_interval,
            scale: dataset.raw_counts.then_some(ScaleCoefficients::MPU9250),
        }
    }

    /// Override the count scaling (None keeps raw values)
    pub fn with_scale(mut self, scale: Option<ScaleCoefficients>) -> Self {
        self.scale = scale;
        self
    }

    /// Load every session folder under `data_path`, ordered by session id.
    ///
    /// Folders without a chair file are ignored.
    ///
    /// # Errors
    /// `Io` if `data_path` itself cannot be listed.
    #[instrument(name = "dataset_load", skip(self), fields(path = %self.data_path.display()))]
    pub fn load(&self) -> Result<LoadedCorpus> {
        let mut loaded = LoadedCorpus::default();
        for folder in sorted_entries(&self.data_path)? {
            if !folder.is_dir() {
                continue;
            }
            match self.load_folder(&folder, &mut loaded.skipped) {
                Ok(Some(session)) => {
                    loaded.corpus.insert(session.id().clone(), session);
                }
                Ok(None) => debug!(folder = %folder.display(), "no chair files"),
                Err(e) => {
                    warn!(folder = %folder.display(), error = %e, "folder skipped");
                    loaded.skipped.push(SkippedFile {
                        path: folder.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            sessions = loaded.corpus.len(),
            skipped = loaded.skipped.len(),
            "dataset loaded"
        );
        Ok(loaded)
    }

    /// Concatenate the chair files of one folder.
    ///
    /// Unreadable files, and files whose channel set differs from the first
    /// loaded file, are appended to `skipped`.
    ///
    /// # Errors
    /// `Io` if the folder cannot be listed.
    pub fn load_folder(
        &self,
        folder: &Path,
        skipped: &mut Vec<SkippedFile>,
    ) -> Result<Option<Session>> {
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = SessionId::from_folder_name(&name);

        let mut session: Option<Session> = None;
        for file in sorted_entries(folder)? {
            if file_prefix(&file).as_deref() != Some(self.prefix.as_str()) {
                continue;
            }
            let part = match read_chair_csv(&file, id.clone(), self.measurement_interval) {
                Ok(part) => part,
                Err(e) => {
                    skip(skipped, &file, &e);
                    continue;
                }
            };
            match session.as_mut() {
                None => session = Some(part),
                Some(s) => {
                    if let Err(e) = s.append(part) {
                        skip(skipped, &file, &e);
                    }
                }
            }
        }

        Ok(match (session, &self.scale) {
            (Some(s), Some(scale)) => Some(scale_raw_counts(&s, scale)),
            (s, _) => s,
        })
    }
}

fn skip(skipped: &mut Vec<SkippedFile>, file: &Path, error: &dyn std::fmt::Display) {
    warn!(file = %file.display(), error = %error, "file skipped");
    counter!("chair_stats_files_skipped_total").increment(1);
    skipped.push(SkippedFile {
        path: file.to_path_buf(),
        reason: error.to_string(),
    });
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| IngestionError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| IngestionError::io(dir, e))?;
    entries.sort();
    Ok(entries)
}

/// File stem up to the first `_`
fn file_prefix(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    Some(name.split('_').next().unwrap_or(name).to_string())
}

/// Parse an ISO-8601 timestamp, with `T` or space, optional fraction and
/// optional UTC offset (converted to UTC, offset dropped).
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z"))
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// Read one recorded chair CSV into a session.
///
/// Recognized channel headers become columns; other columns (pandas index,
/// unnamed columns) are ignored. Empty cells read as NaN.
///
/// # Errors
/// `ParseFailed` without a timestamp column, a channel column, or on an
/// unparsable cell.
pub fn read_chair_csv(path: &Path, id: SessionId, measurement_interval: f64) -> Result<Session> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| IngestionError::parse(path, e.to_string()))?;
    let headers = reader
        .headers()
        .map_err(|e| IngestionError::parse(path, e.to_string()))?
        .clone();

    let time_index = headers
        .iter()
        .position(|h| TIME_COLUMNS.iter().any(|t| h.eq_ignore_ascii_case(t)))
        .ok_or_else(|| IngestionError::parse(path, "no timestamp column"))?;
    let channel_indices: Vec<(usize, Channel)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| Channel::from_header(h).map(|c| (i, c)))
        .collect();
    if channel_indices.is_empty() {
        return Err(IngestionError::parse(path, "no sensor channel columns"));
    }

    let mut timestamps = Vec::new();
    let mut columns: BTreeMap<Channel, Vec<f64>> =
        channel_indices.iter().map(|&(_, c)| (c, Vec::new())).collect();

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| IngestionError::parse(path, e.to_string()))?;
        let line = row + 2;
        let raw_time = record.get(time_index).unwrap_or_default();
        let timestamp = parse_timestamp(raw_time).ok_or_else(|| {
            IngestionError::parse(path, format!("line {line}: bad timestamp '{raw_time}'"))
        })?;
        timestamps.push(timestamp);

        for &(index, channel) in &channel_indices {
            let cell = record.get(index).unwrap_or_default();
            let value = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>().map_err(|_| {
                    IngestionError::parse(
                        path,
                        format!("line {line}: bad {channel} value '{cell}'"),
                    )
                })?
            };
            if let Some(column) = columns.get_mut(&channel) {
                column.push(value);
            }
        }
    }

    Ok(Session::from_columns(id, measurement_interval, timestamps, columns)?)
}
