//! FileSink - writes every batch as one CSV in the dataset layout
//!
//! ```text
//! <base_path>/<person_id>/<prefix>_<date>_<time>_<batch_id>.csv
//! ```
//!
//! The files are read back by the dataset loader: one folder per session,
//! files sorted by name, `time` column plus one column per channel.

use chrono::NaiveDateTime;
use contracts::{BatchSink, Channel, ContractError, ReadingBatch};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Folder used when a batch has neither person id nor label
pub const UNLABELED_FOLDER: &str = "unlabeled";

/// Timestamp format of the `time` column
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Dataset root
    pub base_path: PathBuf,
    /// File name prefix, the dataset loader only reads files with its prefix
    pub prefix: String,
}

impl FileSinkConfig {
    /// Create config from params map (`base_path`, `prefix`)
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));
        let prefix = params
            .get("prefix")
            .cloned()
            .unwrap_or_else(|| "schairlog".to_string());

        Self { base_path, prefix }
    }
}

/// Sink that writes batches to CSV files
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    created_dirs: HashSet<PathBuf>,
    written: Vec<PathBuf>,
}

impl FileSink {
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            created_dirs: HashSet::new(),
            written: Vec::new(),
        })
    }

    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    /// Files written so far, in write order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// 会话目录名：person_id，其次 label
    pub fn session_folder(batch: &ReadingBatch) -> String {
        let raw = [batch.person_id.as_str(), batch.label.as_str()]
            .into_iter()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(UNLABELED_FOLDER);
        raw.replace(['/', '\\'], "_")
    }

    /// File name of a batch starting at `start`; zero-padded id keeps
    /// batches of the same second in order.
    pub fn file_name(prefix: &str, start: NaiveDateTime, batch_id: u64) -> String {
        format!(
            "{}_{}_{:06}.csv",
            prefix,
            start.format("%Y-%m-%d_%H-%M-%S"),
            batch_id
        )
    }

    fn ensure_dir(&mut self, dir: &Path) -> std::io::Result<()> {
        if !self.created_dirs.contains(dir) {
            fs::create_dir_all(dir)?;
            self.created_dirs.insert(dir.to_path_buf());
        }
        Ok(())
    }

    fn write_batch_to_disk(&mut self, batch: &ReadingBatch) -> std::io::Result<Option<PathBuf>> {
        let Some(first) = batch.samples.first() else {
            return Ok(None);
        };

        let dir = self.config.base_path.join(Self::session_folder(batch));
        self.ensure_dir(&dir)?;
        let path = dir.join(Self::file_name(
            &self.config.prefix,
            first.timestamp,
            batch.batch_id,
        ));

        // 表头取批次内出现过的所有通道，缺失值留空
        let channels: Vec<Channel> = Channel::ALL
            .into_iter()
            .filter(|c| batch.samples.iter().any(|s| s.values.contains_key(c)))
            .collect();

        let mut writer = csv::Writer::from_path(&path).map_err(std::io::Error::other)?;
        let header = std::iter::once("time").chain(channels.iter().map(|c| c.name()));
        writer.write_record(header).map_err(std::io::Error::other)?;

        for sample in &batch.samples {
            let mut row = Vec::with_capacity(channels.len() + 1);
            row.push(sample.timestamp.format(TIME_FORMAT).to_string());
            for channel in &channels {
                row.push(
                    sample
                        .values
                        .get(channel)
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                );
            }
            writer.write_record(&row).map_err(std::io::Error::other)?;
        }
        writer.flush()?;

        Ok(Some(path))
    }

    fn persist_batch(&mut self, batch: &ReadingBatch) -> Result<(), ContractError> {
        match self.write_batch_to_disk(batch) {
            Ok(Some(path)) => {
                debug!(
                    sink = %self.name,
                    path = %path.display(),
                    samples = batch.len(),
                    "Batch written"
                );
                self.written.push(path);
                Ok(())
            }
            Ok(None) => {
                debug!(sink = %self.name, batch_id = batch.batch_id, "Empty batch skipped");
                Ok(())
            }
            Err(e) => {
                error!(sink = %self.name, batch_id = batch.batch_id, error = %e, "Write failed");
                Err(ContractError::sink_write(&self.name, e.to_string()))
            }
        }
    }
}

impl BatchSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, batch),
        fields(sink = %self.name, batch_id = batch.batch_id)
    )]
    async fn write(&mut self, batch: &ReadingBatch) -> Result<(), ContractError> {
        self.persist_batch(batch)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // 每个批次写完即关闭文件
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, files = self.written.len(), "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use contracts::Sample;
    use tempfile::tempdir;

    fn batch(batch_id: u64, person_id: &str, n: usize) -> ReadingBatch {
        let t0 = NaiveDate::from_ymd_opt(2019, 3, 14)
            .unwrap()
            .and_hms_opt(12, 30, 5)
            .unwrap();
        let samples = (0..n)
            .map(|i| {
                let mut sample = Sample::new(t0 + TimeDelta::milliseconds(10 * i as i64));
                for (k, channel) in Channel::ALL.into_iter().enumerate() {
                    sample = sample.with(channel, k as f64 + 0.25 * i as f64);
                }
                sample
            })
            .collect();
        ReadingBatch {
            batch_id,
            label: "run".to_string(),
            meta: String::new(),
            person_id: person_id.to_string(),
            samples,
        }
    }

    #[tokio::test]
    async fn test_file_sink_write() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            base_path: dir.path().to_path_buf(),
            prefix: "schairlog".to_string(),
        };

        let mut sink = FileSink::new("test_file", config).unwrap();
        sink.write(&batch(3, "Ann Smith", 4)).await.unwrap();
        sink.flush().await.unwrap();

        let expected = dir
            .path()
            .join("Ann Smith")
            .join("schairlog_2019-03-14_12-30-05_000003.csv");
        assert_eq!(sink.written(), [expected.clone()]);

        let text = fs::read_to_string(expected).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "time,acc_x,acc_y,acc_z,gyro_x,gyro_y,gyro_z,mag_x,mag_y,mag_z"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2019-03-14 12:30:05.000000,0,1,2,3,4,5,6,7,8"
        );
        assert_eq!(lines.count(), 3);
    }

    #[tokio::test]
    async fn test_empty_batch_writes_nothing() {
        let dir = tempdir().unwrap();
        let mut sink = FileSink::new(
            "empty",
            FileSinkConfig {
                base_path: dir.path().to_path_buf(),
                prefix: "schairlog".to_string(),
            },
        )
        .unwrap();

        sink.write(&batch(0, "Ann Smith", 0)).await.unwrap();
        assert!(sink.written().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_session_folder_fallbacks() {
        assert_eq!(FileSink::session_folder(&batch(0, "Ann Smith", 0)), "Ann Smith");
        let mut anonymous = batch(0, "  ", 0);
        assert_eq!(FileSink::session_folder(&anonymous), "run");
        anonymous.label.clear();
        assert_eq!(FileSink::session_folder(&anonymous), UNLABELED_FOLDER);
        assert_eq!(FileSink::session_folder(&batch(0, "a/b", 0)), "a_b");
    }

    #[test]
    fn test_config_defaults() {
        let config = FileSinkConfig::from_params(&HashMap::new());
        assert_eq!(config.base_path, PathBuf::from("./data"));
        assert_eq!(config.prefix, "schairlog");
    }
}
