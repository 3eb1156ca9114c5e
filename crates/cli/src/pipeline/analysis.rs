//! Dataset side of the commands: configuration, corpus loading, output paths.

use std::path::{Path, PathBuf};
use std::time::Instant;

use contracts::{ChairBlueprint, Corpus};
use ingestion::{DatasetLoader, SkippedFile};
use stats_engine::{drop_non_finite, CorpusReport};
use tracing::{info, warn};

use super::AnalysisStats;
use crate::error::{CliError, Result};

/// Load and validate the configuration file
pub fn load_blueprint(path: &Path) -> Result<ChairBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path));
    }
    let blueprint = config_loader::ConfigLoader::load_from_path(path)?;
    info!(
        config = %path.display(),
        data_path = %blueprint.dataset.data_path.display(),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );
    Ok(blueprint)
}

/// Corpus plus what was left out while loading it
#[derive(Debug, Default)]
pub struct LoadedDataset {
    pub corpus: Corpus,
    pub skipped: Vec<SkippedFile>,
    pub samples_dropped: usize,
}

/// Load every session of the configured dataset.
///
/// With `drop_non_finite`, samples carrying NaN/Inf are removed first.
///
/// # Errors
/// `EmptyCorpus` when no session folder could be loaded.
pub fn load_corpus(
    blueprint: &ChairBlueprint,
    drop_non_finite_samples: bool,
) -> Result<LoadedDataset> {
    let loaded = DatasetLoader::new(&blueprint.dataset, &blueprint.analysis).load()?;
    for skipped in &loaded.skipped {
        warn!(path = %skipped.path.display(), reason = %skipped.reason, "File skipped");
    }

    let mut dataset = LoadedDataset {
        corpus: loaded.corpus,
        skipped: loaded.skipped,
        samples_dropped: 0,
    };
    if dataset.corpus.is_empty() {
        return Err(CliError::EmptyCorpus {
            path: blueprint.dataset.data_path.clone(),
        });
    }

    if drop_non_finite_samples {
        for session in dataset.corpus.values_mut() {
            let (clean, dropped) = drop_non_finite(session);
            observability::record_samples_dropped(session.id(), dropped);
            dataset.samples_dropped += dropped;
            *session = clean;
        }
        info!(dropped = dataset.samples_dropped, "Non-finite samples removed");
    }

    Ok(dataset)
}

/// `--out` if given, else `dataset.output_dir`
pub fn output_dir(blueprint: &ChairBlueprint, out: Option<&Path>) -> PathBuf {
    out.map(Path::to_path_buf)
        .unwrap_or_else(|| blueprint.dataset.output_dir.clone())
}

/// Fold a corpus report into run statistics
pub fn summarize(
    operation: &'static str,
    dataset: &LoadedDataset,
    report: &CorpusReport,
    started: Instant,
) -> AnalysisStats {
    let mut stats = AnalysisStats {
        operation,
        sessions_loaded: dataset.corpus.len(),
        files_skipped: dataset.skipped.len(),
        samples_dropped: dataset.samples_dropped,
        ..Default::default()
    };
    for record in &report.records {
        stats.metrics.update(record);
    }
    for failure in &report.failures {
        stats.metrics.record_failure(&failure.kind);
        warn!(
            session = %failure.session,
            kind = %failure.kind,
            message = %failure.message,
            "Session skipped"
        );
    }
    stats.duration = started.elapsed();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_session(root: &Path, folder: &str, rows: usize) {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).unwrap();
        let mut text = String::from("time,acc_x,acc_y,acc_z\n");
        for i in 0..rows {
            let value = if i == 1 { "nan".to_string() } else { i.to_string() };
            text.push_str(&format!("2019-03-14 12:00:{:02}.000,{},0,-1\n", i, value));
        }
        fs::write(dir.join("schairlog_2019-03-14.csv"), text).unwrap();
    }

    fn write_config(root: &Path) -> PathBuf {
        let path = root.join("config.toml");
        fs::write(&path, "[dataset]\ndata_path = \"data\"\noutput_dir = \"clean\"\n").unwrap();
        path
    }

    #[test]
    fn test_missing_config() {
        let err = load_blueprint(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, CliError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_corpus_with_drop() {
        let dir = tempdir().unwrap();
        write_session(&dir.path().join("data"), "Ann\tSmith", 5);
        let blueprint = load_blueprint(&write_config(dir.path())).unwrap();

        let dataset = load_corpus(&blueprint, true).unwrap();
        assert_eq!(dataset.corpus.len(), 1);
        assert_eq!(dataset.samples_dropped, 1);
        let session = dataset.corpus.values().next().unwrap();
        assert_eq!(session.id().as_str(), "Ann Smith");
        assert_eq!(session.len(), 4);

        assert_eq!(output_dir(&blueprint, None), dir.path().join("clean"));
        assert_eq!(output_dir(&blueprint, Some(Path::new("x"))), PathBuf::from("x"));
    }

    #[test]
    fn test_empty_dataset() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        let blueprint = load_blueprint(&write_config(dir.path())).unwrap();
        assert!(matches!(
            load_corpus(&blueprint, false),
            Err(CliError::EmptyCorpus { .. })
        ));
    }
}
