//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 数据集 → 统计 → 结果表的端到端流程
//! - 模拟采集 → FileSink → 数据集加载的闭环

#[cfg(test)]
mod contract_tests {
    use contracts::{ConfigVersion, TRUNCATED_COLUMNS};

    #[test]
    fn test_contracts_compile() {
        let _ = ConfigVersion::V1;
    }

    #[test]
    fn test_truncated_view_names() {
        let names: Vec<&str> = TRUNCATED_COLUMNS.iter().map(|(_, display)| *display).collect();
        assert_eq!(
            names,
            ["Momentum", "Rotational movement", "Lean back", "Oscillation"]
        );
    }
}

#[cfg(test)]
mod analysis_e2e {
    use std::fs;
    use std::path::{Path, PathBuf};

    use config_loader::ConfigLoader;
    use contracts::{ChairBlueprint, ResultsTable};
    use ingestion::DatasetLoader;
    use tempfile::TempDir;

    const FULL_HEADER: &str =
        "datetime_now,accel_x,accel_y,accel_z,gyro_x,gyro_y,gyro_z,mag_x,mag_y,mag_z";

    /// 200 samples @10ms; acc_z alternates around the lean back threshold
    fn full_session(seconds_offset: u32) -> String {
        let mut text = String::from(FULL_HEADER);
        for i in 0..200u32 {
            let acc_z = if i % 2 == 0 { -16100.0 } else { -15900.0 };
            let jitter = (i % 7) as f64;
            text.push_str(&format!(
                "\n2019-03-14 12:00:{:02}.{:02}0,{},{},{},{},{},{},{},{},{}",
                seconds_offset + i / 100,
                i % 100,
                100.0 + jitter,
                -80.0 - jitter,
                acc_z,
                jitter * 0.5,
                -jitter * 0.5,
                1.0,
                40.0 + 0.01 * i as f64,
                -12.0,
                95.0 - 0.01 * i as f64,
            ));
        }
        text
    }

    fn setup() -> (TempDir, PathBuf) {
        let root = TempDir::new().unwrap();
        let data = root.path().join("data");

        for (folder, body) in [
            ("Ann\tSmith", full_session(0)),
            ("Bob\tStone", full_session(10)),
            (
                "Carl",
                "time,acc_x,acc_y,acc_z\n2019-03-14 12:00:00.000,1,2,3\n2019-03-14 12:00:00.010,1,2,3"
                    .to_string(),
            ),
        ] {
            let dir = data.join(folder);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("schairlog_2019-03-14_12-00-00.csv"), body).unwrap();
        }

        fs::write(
            root.path().join("participants.csv"),
            "First Name;Last Name;Skill\nAnn;Smith;High\nBob;Stone;None\nDee;Moss;Small\n",
        )
        .unwrap();

        let config = root.path().join("config.toml");
        fs::write(
            &config,
            r#"
[dataset]
data_path = "data"
participants_path = "participants.csv"
skill_column = "Skill"
output_dir = "clean"
"#,
        )
        .unwrap();

        (root, config)
    }

    fn load(config: &Path) -> (ChairBlueprint, contracts::Corpus) {
        let blueprint = ConfigLoader::load_from_path(config).unwrap();
        let loaded = DatasetLoader::new(&blueprint.dataset, &blueprint.analysis)
            .load()
            .unwrap();
        (blueprint, loaded.corpus)
    }

    fn same(a: f64, b: f64) -> bool {
        a == b || (a.is_nan() && b.is_nan())
    }

    /// Dataset on disk → corpus stats → CSV → read back → participants join
    #[test]
    fn test_dataset_to_results_table() {
        let (_root, config) = setup();
        let (blueprint, corpus) = load(&config);
        assert_eq!(corpus.len(), 3);

        let report = stats_engine::corpus_stats(&corpus, &blueprint.analysis, None);
        let names: Vec<&str> = report.records.iter().map(|r| r.session.as_str()).collect();
        assert_eq!(names, ["Ann Smith", "Bob Stone"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].session.as_str(), "Carl");
        assert_eq!(report.failures[0].kind, "missing_channel");

        for record in &report.records {
            assert_eq!(record.get("lean_back_portion"), Some(0.5));
            for (key, value) in &record.metrics {
                if key.contains("portion") {
                    assert!((0.0..=1.0).contains(value), "{key} = {value}");
                }
            }
            // 200 个样本不足一个批次
            assert!(record.get("time_between_batches").is_none());
        }

        let table = report.table();
        let path = blueprint.dataset.output_dir.join("chair_stats.csv");
        dispatcher::write_results_csv(&path, &table).unwrap();
        let back: ResultsTable = dispatcher::read_results_csv(&path).unwrap();
        assert_eq!(back.columns, table.columns);
        for (a, b) in back.rows.iter().zip(&table.rows) {
            assert_eq!(a.session, b.session);
            assert!(a.values.iter().zip(&b.values).all(|(x, y)| same(*x, *y)));
        }

        let participants = ingestion::load_configured(&blueprint.dataset)
            .unwrap()
            .unwrap();
        let merged = back.inner_join(&participants);
        let labels: Vec<(&str, &str)> = merged
            .rows
            .iter()
            .map(|r| (r.session.as_str(), r.skill.as_str()))
            .collect();
        assert_eq!(labels, [("Ann Smith", "High"), ("Bob Stone", "Small")]);
    }

    /// Truncated view keeps only the four display columns
    #[test]
    fn test_truncated_report() {
        let (_root, config) = setup();
        let (blueprint, corpus) = load(&config);

        let table = stats_engine::corpus_stats(&corpus, &blueprint.analysis, None)
            .truncated()
            .table();
        assert_eq!(
            table.columns,
            ["Lean back", "Momentum", "Oscillation", "Rotational movement"]
        );
        assert_eq!(table.column("Lean back").unwrap(), [0.5, 0.5]);
    }

    /// Stationarity and zeros succeed for every session, even without magnetometer
    #[test]
    fn test_diagnostics_cover_partial_sessions() {
        let (_root, config) = setup();
        let (blueprint, corpus) = load(&config);

        let zeros = stats_engine::corpus_zeros(&corpus);
        assert!(zeros.is_complete());
        assert_eq!(zeros.records.len(), 3);

        let stationarity =
            stats_engine::corpus_stationarity(&corpus, &blueprint.analysis, Some(2.0));
        assert!(stationarity.records.iter().all(|r| r
            .metrics
            .values()
            .all(|v| (0.0..=1.0).contains(v))));
    }
}

#[cfg(test)]
mod collection_e2e {
    use std::collections::HashMap;

    use contracts::{AnalysisConfig, CollectorConfig, DatasetConfig, SinkConfig, SinkType};
    use dispatcher::create_dispatcher;
    use ingestion::{CollectorLoop, DatasetLoader, SimulatedChair, SimulatedChairConfig};
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    /// SimulatedChair → CollectorLoop → Dispatcher(FileSink, LogSink) →
    /// DatasetLoader → session stats
    #[tokio::test]
    async fn test_collected_session_is_analyzable() {
        let root = TempDir::new().unwrap();

        let sinks = vec![
            SinkConfig {
                name: "csv".to_string(),
                sink_type: SinkType::File,
                queue_capacity: 8,
                params: HashMap::from([(
                    "base_path".to_string(),
                    root.path().display().to_string(),
                )]),
            },
            SinkConfig {
                name: "log".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 8,
                params: HashMap::new(),
            },
        ];
        let (tx, rx) = mpsc::channel(4);
        let dispatcher_handle = create_dispatcher(sinks, rx).await.unwrap().spawn();

        let chair = SimulatedChair::new(SimulatedChairConfig {
            lean_back_every: 10,
            lean_back_for: 5,
            ..Default::default()
        });
        let collector = CollectorLoop::new(
            chair,
            CollectorConfig {
                timestep_detect: 0.001,
                timestep_send: 0.01,
                max_time: 1.0,
                person_id: "Eve Moss".to_string(),
                ..Default::default()
            },
        )
        .with_batch_limit(4);

        let summary = collector.run(tx).await.unwrap();
        assert_eq!(summary.batches, 4);

        let report = dispatcher_handle.await.unwrap();
        assert_eq!(report.batches, 4);
        assert!(report.sinks.iter().all(|(_, m)| m.batches_written == 4));

        let dataset = DatasetConfig {
            data_path: root.path().to_path_buf(),
            chair_file_prefix: "schairlog".to_string(),
            participants_path: None,
            participants_delimiter: ';',
            skill_column: "Skill".to_string(),
            output_dir: root.path().join("clean"),
            raw_counts: false,
        };
        let analysis = AnalysisConfig::default();
        let loaded = DatasetLoader::new(&dataset, &analysis).load().unwrap();
        assert!(loaded.skipped.is_empty());

        let session = &loaded.corpus["Eve Moss"];
        assert_eq!(session.len(), 40);

        let record = stats_engine::session_stats(session, &analysis, None).unwrap();
        assert_eq!(record.get("lean_back_portion"), Some(0.5));

        let timing = stats_engine::TimingDiagnostics::new(10, 0.001)
            .analyze(session.timestamps())
            .unwrap();
        assert_eq!(timing.batch_gaps.len(), 3);
        assert!(timing.total_elapsed > 0.0);
    }
}

#[cfg(test)]
mod config_e2e {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::SinkType;
    use tokio::sync::mpsc;

    const CONFIG: &str = r#"
[dataset]
data_path = "../CSV"

[analysis]
measurement_interval = 0.01
oscillation_composite = "mean_of_axes"

[collector]
timestep_detect = 0.01
timestep_send = 10.0
max_time = 60.0

[[sinks]]
name = "monitor"
sink_type = "log"
"#;

    /// Blueprint sinks build a running dispatcher
    #[tokio::test]
    async fn test_blueprint_to_dispatcher() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.collector.samples_per_batch(), 1000);
        assert_eq!(blueprint.sinks[0].sink_type, SinkType::Log);

        let (tx, rx) = mpsc::channel(1);
        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), rx)
            .await
            .unwrap();
        assert_eq!(dispatcher.metrics().len(), 1);
        drop(tx);

        let report = dispatcher.spawn().await.unwrap();
        assert_eq!(report.batches, 0);
    }
}
