//! Collection pipeline: simulated chair → collector loop → dispatcher → sinks.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use contracts::ChairBlueprint;
use ingestion::{CollectorLoop, SimulatedChair, SimulatedChairConfig};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::PipelineStats;
use crate::error::{CliError, Result};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub blueprint: ChairBlueprint,

    /// Stop after this many batches (None = collector.max_time / timestep_send)
    pub batches: Option<usize>,

    /// Collection timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Batch channel buffer size
    pub buffer_size: usize,

    pub chair: SimulatedChairConfig,

    /// Stop on Ctrl+C / SIGTERM, flushing the partial batch
    pub handle_signals: bool,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the collection to completion and drain every sink
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        let (batch_tx, batch_rx) = mpsc::channel(self.config.buffer_size.max(1));

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - collected batches will be dropped");
        }

        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), batch_rx).await?;
        let dispatcher_handle = dispatcher.spawn();
        info!(sinks = blueprint.sinks.len(), "Dispatcher started");

        let mut collector = CollectorLoop::new(
            SimulatedChair::new(self.config.chair.clone()),
            blueprint.collector.clone(),
        );
        if let Some(batches) = self.config.batches {
            collector = collector.with_batch_limit(batches);
        }
        let collector_metrics = collector.metrics();
        let running = collector.running_flag();

        let signal_task = self.config.handle_signals.then(|| {
            tokio::spawn(async move {
                shutdown_signal().await;
                warn!("Received shutdown signal, finishing current batch...");
                running.store(false, Ordering::SeqCst);
            })
        });

        let collected = match self.config.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, collector.run(batch_tx)).await {
                Ok(result) => Some(result),
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "Collection timed out");
                    None
                }
            },
            None => Some(collector.run(batch_tx).await),
        };

        if let Some(task) = signal_task {
            task.abort();
        }

        // 采集端已关闭通道，等待 dispatcher 排空各 sink
        let report = match tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => return Err(CliError::collection(format!("dispatcher task failed: {e}"))),
            Err(_) => return Err(CliError::collection("dispatcher did not drain within 5s")),
        };

        let metrics = collector_metrics.snapshot();
        let batches_sent = match collected {
            Some(Ok(summary)) => summary.batches,
            Some(Err(e)) => return Err(e.into()),
            None => metrics.batches_sent,
        };

        let stats = PipelineStats {
            batches_sent,
            samples_read: metrics.samples_read,
            read_errors: metrics.read_errors,
            duration: start_time.elapsed(),
            sinks: report.sinks,
        };

        info!(
            batches = stats.batches_sent,
            samples = stats.samples_read,
            duration_secs = stats.duration.as_secs_f64(),
            "Collection complete"
        );

        Ok(stats)
    }
}

/// Resolves on Ctrl+C or SIGTERM; never resolves if no handler can be installed
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CollectorConfig, DatasetConfig, SinkConfig, SinkType};
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn blueprint(base_path: &std::path::Path) -> ChairBlueprint {
        ChairBlueprint {
            version: Default::default(),
            dataset: DatasetConfig {
                data_path: base_path.to_path_buf(),
                chair_file_prefix: "schairlog".to_string(),
                participants_path: None,
                participants_delimiter: ';',
                skill_column: "Skill".to_string(),
                output_dir: base_path.join("clean"),
                raw_counts: false,
            },
            analysis: Default::default(),
            collector: CollectorConfig {
                timestep_detect: 0.001,
                timestep_send: 0.004,
                max_time: 1.0,
                person_id: "Ann Smith".to_string(),
                ..Default::default()
            },
            sinks: vec![
                SinkConfig {
                    name: "log".to_string(),
                    sink_type: SinkType::Log,
                    queue_capacity: 8,
                    params: HashMap::new(),
                },
                SinkConfig {
                    name: "csv".to_string(),
                    sink_type: SinkType::File,
                    queue_capacity: 8,
                    params: HashMap::from([(
                        "base_path".to_string(),
                        base_path.display().to_string(),
                    )]),
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_pipeline_writes_batches() {
        let dir = tempdir().unwrap();
        let stats = Pipeline::new(PipelineConfig {
            blueprint: blueprint(dir.path()),
            batches: Some(3),
            timeout: None,
            buffer_size: 4,
            chair: SimulatedChairConfig::default(),
            handle_signals: false,
        })
        .run()
        .await
        .unwrap();

        assert_eq!(stats.batches_sent, 3);
        assert_eq!(stats.samples_read, 12);
        assert_eq!(stats.sinks.len(), 2);
        for (_, sink) in &stats.sinks {
            assert_eq!(sink.batches_written, 3);
        }
        let files = std::fs::read_dir(dir.path().join("Ann Smith")).unwrap().count();
        assert_eq!(files, 3);
    }
}
