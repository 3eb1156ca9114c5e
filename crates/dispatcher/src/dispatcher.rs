//! Dispatcher - fan-out of collected batches to sinks

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{ReadingBatch, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink, NetworkSink};

/// Dispatcher configuration
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    pub sinks: Vec<SinkConfig>,
}

/// Builds the sink handles, then the dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<ReadingBatch>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<ReadingBatch>) -> Self {
        Self { config, input_rx }
    }

    /// Create every configured sink; fails on the first sink that cannot start
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub async fn build(self) -> Result<Dispatcher, DispatcherError> {
        let mut handles = Vec::with_capacity(self.config.sinks.len());
        for sink_config in &self.config.sinks {
            handles.push(create_sink_handle(sink_config).await?);
        }

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
        })
    }
}

#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
async fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    let capacity = config.queue_capacity;
    match config.sink_type {
        SinkType::Log => Ok(SinkHandle::spawn(LogSink::new(&config.name), capacity)),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, capacity))
        }
        SinkType::Network => {
            let sink = NetworkSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, capacity))
        }
    }
}

/// Counts of one dispatcher run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Batches received from the collector
    pub batches: u64,
    /// Final metrics per sink
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

/// Fans every incoming batch out to all sinks
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<ReadingBatch>,
}

impl Dispatcher {
    /// Dispatcher over already spawned handles
    pub fn with_handles(handles: Vec<SinkHandle>, input_rx: mpsc::Receiver<ReadingBatch>) -> Self {
        Self { handles, input_rx }
    }

    pub fn sink_count(&self) -> usize {
        self.handles.len()
    }

    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Consume batches until the collector closes its channel, then drain
    /// and close every sink.
    #[instrument(name = "dispatcher_run", skip(self), fields(sinks = self.handles.len()))]
    pub async fn run(mut self) -> DispatchReport {
        info!(sinks = self.handles.len(), "Dispatcher started");

        let mut batches: u64 = 0;
        while let Some(batch) = self.input_rx.recv().await {
            batches += 1;
            debug!(batch_id = batch.batch_id, samples = batch.len(), "Dispatching batch");
            self.dispatch_batch(Arc::new(batch));
        }

        info!(batches, "Dispatcher input closed, shutting down");

        let metrics = self.handles.iter().map(|h| Arc::clone(h.metrics())).collect::<Vec<_>>();
        for handle in self.handles {
            handle.shutdown().await;
        }
        let sinks = metrics
            .iter()
            .map(|m| (m.sink_name().to_string(), m.snapshot()))
            .collect();

        info!("Dispatcher shutdown complete");
        DispatchReport { batches, sinks }
    }

    pub fn spawn(self) -> JoinHandle<DispatchReport> {
        tokio::spawn(self.run())
    }

    fn dispatch_batch(&self, batch: Arc<ReadingBatch>) {
        for handle in &self.handles {
            // 丢弃已在 handle 内记录
            let _ = handle.try_send(Arc::clone(&batch));
        }
    }
}

/// Create a dispatcher from sink configs
#[instrument(name = "dispatcher_create", skip(sink_configs, input_rx))]
pub async fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    input_rx: mpsc::Receiver<ReadingBatch>,
) -> Result<Dispatcher, DispatcherError> {
    let config = DispatcherConfig {
        sinks: sink_configs,
    };
    DispatcherBuilder::new(config, input_rx).build().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn batch(batch_id: u64) -> ReadingBatch {
        ReadingBatch {
            batch_id,
            label: "test".to_string(),
            meta: String::new(),
            person_id: "Ann Smith".to_string(),
            samples: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_dispatcher_fanout() {
        let (input_tx, input_rx) = mpsc::channel(10);

        let handles = vec![
            SinkHandle::spawn(LogSink::new("sink1"), 10),
            SinkHandle::spawn(LogSink::new("sink2"), 10),
        ];
        let handle = Dispatcher::with_handles(handles, input_rx).spawn();

        for i in 0..5 {
            input_tx.send(batch(i)).await.unwrap();
        }
        drop(input_tx);

        let report = handle.await.unwrap();
        assert_eq!(report.batches, 5);
        assert_eq!(report.sinks.len(), 2);
        for (_, snapshot) in &report.sinks {
            assert_eq!(snapshot.batches_written, 5);
            assert_eq!(snapshot.last_batch_id, Some(4));
        }
    }

    #[tokio::test]
    async fn test_create_dispatcher_from_config() {
        let (input_tx, input_rx) = mpsc::channel(10);

        let configs = vec![SinkConfig {
            name: "test_log".to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        }];

        let dispatcher = create_dispatcher(configs, input_rx).await.unwrap();
        assert_eq!(dispatcher.sink_count(), 1);
        let handle = dispatcher.spawn();

        input_tx.send(batch(1)).await.unwrap();
        drop(input_tx);

        let report = handle.await.unwrap();
        assert_eq!(report.sinks[0].0, "test_log");
        assert_eq!(report.sinks[0].1.batches_written, 1);
    }

    #[tokio::test]
    async fn test_invalid_network_sink_fails_build() {
        let (_tx, input_rx) = mpsc::channel(1);
        let configs = vec![SinkConfig {
            name: "upload".to_string(),
            sink_type: SinkType::Network,
            queue_capacity: 4,
            params: HashMap::new(),
        }];

        let err = create_dispatcher(configs, input_rx).await.err().unwrap();
        assert!(matches!(err, DispatcherError::SinkCreation { ref name, .. } if name == "upload"));
    }
}
