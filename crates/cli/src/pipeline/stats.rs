//! Run statistics printed at the end of a command.

use std::path::PathBuf;
use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::StatsMetricsAggregator;

/// Statistics of one analysis command
#[derive(Debug, Clone, Default)]
pub struct AnalysisStats {
    pub operation: &'static str,

    /// Sessions loaded from the dataset
    pub sessions_loaded: usize,

    /// Files or folders the loader skipped
    pub files_skipped: usize,

    /// Non-finite samples removed before analysis
    pub samples_dropped: usize,

    pub duration: Duration,

    /// Files written by the command
    pub outputs: Vec<PathBuf>,

    /// Per-metric distribution over the analyzed sessions
    pub metrics: StatsMetricsAggregator,
}

impl AnalysisStats {
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Chair Stats: {:<29}║", self.operation);
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Sessions loaded: {}", self.sessions_loaded);
        println!("   ├─ Files skipped: {}", self.files_skipped);
        println!("   └─ Samples dropped: {}", self.samples_dropped);

        println!("\n{}", self.metrics.summary());

        if !self.outputs.is_empty() {
            println!("📁 Outputs");
            for (i, path) in self.outputs.iter().enumerate() {
                let prefix = if i == self.outputs.len() - 1 { "└─" } else { "├─" };
                println!("   {} {}", prefix, path.display());
            }
        }

        println!();
    }
}

/// Statistics from a collection run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Batches handed to the dispatcher
    pub batches_sent: u64,

    /// Complete samples captured
    pub samples_read: u64,

    /// Sensor reads that failed
    pub read_errors: u64,

    pub duration: Duration,

    /// Final metrics per sink
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl PipelineStats {
    /// Samples per second over the whole run
    pub fn sample_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.samples_read as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Batches dropped by full sink queues, all sinks together
    pub fn batches_dropped(&self) -> u64 {
        self.sinks.iter().map(|(_, m)| m.dropped_count).sum()
    }

    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Collection Statistics                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Batches sent: {}", self.batches_sent);
        println!("   ├─ Samples read: {}", self.samples_read);
        println!("   ├─ Read errors: {}", self.read_errors);
        println!("   └─ Samples/s: {:.2}", self.sample_rate());

        if !self.sinks.is_empty() {
            println!("\n📤 Sinks");
            for (i, (name, m)) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: written {} ({} samples), failed {}, dropped {}",
                    prefix,
                    name,
                    m.batches_written,
                    m.samples_written,
                    m.failure_count,
                    m.dropped_count
                );
            }
        }

        println!();
    }
}
