//! Pipeline module: dataset loading for the analysis commands and the
//! collection orchestrator.

mod analysis;
mod orchestrator;
mod stats;

pub use analysis::{load_blueprint, load_corpus, output_dir, summarize, LoadedDataset};
pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::{AnalysisStats, PipelineStats};
