//! Corpus batching: one statistic over every session, in parallel.
//!
//! A session that fails is logged and recorded in the report; the remaining
//! sessions are still processed. Output order follows session id order.

use std::time::Instant;

use contracts::{
    AnalysisConfig, ContractError, Corpus, ResultsTable, Session, SessionId, StatsRecord,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::aggregator::{zeros_portion, StatsAggregator};

/// A session skipped by a corpus operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionFailure {
    pub session: SessionId,
    /// Error variant label, see [`ContractError::kind`]
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusReport {
    pub records: Vec<StatsRecord>,
    pub failures: Vec<SessionFailure>,
}

impl CorpusReport {
    pub fn table(&self) -> ResultsTable {
        ResultsTable::from_records(&self.records)
    }

    /// Same report with every record reduced to its presentation view
    pub fn truncated(&self) -> CorpusReport {
        CorpusReport {
            records: self.records.iter().map(StatsRecord::truncated).collect(),
            failures: self.failures.clone(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Full statistics for every session
#[instrument(skip_all, fields(sessions = corpus.len()))]
pub fn corpus_stats(
    corpus: &Corpus,
    config: &AnalysisConfig,
    k_sigma: Option<f64>,
) -> CorpusReport {
    let aggregator = StatsAggregator::new(config.clone());
    run("session_stats", corpus, |session| {
        aggregator.session_stats(session, k_sigma)
    })
}

/// Stationarity portions for every session
#[instrument(skip_all, fields(sessions = corpus.len()))]
pub fn corpus_stationarity(
    corpus: &Corpus,
    config: &AnalysisConfig,
    k_sigma: Option<f64>,
) -> CorpusReport {
    let aggregator = StatsAggregator::new(config.clone());
    run("stationarity", corpus, |session| {
        aggregator.stationarity(session, k_sigma)
    })
}

/// Zero-value portions for every session
#[instrument(skip_all, fields(sessions = corpus.len()))]
pub fn corpus_zeros(corpus: &Corpus) -> CorpusReport {
    run("zeros_portion", corpus, |session| Ok(zeros_portion(session)))
}

/// Timing diagnostics for every session
#[instrument(skip_all, fields(sessions = corpus.len()))]
pub fn corpus_timing(corpus: &Corpus, config: &AnalysisConfig) -> CorpusReport {
    let aggregator = StatsAggregator::new(config.clone());
    run("timing", corpus, |session| aggregator.timing(session))
}

fn run<F>(operation: &'static str, corpus: &Corpus, f: F) -> CorpusReport
where
    F: Fn(&Session) -> Result<StatsRecord, ContractError> + Sync,
{
    let sessions: Vec<&Session> = corpus.values().collect();
    let outcomes: Vec<Result<StatsRecord, SessionFailure>> = sessions
        .par_iter()
        .map(|&session| {
            let started = Instant::now();
            match f(session) {
                Ok(record) => {
                    observability::record_session_stats(
                        &record,
                        started.elapsed().as_secs_f64() * 1000.0,
                    );
                    Ok(record)
                }
                Err(e) => {
                    warn!(
                        operation,
                        session = %session.id(),
                        error = %e,
                        "session skipped"
                    );
                    observability::record_session_failed(operation, e.kind());
                    Err(SessionFailure {
                        session: session.id().clone(),
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let mut report = CorpusReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(record) => report.records.push(record),
            Err(failure) => report.failures.push(failure),
        }
    }
    info!(
        operation,
        analyzed = report.records.len(),
        failed = report.failures.len(),
        "corpus done"
    );
    report
}
