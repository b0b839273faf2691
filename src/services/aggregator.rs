//! Run-wide accumulation of per-generation consensus outcomes.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::context::ALGORITHM;
use crate::domain::models::{GenerationRecord, GenerationSummary};

/// One `Result:` line per generation index of `generations`.
pub fn report_lines(
    generations: &BTreeMap<usize, GenerationSummary>,
    dataset: &str,
    provider: &str,
    model: &str,
) -> Vec<String> {
    generations
        .iter()
        .map(|(generation, summary)| {
            format!(
                "Result: algorithm={ALGORITHM} dataset={dataset} provider={provider} model={model} \
generation={generation} check={} total={}",
                summary.correct, summary.total
            )
        })
        .collect()
}

/// Append-only map from generation index to the records of every test.
///
/// Clones share the same storage. Appends take an async write lock, so any
/// number of concurrently running tests may record into one aggregator.
#[derive(Debug, Clone, Default)]
pub struct ResultsAggregator {
    generations: Arc<RwLock<BTreeMap<usize, Vec<GenerationRecord>>>>,
}

impl ResultsAggregator {
    /// Empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record to its generation slot.
    pub async fn record(&self, record: GenerationRecord) {
        let mut generations = self.generations.write().await;
        generations.entry(record.generation).or_default().push(record);
    }

    /// Append a completed test's records under one lock acquisition.
    pub async fn merge(&self, records: Vec<GenerationRecord>) {
        let mut generations = self.generations.write().await;
        for record in records {
            generations.entry(record.generation).or_default().push(record);
        }
    }

    /// Records of one generation, in append order.
    pub async fn records(&self, generation: usize) -> Vec<GenerationRecord> {
        let generations = self.generations.read().await;
        generations.get(&generation).cloned().unwrap_or_default()
    }

    /// Correct and total counts per generation index.
    pub async fn summarize(&self) -> BTreeMap<usize, GenerationSummary> {
        let generations = self.generations.read().await;
        generations
            .iter()
            .map(|(&generation, records)| {
                let summary = GenerationSummary {
                    correct: records.iter().filter(|r| r.check).count(),
                    total: records.len(),
                };
                (generation, summary)
            })
            .collect()
    }

    /// `Result:` lines for everything recorded so far.
    pub async fn report(&self, dataset: &str, provider: &str, model: &str) -> Vec<String> {
        report_lines(&self.summarize().await, dataset, provider, model)
    }
}
