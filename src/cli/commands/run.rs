//! Implementation of the `exevo run` command.

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{presets, Attribute, Cell, CellAlignment, ContentArrangement, Table};
use indicatif::ProgressBar;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::output::{create_progress_bar, output, truncate, CommandOutput};
use crate::domain::ports::{CompletionStore, Dataset, NullCompletionStore};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::dataset::FileDataset;
use crate::infrastructure::llm::build_client;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::infrastructure::store::JsonlCompletionStore;
use crate::services::{
    EventBus, EvolutionContext, EvolutionEvent, EvolutionRunner, FailedTest, RunSummary,
    UsageSnapshot, ALGORITHM,
};

/// Arguments of `exevo run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Dataset file (YAML or JSON)
    #[arg(short, long)]
    pub dataset: PathBuf,

    /// Extra configuration file, merged over .exevo/ and under EXEVO_* variables
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Evaluate only the first N tests of the dataset
    #[arg(short = 'n', long)]
    pub tests: Option<usize>,

    /// Number of tests evolved concurrently
    #[arg(long)]
    pub outer_concurrency: Option<usize>,
}

/// One row of the per-generation results table.
#[derive(Debug, Serialize)]
pub struct GenerationRow {
    /// Generation index.
    pub generation: usize,
    /// Tests whose consensus was correct.
    pub correct: usize,
    /// Tests recorded at this index.
    pub total: usize,
    /// `correct / total`.
    pub accuracy: f64,
}

/// Result of `exevo run`.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    /// Algorithm name.
    pub algorithm: String,
    /// Dataset name.
    pub dataset: String,
    /// Provider name.
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Run identifier, matching the audit records.
    pub run_id: String,
    /// Number of tests that finished.
    pub completed: usize,
    /// Abandoned tests.
    pub failed: Vec<FailedTest>,
    /// Accuracy per generation index.
    pub generations: Vec<GenerationRow>,
    /// Completion and token counts.
    pub usage: UsageSnapshot,
    #[serde(skip)]
    report_lines: Vec<String>,
}

impl RunOutput {
    fn new(summary: RunSummary, dataset: &str, provider: &str, model: &str) -> Self {
        let report_lines = summary.report_lines(dataset, provider, model);
        let generations = summary
            .generations
            .iter()
            .map(|(&generation, s)| GenerationRow {
                generation,
                correct: s.correct,
                total: s.total,
                accuracy: s.accuracy(),
            })
            .collect();

        Self {
            algorithm: ALGORITHM.to_string(),
            dataset: dataset.to_string(),
            provider: provider.to_string(),
            model: model.to_string(),
            run_id: summary.run_id,
            completed: summary.completed,
            failed: summary.failed,
            generations,
            usage: summary.usage,
            report_lines,
        }
    }
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Generation").add_attribute(Attribute::Bold),
                Cell::new("Correct").add_attribute(Attribute::Bold),
                Cell::new("Total").add_attribute(Attribute::Bold),
                Cell::new("Accuracy").add_attribute(Attribute::Bold),
            ]);
        for row in &self.generations {
            table.add_row(vec![
                Cell::new(row.generation).set_alignment(CellAlignment::Right),
                Cell::new(row.correct).set_alignment(CellAlignment::Right),
                Cell::new(row.total).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.1}%", row.accuracy * 100.0))
                    .set_alignment(CellAlignment::Right),
            ]);
        }

        let mut lines = self.report_lines.clone();
        lines.push(String::new());
        lines.push(table.to_string());
        lines.push(format!(
            "\n{} completed, {} failed; {} completions ({} input / {} output tokens)",
            self.completed,
            self.failed.len(),
            self.usage.completions,
            self.usage.input_tokens,
            self.usage.output_tokens
        ));
        for failure in &self.failed {
            lines.push(format!(
                "  - {}: {}",
                failure.test_id,
                truncate(&failure.error, 100)
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Advance `pb` as tests finish until the bus goes quiet.
fn spawn_progress_reporter(
    mut events: broadcast::Receiver<EvolutionEvent>,
    pb: ProgressBar,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(EvolutionEvent::ConsensusComputed {
                    test_id,
                    generation,
                    correct,
                    pool_size,
                    ..
                }) => {
                    pb.set_message(format!("{test_id} gen {generation}: {correct}/{pool_size}"));
                }
                Ok(EvolutionEvent::TestCompleted { .. } | EvolutionEvent::TestFailed { .. }) => {
                    pb.inc(1);
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Cancel `token` on Ctrl-C.
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning in-flight tests");
            token.cancel();
        }
    });
}

/// Evolve every selected test of the dataset and print the per-generation results.
pub async fn execute(args: RunArgs, json_mode: bool) -> Result<()> {
    let mut config = ConfigLoader::load_with(args.config.as_deref())?;
    if let Some(outer_concurrency) = args.outer_concurrency {
        config.run.outer_concurrency = outer_concurrency;
        ConfigLoader::validate(&config)?;
    }

    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    let dataset = Arc::new(FileDataset::load(&args.dataset).await?);
    let mut tests = dataset.tests().to_vec();
    if let Some(limit) = args.tests {
        tests.truncate(limit);
    }

    let client = build_client(&config).context("Failed to build model client")?;
    let store: Arc<dyn CompletionStore> = match &config.run.completions_path {
        Some(path) => Arc::new(
            JsonlCompletionStore::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => Arc::new(NullCompletionStore),
    };

    let ctx = Arc::new(EvolutionContext::new(
        client,
        dataset.clone(),
        store,
        config.provider.kind,
        config.provider.model.clone(),
        config.algorithm.clone(),
    ));
    let runner = EvolutionRunner::with_parts(
        ctx,
        config.run.outer_concurrency,
        EventBus::default(),
        CancellationToken::new(),
    );
    spawn_interrupt_handler(runner.cancellation_token());

    let progress = (!json_mode)
        .then(|| create_progress_bar(u64::try_from(tests.len()).unwrap_or(u64::MAX)));
    let reporter = progress
        .clone()
        .map(|pb| spawn_progress_reporter(runner.events().subscribe(), pb));

    let summary = runner.run(tests).await?;

    if let Some(reporter) = reporter {
        reporter.abort();
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let provider = config.provider.kind.to_string();
    output(
        &RunOutput::new(summary, dataset.name(), &provider, &config.provider.model),
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::GenerationSummary;
    use std::collections::BTreeMap;

    fn summary() -> RunSummary {
        let mut generations = BTreeMap::new();
        generations.insert(0, GenerationSummary { correct: 1, total: 2 });
        generations.insert(1, GenerationSummary { correct: 2, total: 2 });
        RunSummary {
            run_id: "run".to_string(),
            completed: 2,
            failed: vec![FailedTest {
                test_id: "t3".to_string(),
                error: "Provider error: boom".to_string(),
            }],
            generations,
            usage: UsageSnapshot::default(),
        }
    }

    #[test]
    fn test_human_output() {
        let output = RunOutput::new(summary(), "arith", "anthropic", "m");
        let human = output.to_human();

        assert!(human.starts_with(
            "Result: algorithm=EE dataset=arith provider=anthropic model=m generation=0 check=1 total=2"
        ));
        assert!(human.contains("Generation"));
        assert!(human.contains("50.0%"));
        assert!(human.contains("100.0%"));
        assert!(human.contains("t3: Provider error: boom"));
    }

    #[test]
    fn test_json_output() {
        let json = RunOutput::new(summary(), "arith", "anthropic", "m").to_json();
        assert_eq!(json["algorithm"], "EE");
        assert_eq!(json["completed"], 2);
        assert_eq!(json["generations"][1]["correct"], 2);
        assert_eq!(json["failed"][0]["test_id"], "t3");
        assert!(json.get("report_lines").is_none());
    }
}
