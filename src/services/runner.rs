//! Multi-test orchestration.
//!
//! Tests run as independent spawned tasks, at most `outer_concurrency` at a
//! time. A failing test is logged and reported but never disturbs its
//! siblings; only successful tests contribute records to the aggregate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::aggregator::{self, ResultsAggregator};
use super::context::EvolutionContext;
use super::events::{EventBus, EvolutionEvent};
use super::evolution_loop::{PopulationController, TestOutcome};
use super::usage::UsageSnapshot;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GenerationSummary, TestCase};

/// A test that was abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTest {
    /// Test that was abandoned.
    pub test_id: String,
    /// Error that abandoned it.
    pub error: String,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run identifier, matching the audit records.
    pub run_id: String,
    /// Tests that finished.
    pub completed: usize,
    /// Tests that were abandoned.
    pub failed: Vec<FailedTest>,
    /// Accuracy per generation index.
    pub generations: BTreeMap<usize, GenerationSummary>,
    /// Completion and token counts.
    pub usage: UsageSnapshot,
}

impl RunSummary {
    /// One `Result:` line per generation index.
    pub fn report_lines(&self, dataset: &str, provider: &str, model: &str) -> Vec<String> {
        aggregator::report_lines(&self.generations, dataset, provider, model)
    }
}

/// Runs many tests concurrently and aggregates their consensus records.
pub struct EvolutionRunner {
    controller: Arc<PopulationController>,
    ctx: Arc<EvolutionContext>,
    aggregator: ResultsAggregator,
    events: EventBus,
    cancel: CancellationToken,
    outer_concurrency: usize,
}

impl EvolutionRunner {
    /// Runner with its own event bus and cancellation token.
    pub fn new(ctx: Arc<EvolutionContext>, outer_concurrency: usize) -> Self {
        Self::with_parts(ctx, outer_concurrency, EventBus::default(), CancellationToken::new())
    }

    /// Runner publishing on `events` and stopping when `cancel` fires.
    pub fn with_parts(
        ctx: Arc<EvolutionContext>,
        outer_concurrency: usize,
        events: EventBus,
        cancel: CancellationToken,
    ) -> Self {
        let controller = PopulationController::new(ctx.clone())
            .with_events(events.clone())
            .with_cancellation(cancel.clone());
        Self {
            controller: Arc::new(controller),
            ctx,
            aggregator: ResultsAggregator::new(),
            events,
            cancel,
            outer_concurrency: outer_concurrency.max(1),
        }
    }

    /// Bus the run publishes on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Records of completed tests.
    pub fn aggregator(&self) -> &ResultsAggregator {
        &self.aggregator
    }

    /// Token that cancels the run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Evolve every test and summarize the successful ones.
    pub async fn run(&self, tests: Vec<TestCase>) -> DomainResult<RunSummary> {
        info!(
            run_id = %self.ctx.run_id,
            tests = tests.len(),
            outer_concurrency = self.outer_concurrency,
            "Starting evolution run"
        );

        let semaphore = Arc::new(Semaphore::new(self.outer_concurrency));
        let mut handles = Vec::with_capacity(tests.len());

        for test in tests {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| DomainError::ExecutionFailed("Semaphore closed".to_string()))?;

            let controller = self.controller.clone();
            let test_id = test.id.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                controller.run_test(&test).await
            });
            handles.push((test_id, handle));
        }

        let mut completed = 0;
        let mut failed = Vec::new();
        for (test_id, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(DomainError::ExecutionFailed(format!("Test task aborted: {e}"))),
            };

            match result {
                Ok(outcome) => {
                    self.complete(outcome).await;
                    completed += 1;
                }
                Err(e) => {
                    error!(test_id = %test_id, error = %e, "Test abandoned");
                    self.events.publish(EvolutionEvent::TestFailed {
                        test_id: test_id.clone(),
                        error: e.to_string(),
                    });
                    failed.push(FailedTest {
                        test_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        let summary = RunSummary {
            run_id: self.ctx.run_id.to_string(),
            completed,
            failed,
            generations: self.aggregator.summarize().await,
            usage: self.ctx.usage.snapshot(),
        };

        info!(
            completed = summary.completed,
            failed = summary.failed.len(),
            completions = summary.usage.completions,
            "Evolution run finished"
        );

        Ok(summary)
    }

    async fn complete(&self, outcome: TestOutcome) {
        info!(
            test_id = %outcome.test_id,
            answer = %outcome.consensus.answer,
            check = outcome.consensus.check,
            "Test completed"
        );
        self.events.publish(EvolutionEvent::TestCompleted {
            test_id: outcome.test_id.clone(),
            answer: outcome.consensus.answer.clone(),
            check: outcome.consensus.check,
        });
        self.aggregator.merge(outcome.records).await;
    }
}
