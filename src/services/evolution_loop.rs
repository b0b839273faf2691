//! Population lifecycle for a single test.
//!
//! Drives one test through its state machine:
//! 1. Init: generate `pool_size` candidates from few-shot prompts
//! 2. Evolve: for each generation, judge the pool `judgements_depth` times
//!    and replace it with its crossover offspring
//! 3. Record: consensus is recorded for every generation index
//!
//! Phases are strictly sequential; work inside a phase runs through a
//! [`BoundedExecutor`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::candidate_generator::CandidateGenerator;
use super::consensus::{correct_members, resolve};
use super::context::EvolutionContext;
use super::events::{EventBus, EvolutionEvent};
use super::executor::BoundedExecutor;
use super::judgement::JudgementEngine;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Candidate, Consensus, GenerationRecord, Pool, TestCase};

/// Result of a fully processed test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Test that was evolved.
    pub test_id: String,
    /// Consensus records in recording order.
    pub records: Vec<GenerationRecord>,
    /// Consensus of the final pool.
    pub consensus: Consensus,
}

/// Fail unless `pool` holds exactly `expected` candidates.
pub fn ensure_pool_size(pool: &[Candidate], expected: usize) -> DomainResult<()> {
    if pool.len() == expected {
        Ok(())
    } else {
        Err(DomainError::PoolSizeMismatch {
            expected,
            actual: pool.len(),
        })
    }
}

/// Per-test population controller.
pub struct PopulationController {
    ctx: Arc<EvolutionContext>,
    generator: CandidateGenerator,
    judgement: JudgementEngine,
    events: EventBus,
    cancel: CancellationToken,
}

impl PopulationController {
    /// Controller over `ctx` with a private event bus and no cancellation.
    pub fn new(ctx: Arc<EvolutionContext>) -> Self {
        Self {
            generator: CandidateGenerator::new(ctx.clone()),
            judgement: JudgementEngine::new(ctx.clone()),
            ctx,
            events: EventBus::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Publish lifecycle events on `events`.
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Abandon in-flight batches when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Fresh executor per batch.
    fn executor(&self) -> BoundedExecutor {
        BoundedExecutor::new(self.ctx.config.inner_concurrency)
            .with_cancellation(self.cancel.clone())
    }

    /// Evolve one test's pool to completion.
    ///
    /// Any error abandons the test; nothing is returned for partial pools.
    #[instrument(skip_all, fields(test_id = %test.id))]
    pub async fn run_test(&self, test: &TestCase) -> DomainResult<TestOutcome> {
        self.events.publish(EvolutionEvent::TestStarted {
            test_id: test.id.clone(),
        });

        let result = self.evolve(test).await;

        if let Err(e) = &result {
            if e.is_invariant_violation() {
                warn!(error = %e, "Invariant violated, abandoning test");
                self.events.publish(EvolutionEvent::InvariantViolated {
                    test_id: test.id.clone(),
                    reason: e.to_string(),
                });
            }
        }

        result
    }

    async fn evolve(&self, test: &TestCase) -> DomainResult<TestOutcome> {
        let generations = self.ctx.config.generations;

        let mut pool = self.initialize_pool(test).await?;

        // The initial pool is generation 0's precursor state.
        let mut records = Vec::with_capacity(generations + 2);
        records.push(self.consensus_record(test, &pool, 0)?);

        for generation in 0..generations {
            self.events.publish(EvolutionEvent::GenerationStarted {
                test_id: test.id.clone(),
                generation,
            });
            if generation > 0 {
                records.push(self.consensus_record(test, &pool, generation)?);
            }

            for round in 0..self.ctx.config.judgements_depth {
                self.judge_round(test, &mut pool).await?;
                self.events.publish(EvolutionEvent::JudgeRoundCompleted {
                    test_id: test.id.clone(),
                    generation,
                    round,
                });
            }

            pool = self.crossover_round(test, &pool, generation).await?;
            self.events.publish(EvolutionEvent::CrossoverCompleted {
                test_id: test.id.clone(),
                generation,
            });
        }

        let last = self.consensus_record(test, &pool, generations)?;
        let consensus = Consensus {
            answer: last.answer.clone(),
            check: last.check,
        };
        records.push(last);

        info!(
            answer = %consensus.answer,
            check = consensus.check,
            usage = ?self.ctx.usage.snapshot(),
            "Test evolved"
        );

        Ok(TestOutcome {
            test_id: test.id.clone(),
            records,
            consensus,
        })
    }

    async fn initialize_pool(&self, test: &TestCase) -> DomainResult<Pool> {
        let pool_size = self.ctx.config.pool_size;
        let pool = self
            .executor()
            .run((0..pool_size).map(|iteration| self.generator.initialize(test, iteration)))
            .await?;
        ensure_pool_size(&pool, pool_size)?;

        self.events.publish(EvolutionEvent::PoolInitialized {
            test_id: test.id.clone(),
            pool_size: pool.len(),
            correct: correct_members(&pool),
        });
        Ok(pool)
    }

    /// One judge round: every member critiqued concurrently.
    ///
    /// Each candidate's critique list is private to its unit, so concurrent
    /// judgements never observe each other.
    async fn judge_round(&self, test: &TestCase, pool: &mut Pool) -> DomainResult<()> {
        self.executor()
            .run(
                pool.iter_mut()
                    .map(|candidate| self.judgement.judge(test, candidate)),
            )
            .await?;
        Ok(())
    }

    /// One crossover round over the unmutated pre-crossover snapshot.
    async fn crossover_round(
        &self,
        test: &TestCase,
        snapshot: &[Candidate],
        generation: usize,
    ) -> DomainResult<Pool> {
        let pool_size = self.ctx.config.pool_size;
        let offspring = self
            .executor()
            .run((0..pool_size).map(|iteration| {
                self.generator
                    .crossover(test, snapshot, generation, iteration)
            }))
            .await?;
        ensure_pool_size(&offspring, pool_size)?;
        Ok(offspring)
    }

    fn consensus_record(
        &self,
        test: &TestCase,
        pool: &[Candidate],
        generation: usize,
    ) -> DomainResult<GenerationRecord> {
        let consensus = resolve(pool)?;
        let correct = correct_members(pool);

        info!(
            generation,
            correct,
            pool_size = pool.len(),
            check = consensus.check,
            "Consensus computed"
        );
        self.events.publish(EvolutionEvent::ConsensusComputed {
            test_id: test.id.clone(),
            generation,
            answer: consensus.answer.clone(),
            check: consensus.check,
            correct,
            pool_size: pool.len(),
        });

        Ok(GenerationRecord::new(generation, test.id.clone(), consensus))
    }
}
