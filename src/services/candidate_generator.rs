//! Candidate generation: first-generation initialization and crossover.

use std::sync::Arc;
use tracing::{debug, instrument};

use super::context::EvolutionContext;
use super::prompts::{crossover_messages, initialization_messages, task_prompt};
use super::sampler::Sampler;
use crate::domain::errors::DomainResult;
use crate::domain::models::{Candidate, ChatQuery, TestCase};
use crate::domain::ports::Dataset;

/// Check `answer`, treating any checker failure as "not correct".
///
/// A checker error never surfaces past this point: the candidate is simply
/// recorded with `check = false`.
pub async fn checked_or_false(dataset: &dyn Dataset, test: &TestCase, answer: &str) -> bool {
    match dataset.check(test, answer).await {
        Ok(check) => check,
        Err(e) => {
            debug!(test_id = %test.id, error = %e, "Checker failed, treating answer as incorrect");
            false
        }
    }
}

/// Produces new candidates for a test's pool.
pub struct CandidateGenerator {
    ctx: Arc<EvolutionContext>,
    sampler: Sampler,
}

impl CandidateGenerator {
    /// Generator sampling crossover parents under the configured seed tag.
    pub fn new(ctx: Arc<EvolutionContext>) -> Self {
        let sampler = Sampler::new(ctx.config.seed_tag.clone());
        Self { ctx, sampler }
    }

    fn task_prompt(&self) -> String {
        task_prompt(
            &self.ctx.dataset.instructions(),
            &self.ctx.dataset.reasoning_step_instructions(),
        )
    }

    /// Generate a first-generation candidate from few-shot examples.
    #[instrument(skip(self, test), fields(test_id = %test.id))]
    pub async fn initialize(&self, test: &TestCase, iteration: usize) -> DomainResult<Candidate> {
        let n_shot = self.ctx.config.n_shot;
        let examples = self.ctx.dataset.examples(&test.id, n_shot, iteration);
        let messages =
            initialization_messages(&self.task_prompt(), &examples, n_shot, &test.question);

        let query = self
            .ctx
            .query(messages, self.ctx.explanation_max_tokens());
        self.complete_candidate(test, query).await
    }

    /// Recombine sampled parents of `pool` into a new candidate.
    ///
    /// `pool` is the pre-crossover snapshot shared by every iteration of the
    /// round. Parents are chosen deterministically from
    /// `(test.id, generation, iteration)`.
    #[instrument(skip(self, test, pool), fields(test_id = %test.id))]
    pub async fn crossover(
        &self,
        test: &TestCase,
        pool: &[Candidate],
        generation: usize,
        iteration: usize,
    ) -> DomainResult<Candidate> {
        let indices = self.sampler.select_parents(
            &test.id,
            generation,
            iteration,
            pool.len(),
            self.ctx.config.max_crossovers,
        );
        debug!(?indices, "Selected crossover parents");

        let parents: Vec<&Candidate> = indices.iter().filter_map(|&i| pool.get(i)).collect();
        let messages = crossover_messages(&self.task_prompt(), &test.question, &parents);

        let query = self
            .ctx
            .query(messages, self.ctx.explanation_max_tokens());
        self.complete_candidate(test, query).await
    }

    /// Shared tail: invoke, parse, check, record.
    async fn complete_candidate(&self, test: &TestCase, query: ChatQuery) -> DomainResult<Candidate> {
        let completion = self.ctx.complete(&query).await?;

        let answer = self.ctx.dataset.parse_answer(&completion.content);
        let check = checked_or_false(self.ctx.dataset.as_ref(), test, &answer).await;
        debug!(answer = %answer, check, "Generated candidate");

        let candidate = Candidate::new(completion.content.clone(), answer, check);
        self.ctx.record(test, query, completion, check).await;

        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{
        CheckBehavior, MemoryCompletionStore, MockCompletionClient, MockDataset,
    };
    use crate::domain::errors::DomainError;
    use crate::domain::models::{AlgorithmConfig, Provider, Role};

    fn context(
        client: Arc<MockCompletionClient>,
        dataset: MockDataset,
        store: Arc<MemoryCompletionStore>,
    ) -> Arc<EvolutionContext> {
        Arc::new(EvolutionContext::new(
            client,
            Arc::new(dataset),
            store,
            Provider::Mock,
            "mock-model",
            AlgorithmConfig::default(),
        ))
    }

    fn test_case() -> TestCase {
        TestCase::new("p1", "What is 21 * 2?", "42")
    }

    #[tokio::test]
    async fn test_initialize_parses_and_checks() {
        let client = Arc::new(MockCompletionClient::fixed("REASONING:\n21 * 2 = 42\nANSWER: 42"));
        let store = MemoryCompletionStore::new();
        let ctx = context(client.clone(), MockDataset::with_generated_examples(10), store.clone());
        let generator = CandidateGenerator::new(ctx);

        let candidate = generator.initialize(&test_case(), 0).await.unwrap();

        assert_eq!(candidate.answer, "42");
        assert!(candidate.check);
        assert!(candidate.critiques.is_empty());

        let queries = client.queries();
        assert_eq!(queries.len(), 1);
        assert!((queries[0].temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(queries[0].max_tokens, 64 * 8);
        // system + 4 replayed pairs + question
        assert_eq!(queries[0].messages.len(), 10);
        assert_eq!(queries[0].messages[0].role, Role::System);

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].test_id, "p1");
        assert!(records[0].check);
    }

    #[tokio::test]
    async fn test_checker_failure_yields_false() {
        let client = Arc::new(MockCompletionClient::fixed("REASONING:\nx\nANSWER: 42"));
        let dataset =
            MockDataset::with_generated_examples(10).with_check_behavior(CheckBehavior::AlwaysFails);
        let ctx = context(client, dataset, MemoryCompletionStore::new());
        let generator = CandidateGenerator::new(ctx);

        let initialized = generator.initialize(&test_case(), 0).await.unwrap();
        assert!(!initialized.check);

        let pool = vec![initialized.clone(), initialized.clone(), initialized];
        let crossed = generator.crossover(&test_case(), &pool, 0, 0).await.unwrap();
        assert!(!crossed.check);
        assert_eq!(crossed.answer, "42");
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let client = Arc::new(MockCompletionClient::failing("overloaded"));
        let ctx = context(
            client,
            MockDataset::with_generated_examples(10),
            MemoryCompletionStore::new(),
        );
        let generator = CandidateGenerator::new(ctx);

        let err = generator.initialize(&test_case(), 0).await.unwrap_err();
        assert!(matches!(err, DomainError::Completion(_)));
    }

    #[tokio::test]
    async fn test_crossover_drops_critiques_and_replays_parents() {
        let client = Arc::new(MockCompletionClient::fixed("REASONING:\nmerged\nANSWER: 42"));
        let ctx = context(
            client.clone(),
            MockDataset::with_generated_examples(10),
            MemoryCompletionStore::new(),
        );
        let generator = CandidateGenerator::new(ctx);

        let mut parent = Candidate::new("parent explanation", "41", false);
        parent.push_critique("off by one");
        let pool = vec![parent.clone(), parent.clone(), parent.clone(), parent];

        let child = generator.crossover(&test_case(), &pool, 1, 2).await.unwrap();
        assert!(child.critiques.is_empty());
        assert_eq!(child.answer, "42");

        let query = &client.queries()[0];
        assert_eq!(query.messages.len(), 2);
        assert!(query.messages[1].content.contains("parent explanation"));
        assert!(query.messages[1].content.contains("EXPERT JUDGEMENT 0 0:\n\noff by one"));
    }

    #[tokio::test]
    async fn test_crossover_is_reproducible() {
        let client = Arc::new(MockCompletionClient::fixed("REASONING:\nm\nANSWER: 1"));
        let ctx = context(
            client.clone(),
            MockDataset::with_generated_examples(10),
            MemoryCompletionStore::new(),
        );
        let generator = CandidateGenerator::new(ctx);
        let pool: Vec<Candidate> = (0..8)
            .map(|i| Candidate::new(format!("explanation {i}"), i.to_string(), false))
            .collect();

        generator.crossover(&test_case(), &pool, 3, 5).await.unwrap();
        generator.crossover(&test_case(), &pool, 3, 5).await.unwrap();

        let queries = client.queries();
        assert_eq!(queries[0].messages, queries[1].messages);
    }
}
