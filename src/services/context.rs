//! Collaborators shared by candidate generation and judgement.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::usage::UsageStats;
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AlgorithmConfig, ChatMessage, ChatQuery, Completion, Provider, TestCase,
};
use crate::domain::ports::{CompletionClient, CompletionStore, Dataset, StoredCompletion};

/// Name under which results and audit records are reported.
pub const ALGORITHM: &str = "EE";

/// Everything a test's controller needs to talk to the outside world.
///
/// Cheap to share behind an `Arc`; holds no per-test state.
pub struct EvolutionContext {
    /// Model client.
    pub client: Arc<dyn CompletionClient>,
    /// Dataset supplying prompts and checks.
    pub dataset: Arc<dyn Dataset>,
    /// Audit sink.
    pub store: Arc<dyn CompletionStore>,
    /// Provider named in queries.
    pub provider: Provider,
    /// Model named in queries.
    pub model: String,
    /// Algorithm parameters.
    pub config: AlgorithmConfig,
    /// Identifier shared by every audit record of the run.
    pub run_id: Uuid,
    /// Run-wide usage counters.
    pub usage: Arc<UsageStats>,
}

impl EvolutionContext {
    /// Context with a fresh run id and zeroed usage.
    pub fn new(
        client: Arc<dyn CompletionClient>,
        dataset: Arc<dyn Dataset>,
        store: Arc<dyn CompletionStore>,
        provider: Provider,
        model: impl Into<String>,
        config: AlgorithmConfig,
    ) -> Self {
        Self {
            client,
            dataset,
            store,
            provider,
            model: model.into(),
            config,
            run_id: Uuid::new_v4(),
            usage: Arc::new(UsageStats::new()),
        }
    }

    /// Build a query with the configured provider, model and temperature.
    pub fn query(&self, messages: Vec<ChatMessage>, max_tokens: u32) -> ChatQuery {
        ChatQuery {
            provider: self.provider,
            model: self.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens,
        }
    }

    /// Token budget for a full explanation (init and crossover).
    pub fn explanation_max_tokens(&self) -> u32 {
        self.dataset.max_tokens().explanation_tokens()
    }

    /// Invoke the model. Failures propagate to the enclosing batch.
    pub async fn complete(&self, query: &ChatQuery) -> DomainResult<Completion> {
        let completion = self.client.run_completion(query).await?;
        self.usage.record(completion.usage);
        Ok(completion)
    }

    /// Record a raw exchange for audit. Store failures are logged, never raised.
    pub async fn record(
        &self,
        test: &TestCase,
        query: ChatQuery,
        completion: Completion,
        check: bool,
    ) {
        let record = StoredCompletion {
            run_id: self.run_id,
            algorithm: ALGORITHM.to_string(),
            test_id: test.id.clone(),
            query,
            completion,
            check,
            stored_at: Utc::now(),
        };

        match self.store.store(record).await {
            Ok(()) => debug!(test_id = %test.id, check, "Stored completion"),
            Err(e) => warn!(test_id = %test.id, error = %e, "Failed to store completion"),
        }
    }
}
