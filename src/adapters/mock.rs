//! Mock collaborators for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::models::{ChatQuery, Completion, Example, TestCase, TokenBudget};
use crate::domain::ports::{
    CompletionClient, CompletionError, CompletionStore, Dataset, DatasetError, StoreError,
    StoredCompletion,
};
use crate::infrastructure::dataset::parse_marked_answer;

type Responder = dyn Fn(&ChatQuery) -> Result<Completion, CompletionError> + Send + Sync;

/// Scripted completion client that records every query it receives.
pub struct MockCompletionClient {
    responder: Box<Responder>,
    queries: Mutex<Vec<ChatQuery>>,
    delay: Option<Duration>,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl MockCompletionClient {
    /// Answer every query with a computed completion.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&ChatQuery) -> Result<Completion, CompletionError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            queries: Mutex::new(Vec::new()),
            delay: None,
            active: AtomicUsize::new(0),
            peak_active: AtomicUsize::new(0),
        }
    }

    /// Answer every query with the same text.
    pub fn fixed(content: impl Into<String>) -> Self {
        let content = content.into();
        Self::with_responder(move |_| Ok(Completion::new(content.clone())))
    }

    /// Fail every query.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_responder(move |_| Err(CompletionError::ApiError(message.clone())))
    }

    /// Sleep before answering, to make concurrency observable.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every query received so far, in arrival order.
    pub fn queries(&self) -> Vec<ChatQuery> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    /// Number of queries received.
    pub fn call_count(&self) -> usize {
        self.queries.lock().map(|q| q.len()).unwrap_or_default()
    }

    /// Highest number of queries observed in flight at once.
    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn run_completion(&self, query: &ChatQuery) -> Result<Completion, CompletionError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        (self.responder)(query)
    }
}

/// How [`MockDataset`] answers `check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckBehavior {
    /// Compare against the test's ground truth.
    Exact,
    /// Every check fails with an error.
    AlwaysFails,
}

/// In-memory dataset with a configurable checker.
pub struct MockDataset {
    examples: Vec<Example>,
    budget: TokenBudget,
    behavior: CheckBehavior,
}

impl MockDataset {
    /// In-memory dataset over `examples`.
    pub fn new(examples: Vec<Example>) -> Self {
        Self {
            examples,
            budget: TokenBudget {
                reasoning_step: 64,
                max_step_count: 8,
            },
            behavior: CheckBehavior::Exact,
        }
    }

    /// Dataset with `count` generated arithmetic examples.
    pub fn with_generated_examples(count: usize) -> Self {
        let examples = (0..count)
            .map(|i| Example {
                id: format!("ex{i}"),
                question: format!("What is {i} + {i}?"),
                reasoning: vec![format!("{i} + {i} = {}", i * 2)],
                answer: (i * 2).to_string(),
            })
            .collect();
        Self::new(examples)
    }

    /// Make `check` behave as `behavior`.
    #[must_use]
    pub const fn with_check_behavior(mut self, behavior: CheckBehavior) -> Self {
        self.behavior = behavior;
        self
    }
}

#[async_trait]
impl Dataset for MockDataset {
    fn name(&self) -> &str {
        "mock"
    }

    fn instructions(&self) -> String {
        "Answer the arithmetic question.".to_string()
    }

    fn reasoning_step_instructions(&self) -> String {
        "Each step is a single equation.".to_string()
    }

    fn max_tokens(&self) -> TokenBudget {
        self.budget
    }

    fn examples(&self, problem: &str, count: usize, _iteration: usize) -> Vec<Example> {
        self.examples
            .iter()
            .filter(|e| e.id != problem)
            .take(count)
            .cloned()
            .collect()
    }

    fn parse_answer(&self, raw: &str) -> String {
        parse_marked_answer(raw)
    }

    async fn check(&self, test: &TestCase, answer: &str) -> Result<bool, DatasetError> {
        match self.behavior {
            CheckBehavior::Exact => Ok(answer == test.answer),
            CheckBehavior::AlwaysFails => Err(DatasetError::Unverifiable(format!(
                "checker unavailable for {}",
                test.id
            ))),
        }
    }
}

/// Store keeping every record in memory.
#[derive(Default)]
pub struct MemoryCompletionStore {
    records: Mutex<Vec<StoredCompletion>>,
}

impl MemoryCompletionStore {
    /// Empty shared store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every record stored so far.
    pub fn records(&self) -> Vec<StoredCompletion> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionStore for MemoryCompletionStore {
    async fn store(&self, record: StoredCompletion) -> Result<(), StoreError> {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
        Ok(())
    }
}
