//! Dataset-facing value types: tests, few-shot examples, token budgets.

use serde::{Deserialize, Serialize};

/// A test question supplied by a dataset. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Problem identifier, unique within a dataset.
    pub id: String,

    /// Question text shown to the model.
    pub question: String,

    /// Ground-truth answer, consumed only by the dataset checker.
    pub answer: String,
}

impl TestCase {
    /// Test with the given identifier, question and ground truth.
    pub fn new(id: impl Into<String>, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A fully worked few-shot example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// Example identifier, excluded when it equals the problem.
    #[serde(default)]
    pub id: String,
    /// Question text.
    pub question: String,
    /// Reasoning steps, one per line.
    pub reasoning: Vec<String>,
    /// Final answer.
    pub answer: String,
}

/// Per-dataset completion budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    /// Tokens allowed per reasoning step.
    pub reasoning_step: u32,

    /// Maximum number of reasoning steps.
    pub max_step_count: u32,
}

impl TokenBudget {
    /// Budget for a full explanation: per-step tokens times step count.
    pub const fn explanation_tokens(&self) -> u32 {
        self.reasoning_step.saturating_mul(self.max_step_count)
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            reasoning_step: 256,
            max_step_count: 16,
        }
    }
}
