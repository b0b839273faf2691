//! Candidate explanations and the per-test pool they live in.

use serde::{Deserialize, Serialize};

/// One member of a generation's pool.
///
/// Candidates are produced by initialization or crossover and are only ever
/// mutated by judgement, which appends to `critiques`. Crossover supersedes a
/// candidate with a brand-new one rather than editing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Full free-text reasoning and answer produced by the model.
    pub explanation: String,

    /// Answer extracted from `explanation` by the dataset parser.
    pub answer: String,

    /// Whether `answer` was judged correct. `false` when the checker failed.
    pub check: bool,

    /// Accumulated judgements, oldest first. Order is replayed into prompts.
    pub critiques: Vec<String>,
}

impl Candidate {
    /// Create a fresh candidate with no critiques.
    pub fn new(explanation: impl Into<String>, answer: impl Into<String>, check: bool) -> Self {
        Self {
            explanation: explanation.into(),
            answer: answer.into(),
            check,
            critiques: Vec::new(),
        }
    }

    /// Append a critique to the history.
    pub fn push_critique(&mut self, critique: impl Into<String>) {
        self.critiques.push(critique.into());
    }

    /// Whether any critique has been recorded.
    pub fn has_critiques(&self) -> bool {
        !self.critiques.is_empty()
    }
}

/// Ordered candidates for one test at one generation.
pub type Pool = Vec<Candidate>;
