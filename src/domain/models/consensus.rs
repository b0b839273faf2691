//! Consensus outcomes recorded per generation.

use serde::{Deserialize, Serialize};

/// Majority answer of a pool and whether it is correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consensus {
    /// Winning answer.
    pub answer: String,
    /// Whether the winning answer is correct.
    pub check: bool,
}

/// Consensus outcome of one test at one generation index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// Generation index the record belongs to.
    pub generation: usize,
    /// Test the record belongs to.
    pub test_id: String,
    /// Consensus answer.
    pub answer: String,
    /// Consensus correctness.
    pub check: bool,
}

impl GenerationRecord {
    /// Record `consensus` for `test_id` at `generation`.
    pub fn new(generation: usize, test_id: impl Into<String>, consensus: Consensus) -> Self {
        Self {
            generation,
            test_id: test_id.into(),
            answer: consensus.answer,
            check: consensus.check,
        }
    }
}

/// Correct and total counts for one generation index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Correct consensus answers.
    pub correct: usize,
    /// Records at this index.
    pub total: usize,
}

impl GenerationSummary {
    /// Fraction correct, 0 when nothing was recorded.
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}
