//! Domain errors for the explanation-evolution core.

use thiserror::Error;

use super::ports::CompletionError;

/// Domain-level errors that can occur while evolving a test's pool.
///
/// Every variant is fatal to the single test being processed; the runner
/// isolates it from sibling tests.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A batch produced the wrong number of candidates.
    #[error("Invalid pool size: expected {expected}, got {actual}")]
    PoolSizeMismatch {
        /// Configured pool size.
        expected: usize,
        /// Candidates produced.
        actual: usize,
    },

    /// Members sharing an answer disagree on its correctness.
    #[error("Inconsistent check for answer {answer:?}: identical answers judged differently")]
    InconsistentCheck {
        /// Answer with conflicting verdicts.
        answer: String,
    },

    /// Consensus was requested over no candidates.
    #[error("Cannot resolve consensus of an empty pool")]
    EmptyPool,

    /// The model invocation failed.
    #[error("Completion failed: {0}")]
    Completion(String),

    /// A spawned unit could not run to completion.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The run was cancelled.
    #[error("Processing cancelled")]
    Cancelled,
}

impl DomainError {
    /// Whether this error reports a broken pool or consensus invariant.
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::PoolSizeMismatch { .. } | Self::InconsistentCheck { .. } | Self::EmptyPool
        )
    }
}

/// Result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<CompletionError> for DomainError {
    fn from(err: CompletionError) -> Self {
        Self::Completion(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_classification() {
        assert!(DomainError::PoolSizeMismatch {
            expected: 8,
            actual: 7
        }
        .is_invariant_violation());
        assert!(DomainError::InconsistentCheck {
            answer: "42".to_string()
        }
        .is_invariant_violation());
        assert!(!DomainError::Completion("boom".to_string()).is_invariant_violation());
        assert!(!DomainError::Cancelled.is_invariant_violation());
    }

    #[test]
    fn test_error_messages() {
        let err = DomainError::PoolSizeMismatch {
            expected: 8,
            actual: 6,
        };
        assert_eq!(err.to_string(), "Invalid pool size: expected 8, got 6");
    }
}
