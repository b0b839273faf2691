//! Dataset port: prompts, examples, answer parsing and checking.

use async_trait::async_trait;

use super::errors::DatasetError;
use crate::domain::models::{Example, TestCase, TokenBudget};

/// Port trait for a reasoning dataset
///
/// Supplies the fixed instruction text, few-shot examples, the answer parser
/// and the correctness checker consumed by candidate generation.
#[async_trait]
pub trait Dataset: Send + Sync {
    /// Short dataset name used in reports.
    fn name(&self) -> &str;

    /// Task instructions placed at the top of every prompt.
    fn instructions(&self) -> String;

    /// Guidance on how a single reasoning step should look.
    fn reasoning_step_instructions(&self) -> String;

    /// Completion budget for full explanations.
    fn max_tokens(&self) -> TokenBudget;

    /// Few-shot examples for `problem`, varied by `iteration`.
    fn examples(&self, problem: &str, count: usize, iteration: usize) -> Vec<Example>;

    /// Extract the final answer from raw model output.
    fn parse_answer(&self, raw: &str) -> String;

    /// Decide whether `answer` is correct for `test`.
    ///
    /// An error means the answer could not be checked; callers treat it as
    /// incorrect rather than failing.
    async fn check(&self, test: &TestCase, answer: &str) -> Result<bool, DatasetError>;
}
