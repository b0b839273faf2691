//! File-backed datasets
//!
//! A dataset file (YAML or JSON) carries the task instructions, a token
//! budget, worked few-shot examples and the tests to evaluate.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::domain::models::{Example, TestCase, TokenBudget};
use crate::domain::ports::{Dataset, DatasetError};
use crate::services::sampler::seeded_rng;

const ANSWER_MARKER: &str = "ANSWER:";

/// Extract the final answer from a `REASONING: ... ANSWER: ...` completion.
///
/// Returns the trimmed text after the last `ANSWER:` marker, or the last
/// non-empty line when the marker is missing.
pub fn parse_marked_answer(raw: &str) -> String {
    if let Some(pos) = raw.rfind(ANSWER_MARKER) {
        return raw[pos + ANSWER_MARKER.len()..].trim().to_string();
    }
    raw.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn normalize(answer: &str) -> String {
    answer.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// On-disk layout of a dataset file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetFile {
    /// Dataset name used in reports.
    pub name: String,
    /// Task instructions.
    pub instructions: String,
    /// Constraints on each reasoning step.
    #[serde(default)]
    pub reasoning_step_instructions: String,
    /// Completion budget.
    #[serde(default)]
    pub max_tokens: TokenBudget,
    /// Few-shot pool.
    #[serde(default)]
    pub examples: Vec<Example>,
    /// Questions to evaluate.
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

/// Dataset loaded from a YAML or JSON file
#[derive(Debug, Clone)]
pub struct FileDataset {
    file: DatasetFile,
}

impl FileDataset {
    /// Dataset over an already parsed file.
    pub const fn new(file: DatasetFile) -> Self {
        Self { file }
    }

    /// Load a dataset file; `.json` files are parsed as JSON, anything else
    /// as YAML.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let load_error = |reason: String| DatasetError::Load {
            path: path.display().to_string(),
            reason,
        };

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| load_error(e.to_string()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let file: DatasetFile = if is_json {
            serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))?
        } else {
            serde_yaml::from_str(&content).map_err(|e| load_error(e.to_string()))?
        };

        if file.tests.is_empty() {
            return Err(load_error("dataset has no tests".to_string()));
        }

        debug!(
            name = %file.name,
            examples = file.examples.len(),
            tests = file.tests.len(),
            "Loaded dataset"
        );
        Ok(Self::new(file))
    }

    /// Tests in file order.
    pub fn tests(&self) -> &[TestCase] {
        &self.file.tests
    }
}

#[async_trait]
impl Dataset for FileDataset {
    fn name(&self) -> &str {
        &self.file.name
    }

    fn instructions(&self) -> String {
        self.file.instructions.clone()
    }

    fn reasoning_step_instructions(&self) -> String {
        self.file.reasoning_step_instructions.clone()
    }

    fn max_tokens(&self) -> TokenBudget {
        self.file.max_tokens
    }

    /// Up to `count` examples other than `problem`, in an order fixed by
    /// `(problem, iteration)`.
    fn examples(&self, problem: &str, count: usize, iteration: usize) -> Vec<Example> {
        let mut pool: Vec<&Example> = self
            .file
            .examples
            .iter()
            .filter(|e| e.id != problem)
            .collect();

        let mut rng = seeded_rng(&format!("{}-{problem}-{iteration}", self.file.name));
        pool.shuffle(&mut rng);
        pool.into_iter().take(count).cloned().collect()
    }

    fn parse_answer(&self, raw: &str) -> String {
        parse_marked_answer(raw)
    }

    async fn check(&self, test: &TestCase, answer: &str) -> Result<bool, DatasetError> {
        let answer = normalize(answer);
        if answer.is_empty() {
            return Err(DatasetError::Unverifiable(format!(
                "empty answer for {}",
                test.id
            )));
        }
        Ok(answer == normalize(&test.answer))
    }
}
