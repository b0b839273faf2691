//! Common test utilities for integration tests
//!
//! Shared fixtures: a scripted "model" that answers arithmetic questions,
//! small algorithm configurations and dataset files.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use exevo::adapters::mock::{MemoryCompletionStore, MockCompletionClient, MockDataset};
use exevo::domain::models::{AlgorithmConfig, ChatQuery, Completion, Provider, TestCase};
use exevo::services::EvolutionContext;

pub const DATASET_YAML: &str = r#"
name: arith
instructions: Answer the arithmetic question with a single integer.
reasoning_step_instructions: Each step is one equation.
max_tokens:
  reasoning_step: 32
  max_step_count: 8
examples:
  - id: ex1
    question: "What is 1 + 1?"
    reasoning: ["1 + 1 = 2"]
    answer: "2"
  - id: ex2
    question: "What is 2 + 3?"
    reasoning: ["2 + 3 = 5"]
    answer: "5"
  - id: ex3
    question: "What is 4 + 4?"
    reasoning: ["4 + 4 = 8"]
    answer: "8"
  - id: ex4
    question: "What is 6 + 1?"
    reasoning: ["6 + 1 = 7"]
    answer: "7"
tests:
  - id: add-small
    question: "What is 20 + 22?"
    answer: "42"
  - id: add-large
    question: "What is 100 + 23?"
    answer: "123"
  - id: add-hard
    question: "What is 7 + 8?"
    answer: "15"
"#;

/// Write the arithmetic dataset to a temporary YAML file.
pub fn dataset_file() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("arith.yaml");
    std::fs::write(&path, DATASET_YAML).expect("Failed to write dataset");
    (dir, path)
}

fn is_crossover(query: &ChatQuery) -> bool {
    query
        .messages
        .get(1)
        .is_some_and(|m| m.content.starts_with("EXPLANATION 0"))
}

fn is_judgement(query: &ChatQuery) -> bool {
    query
        .messages
        .get(1)
        .is_some_and(|m| m.content.starts_with("The explanation to comment/judge"))
}

/// A model that gets "7 + 8" wrong on first try and fixes it after critique.
///
/// Every other question is answered correctly from the start.
pub fn learning_client() -> MockCompletionClient {
    MockCompletionClient::with_responder(|query| {
        if is_judgement(query) {
            return Ok(Completion::new("Step 1 is wrong: 7 + 8 = 15."));
        }

        // Only the question itself counts; critiques quoted in crossover
        // prompts mention other operands.
        let asked = |q: &str| {
            query.messages[0].content.contains(&format!("<Question>\nWhat is {q}?"))
                || query
                    .messages
                    .last()
                    .is_some_and(|m| m.content == format!("QUESTION: What is {q}?"))
        };

        let answer = if asked("7 + 8") {
            if is_crossover(query) { "15" } else { "16" }
        } else if asked("20 + 22") {
            "42"
        } else if asked("100 + 23") {
            "123"
        } else {
            "0"
        };
        Ok(Completion::new(format!("REASONING:\ncompute\nANSWER: {answer}")))
    })
}

pub fn small_config() -> AlgorithmConfig {
    AlgorithmConfig {
        n_shot: 2,
        pool_size: 3,
        judgements_depth: 1,
        generations: 2,
        max_crossovers: 3,
        inner_concurrency: 2,
        ..Default::default()
    }
}

pub fn mock_context(
    client: Arc<MockCompletionClient>,
    config: AlgorithmConfig,
) -> (Arc<EvolutionContext>, Arc<MemoryCompletionStore>) {
    let store = MemoryCompletionStore::new();
    let ctx = Arc::new(EvolutionContext::new(
        client,
        Arc::new(MockDataset::with_generated_examples(6)),
        store.clone(),
        Provider::Mock,
        "mock-model",
        config,
    ));
    (ctx, store)
}

pub fn arithmetic_tests() -> Vec<TestCase> {
    vec![
        TestCase::new("add-small", "What is 20 + 22?", "42"),
        TestCase::new("add-large", "What is 100 + 23?", "123"),
        TestCase::new("add-hard", "What is 7 + 8?", "15"),
    ]
}
