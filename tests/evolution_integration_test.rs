//! End-to-end tests for evolution runs
//!
//! These drive the public API with a scripted model: file-backed datasets,
//! the JSONL audit store, the outer runner and the per-test controller.

mod common;

use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;
use tokio_util::sync::CancellationToken;

use common::{arithmetic_tests, dataset_file, learning_client, mock_context, small_config};
use exevo::adapters::mock::{CheckBehavior, MockCompletionClient, MockDataset};
use exevo::domain::models::{Completion, GenerationSummary, Provider, TestCase};
use exevo::domain::ports::{CompletionError, StoredCompletion};
use exevo::infrastructure::dataset::FileDataset;
use exevo::infrastructure::store::JsonlCompletionStore;
use exevo::services::{EventBus, EvolutionContext, EvolutionEvent, EvolutionRunner, PopulationController};

#[tokio::test]
async fn test_run_over_file_dataset() {
    let (dir, dataset_path) = dataset_file();
    let dataset = Arc::new(FileDataset::load(&dataset_path).await.unwrap());
    let audit_path = dir.path().join("audit").join("completions.jsonl");
    let store = Arc::new(JsonlCompletionStore::open(&audit_path).await.unwrap());
    let client = Arc::new(learning_client());

    let ctx = Arc::new(EvolutionContext::new(
        client.clone(),
        dataset.clone(),
        store,
        Provider::Mock,
        "mock-model",
        small_config(),
    ));
    let runner = EvolutionRunner::new(ctx, 2);

    let summary = runner.run(dataset.tests().to_vec()).await.unwrap();

    assert_eq!(summary.completed, 3);
    assert!(summary.failed.is_empty());
    // "7 + 8" is only answered correctly once crossover has seen a critique
    assert_eq!(summary.generations[&0], GenerationSummary { correct: 2, total: 3 });
    assert_eq!(summary.generations[&1], GenerationSummary { correct: 3, total: 3 });
    assert_eq!(summary.generations[&2], GenerationSummary { correct: 3, total: 3 });

    // per test: 3 initial + 2 generations of (3 judgements + 3 crossovers)
    assert_eq!(client.call_count(), 45);
    assert_eq!(summary.usage.completions, 45);

    let lines = summary.report_lines("arith", "mock", "mock-model");
    assert_eq!(
        lines[1],
        "Result: algorithm=EE dataset=arith provider=mock model=mock-model generation=1 check=3 total=3"
    );

    let audit = tokio::fs::read_to_string(&audit_path).await.unwrap();
    let records: Vec<StoredCompletion> = audit
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 45);
    assert!(records.iter().all(|r| r.algorithm == "EE"));
    assert!(records.iter().all(|r| r.run_id.to_string() == summary.run_id));

    let judgements: Vec<_> = records
        .iter()
        .filter(|r| r.completion.content.starts_with("Step 1 is wrong"))
        .collect();
    assert_eq!(judgements.len(), 18);
    assert!(judgements.iter().all(|r| !r.check));
}

#[tokio::test]
async fn test_controller_records_every_generation() {
    let client = Arc::new(learning_client());
    let (ctx, _store) = mock_context(client, small_config());
    let controller = PopulationController::new(ctx);

    let test = TestCase::new("add-hard", "What is 7 + 8?", "15");
    let outcome = controller.run_test(&test).await.unwrap();

    let generations: Vec<usize> = outcome.records.iter().map(|r| r.generation).collect();
    let checks: Vec<bool> = outcome.records.iter().map(|r| r.check).collect();
    assert_eq!(generations, vec![0, 1, 2]);
    assert_eq!(checks, vec![false, true, true]);
    assert_eq!(outcome.records[0].answer, "16");
    assert_eq!(outcome.consensus.answer, "15");
    assert!(outcome.consensus.check);
}

#[tokio::test]
async fn test_correct_answers_survive_crossover() {
    let (_dir, dataset_path) = dataset_file();
    let dataset = Arc::new(FileDataset::load(&dataset_path).await.unwrap());
    let ctx = Arc::new(EvolutionContext::new(
        Arc::new(learning_client()),
        dataset.clone(),
        Arc::new(exevo::domain::ports::NullCompletionStore),
        Provider::Mock,
        "mock-model",
        small_config(),
    ));
    let controller = PopulationController::new(ctx);

    // Every crossover prompt quotes critiques that mention "7 + 8".
    let test = dataset.tests()[0].clone();
    assert_eq!(test.id, "add-small");
    let outcome = controller.run_test(&test).await.unwrap();

    for record in &outcome.records {
        assert_eq!(record.answer, "42", "generation {}", record.generation);
        assert!(record.check);
    }
}

#[tokio::test]
async fn test_events_describe_the_run() {
    let client = Arc::new(learning_client());
    let (ctx, _store) = mock_context(client, small_config());
    let events = EventBus::new(1024);
    let mut receiver = events.subscribe();
    let runner = EvolutionRunner::with_parts(ctx, 1, events, CancellationToken::new());

    let test = TestCase::new("add-hard", "What is 7 + 8?", "15");
    runner.run(vec![test]).await.unwrap();

    let mut seen = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => seen.push(event),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }

    assert_eq!(
        seen.first(),
        Some(&EvolutionEvent::TestStarted {
            test_id: "add-hard".to_string()
        })
    );
    assert!(seen.contains(&EvolutionEvent::PoolInitialized {
        test_id: "add-hard".to_string(),
        pool_size: 3,
        correct: 0,
    }));
    let crossovers = seen
        .iter()
        .filter(|e| matches!(e, EvolutionEvent::CrossoverCompleted { .. }))
        .count();
    assert_eq!(crossovers, 2);
    assert_eq!(
        seen.last(),
        Some(&EvolutionEvent::TestCompleted {
            test_id: "add-hard".to_string(),
            answer: "15".to_string(),
            check: true,
        })
    );
}

#[tokio::test]
async fn test_checker_failures_count_as_incorrect() {
    let client = Arc::new(MockCompletionClient::fixed("REASONING:\nx\nANSWER: 42"));
    let ctx = Arc::new(EvolutionContext::new(
        client,
        Arc::new(
            MockDataset::with_generated_examples(4).with_check_behavior(CheckBehavior::AlwaysFails),
        ),
        Arc::new(exevo::domain::ports::NullCompletionStore),
        Provider::Mock,
        "mock-model",
        small_config(),
    ));

    let summary = EvolutionRunner::new(ctx, 2)
        .run(arithmetic_tests())
        .await
        .unwrap();

    assert_eq!(summary.completed, 3);
    for generation in 0..=2 {
        assert_eq!(
            summary.generations[&generation],
            GenerationSummary { correct: 0, total: 3 }
        );
    }
}

#[tokio::test]
async fn test_model_outage_on_one_test_is_isolated() {
    let client = Arc::new(MockCompletionClient::with_responder(|query| {
        let mentions = |q: &str| query.messages.iter().any(|m| m.content.contains(q));
        if mentions("100 + 23") {
            Err(CompletionError::ApiError("overloaded".to_string()))
        } else {
            Ok(Completion::new("REASONING:\nx\nANSWER: 42"))
        }
    }));
    let (ctx, store) = mock_context(client, small_config());

    let summary = EvolutionRunner::new(ctx, 3)
        .run(arithmetic_tests())
        .await
        .unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].test_id, "add-large");
    assert!(summary.failed[0].error.contains("overloaded"));
    // only "20 + 22" has 42 as its answer
    assert_eq!(summary.generations[&0], GenerationSummary { correct: 1, total: 2 });
    assert!(store.records().iter().all(|r| r.test_id != "add-large"));
}
