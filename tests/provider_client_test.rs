//! Provider clients wired through `build_client` against a local HTTP server

use std::sync::Arc;

use exevo::adapters::mock::{MemoryCompletionStore, MockDataset};
use exevo::domain::models::{AlgorithmConfig, Config, Provider, TestCase};
use exevo::infrastructure::llm::build_client;
use exevo::services::{EvolutionContext, EvolutionRunner, PopulationController};

fn config(kind: Provider, base_url: String) -> Config {
    let mut config = Config::default();
    config.provider.kind = kind;
    config.provider.model = "test-model".to_string();
    config.provider.api_key = Some("test-key".to_string());
    config.provider.base_url = Some(base_url);
    config.provider.timeout_secs = 5;
    config.retry.initial_backoff_ms = 1;
    config.retry.max_backoff_ms = 5;
    config.algorithm = AlgorithmConfig {
        n_shot: 2,
        pool_size: 2,
        judgements_depth: 1,
        generations: 0,
        max_crossovers: 3,
        inner_concurrency: 2,
        ..Default::default()
    };
    config
}

fn context(config: &Config) -> (Arc<EvolutionContext>, Arc<MemoryCompletionStore>) {
    let client = build_client(config).unwrap();
    let store = MemoryCompletionStore::new();
    let ctx = Arc::new(EvolutionContext::new(
        client,
        Arc::new(MockDataset::with_generated_examples(4)),
        store.clone(),
        config.provider.kind,
        config.provider.model.clone(),
        config.algorithm.clone(),
    ));
    (ctx, store)
}

#[tokio::test]
async fn test_anthropic_pool_initialization() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"content":[{"type":"text","text":"REASONING:\n6 * 7 = 42\nANSWER: 42"}],
               "usage":{"input_tokens":100,"output_tokens":10}}"#,
        )
        .expect(2)
        .create_async()
        .await;

    let config = config(Provider::Anthropic, server.url());
    let (ctx, store) = context(&config);
    let controller = PopulationController::new(ctx.clone());

    let outcome = controller
        .run_test(&TestCase::new("mul", "What is 6 * 7?", "42"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.records.len(), 2);
    assert!(outcome.consensus.check);

    let usage = ctx.usage.snapshot();
    assert_eq!(usage.completions, 2);
    assert_eq!(usage.input_tokens, 200);
    assert_eq!(usage.output_tokens, 20);

    let records = store.records();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.query.model == "test-model"));
}

#[tokio::test]
async fn test_openai_authentication_failure_abandons_test() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"bad key"}}"#)
        .expect_at_least(1)
        .expect_at_most(2)
        .create_async()
        .await;

    let config = config(Provider::OpenAi, server.url());
    let (ctx, store) = context(&config);

    let summary = EvolutionRunner::new(ctx, 1)
        .run(vec![TestCase::new("mul", "What is 6 * 7?", "42")])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(summary.completed, 0);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].test_id, "mul");
    assert!(summary.generations.is_empty());
    assert!(store.records().is_empty());
}
