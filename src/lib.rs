//! Exevo - Evolutionary Explanation Refinement
//!
//! Exevo evaluates a language model on a reasoning dataset by evolving, per
//! test question, a pool of candidate explanations: candidates are generated
//! from few-shot prompts, critiqued by the model acting as a judge, and
//! recombined by crossover. Majority-vote accuracy is reported for every
//! generation.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Candidates, tests, configuration, port traits and errors
//! - **Service Layer** (`services`): The evolutionary algorithm and run orchestration
//! - **Infrastructure Layer** (`infrastructure`): Provider clients, datasets, stores, config, logging
//! - **Adapters** (`adapters`): In-memory collaborators for tests
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use exevo::{EvolutionContext, EvolutionRunner};
//!
//! let ctx = Arc::new(EvolutionContext::new(client, dataset, store, provider, model, config));
//! let summary = EvolutionRunner::new(ctx, 4).run(tests).await?;
//! for line in summary.report_lines("arith", "anthropic", "claude-sonnet-4-5") {
//!     println!("{line}");
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    AlgorithmConfig, Candidate, ChatMessage, ChatQuery, Completion, Config, Consensus, Example,
    GenerationRecord, GenerationSummary, LoggingConfig, Pool, Provider, RateLimitConfig,
    RetryConfig, RunConfig, TestCase, TokenBudget,
};
pub use domain::ports::{CompletionClient, CompletionStore, Dataset};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    EventBus, EvolutionContext, EvolutionEvent, EvolutionRunner, PopulationController, RunSummary,
};
