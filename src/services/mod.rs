//! Service layer: the evolutionary algorithm and its run orchestration.

pub mod aggregator;
pub mod candidate_generator;
pub mod consensus;
pub mod context;
pub mod events;
pub mod evolution_loop;
pub mod executor;
pub mod judgement;
pub mod prompts;
pub mod runner;
pub mod sampler;
pub mod usage;

pub use aggregator::ResultsAggregator;
pub use candidate_generator::{checked_or_false, CandidateGenerator};
pub use consensus::{correct_members, resolve};
pub use context::{EvolutionContext, ALGORITHM};
pub use events::{EventBus, EvolutionEvent};
pub use evolution_loop::{ensure_pool_size, PopulationController, TestOutcome};
pub use executor::BoundedExecutor;
pub use judgement::JudgementEngine;
pub use runner::{EvolutionRunner, FailedTest, RunSummary};
pub use sampler::Sampler;
pub use usage::{UsageSnapshot, UsageStats};
