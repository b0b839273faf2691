//! Domain value types.

pub mod candidate;
pub mod completion;
pub mod config;
pub mod consensus;
pub mod test_case;

pub use candidate::{Candidate, Pool};
pub use completion::{ChatMessage, ChatQuery, Completion, Provider, Role, TokenUsage};
pub use config::{
    AlgorithmConfig, Config, LoggingConfig, ProviderConfig, RateLimitConfig, RetryConfig,
    RunConfig,
};
pub use consensus::{Consensus, GenerationRecord, GenerationSummary};
pub use test_case::{Example, TestCase, TokenBudget};
