//! Model invocation port.

use async_trait::async_trait;

use super::errors::CompletionError;
use crate::domain::models::{ChatQuery, Completion};

/// Port trait for model invocation
///
/// The evolution core treats the provider as an opaque async function from a
/// chat query to a completion. Adapters own transport, rate limiting and
/// retries; any error they return is fatal to the batch that issued the query.
///
/// Implementations must be `Send + Sync` for concurrent use across tokio tasks.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run a single chat completion.
    async fn run_completion(&self, query: &ChatQuery) -> Result<Completion, CompletionError>;
}
