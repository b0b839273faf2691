//! Audit port for raw model exchanges.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::StoreError;
use crate::domain::models::{ChatQuery, Completion};

/// Raw exchange recorded for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCompletion {
    /// Run the exchange belongs to.
    pub run_id: Uuid,
    /// Algorithm name.
    pub algorithm: String,
    /// Test the exchange belongs to.
    pub test_id: String,
    /// Query sent to the model.
    pub query: ChatQuery,
    /// Model output.
    pub completion: Completion,
    /// Checker verdict; always false for judgements.
    pub check: bool,
    /// Time the record was produced.
    pub stored_at: DateTime<Utc>,
}

/// Port trait for the completion audit sink
///
/// Writes are fire-and-forget from the algorithm's point of view: a failed
/// store is logged by the caller and never changes the outcome of a test.
#[async_trait]
pub trait CompletionStore: Send + Sync {
    /// Persist one record.
    async fn store(&self, record: StoredCompletion) -> Result<(), StoreError>;
}

/// Store that discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCompletionStore;

#[async_trait]
impl CompletionStore for NullCompletionStore {
    async fn store(&self, _record: StoredCompletion) -> Result<(), StoreError> {
        Ok(())
    }
}
