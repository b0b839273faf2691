//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - CompletionClient: model invocation
//! - Dataset: instructions, few-shot examples, answer parsing and checking
//! - CompletionStore: audit sink for raw exchanges
//!
//! The evolution services depend on these traits only, never on concrete
//! providers or file formats.

pub mod completion_client;
pub mod completion_store;
pub mod dataset;
pub mod errors;

pub use completion_client::CompletionClient;
pub use completion_store::{CompletionStore, NullCompletionStore, StoredCompletion};
pub use dataset::Dataset;
pub use errors::{CompletionError, DatasetError, StoreError};
