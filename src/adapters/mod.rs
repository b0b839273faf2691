//! Adapters for testing and local runs.

pub mod mock;

pub use mock::{CheckBehavior, MemoryCompletionStore, MockCompletionClient, MockDataset};
