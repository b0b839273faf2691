//! Structured event stream for evolution runs.
//!
//! The core never prints; it publishes [`EvolutionEvent`]s on a broadcast
//! channel and reporters subscribe to whatever they need.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events emitted while evolving pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EvolutionEvent {
    /// A test's processing began.
    TestStarted {
        /// Test being evolved.
        test_id: String,
    },
    /// The initial pool was generated.
    PoolInitialized {
        /// Test being evolved.
        test_id: String,
        /// Members generated.
        pool_size: usize,
        /// Members whose answer checked correct.
        correct: usize,
    },
    /// A generation's judge/crossover cycle began.
    GenerationStarted {
        /// Test being evolved.
        test_id: String,
        /// Generation starting.
        generation: usize,
    },
    /// Consensus was computed for a generation index.
    ConsensusComputed {
        /// Test being evolved.
        test_id: String,
        /// Generation index of the record.
        generation: usize,
        /// Consensus answer.
        answer: String,
        /// Consensus correctness.
        check: bool,
        /// Members whose answer checked correct.
        correct: usize,
        /// Members in the pool.
        pool_size: usize,
    },
    /// One judge round finished over the whole pool.
    JudgeRoundCompleted {
        /// Test being evolved.
        test_id: String,
        /// Current generation.
        generation: usize,
        /// Round within the generation, from 0.
        round: usize,
    },
    /// The pool was replaced by its crossover offspring.
    CrossoverCompleted {
        /// Test being evolved.
        test_id: String,
        /// Generation whose crossover finished.
        generation: usize,
    },
    /// A pool or consensus invariant was broken.
    InvariantViolated {
        /// Test being abandoned.
        test_id: String,
        /// Violation message.
        reason: String,
    },
    /// A test finished and its records were merged.
    TestCompleted {
        /// Test that finished.
        test_id: String,
        /// Final consensus answer.
        answer: String,
        /// Final consensus correctness.
        check: bool,
    },
    /// A test was abandoned.
    TestFailed {
        /// Test being abandoned.
        test_id: String,
        /// Error that abandoned it.
        error: String,
    },
}

impl EvolutionEvent {
    /// Test the event concerns.
    pub fn test_id(&self) -> &str {
        match self {
            Self::TestStarted { test_id }
            | Self::PoolInitialized { test_id, .. }
            | Self::GenerationStarted { test_id, .. }
            | Self::ConsensusComputed { test_id, .. }
            | Self::JudgeRoundCompleted { test_id, .. }
            | Self::CrossoverCompleted { test_id, .. }
            | Self::InvariantViolated { test_id, .. }
            | Self::TestCompleted { test_id, .. }
            | Self::TestFailed { test_id, .. } => test_id,
        }
    }
}

/// Broadcast bus for [`EvolutionEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EvolutionEvent>,
}

impl EventBus {
    /// Bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EvolutionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: EvolutionEvent) {
        tracing::trace!(test_id = event.test_id(), ?event, "Publishing evolution event");
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
