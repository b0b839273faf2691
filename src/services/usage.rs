//! Per-run completion and token counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::models::TokenUsage;

/// Lock-free usage counters shared by every test of a run.
#[derive(Debug, Default)]
pub struct UsageStats {
    completions: AtomicU64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
}

/// Point-in-time copy of [`UsageStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Completions returned.
    pub completions: u64,
    /// Prompt tokens reported.
    pub input_tokens: u64,
    /// Generated tokens reported.
    pub output_tokens: u64,
}

impl UsageStats {
    /// Zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completion and its reported usage, if any.
    pub fn record(&self, usage: Option<TokenUsage>) {
        self.completions.fetch_add(1, Ordering::Relaxed);
        if let Some(usage) = usage {
            self.input_tokens
                .fetch_add(usage.input_tokens, Ordering::Relaxed);
            self.output_tokens
                .fetch_add(usage.output_tokens, Ordering::Relaxed);
        }
    }

    /// Current totals.
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            completions: self.completions.load(Ordering::Relaxed),
            input_tokens: self.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.output_tokens.load(Ordering::Relaxed),
        }
    }
}
