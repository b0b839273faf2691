//! Rate limiting and retry around a raw provider transport.

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::warn;

use super::errors::LlmApiError;
use crate::domain::models::config::{RateLimitConfig, RetryConfig};
use crate::domain::models::{ChatQuery, Completion};
use crate::domain::ports::{CompletionClient, CompletionError};

/// A single, unretried request to a provider.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Send `query` once.
    async fn send(&self, query: &ChatQuery) -> Result<Completion, LlmApiError>;
}

/// [`CompletionClient`] that throttles requests with a token bucket and
/// retries transient failures with exponential backoff.
pub struct RetryingClient<T> {
    transport: T,
    limiter: DefaultDirectRateLimiter,
    retry: RetryConfig,
}

impl<T: ChatTransport> RetryingClient<T> {
    /// Wrap `transport` with the given limits.
    pub fn new(transport: T, rate_limit: &RateLimitConfig, retry: RetryConfig) -> Self {
        Self {
            transport,
            limiter: RateLimiter::direct(quota(rate_limit)),
            retry,
        }
    }

    fn backoff(&self) -> impl Backoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.retry.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(self.retry.max_backoff_ms))
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Token bucket refilled at `requests_per_second`, holding `burst_size`.
fn quota(rate_limit: &RateLimitConfig) -> Quota {
    let burst = NonZeroU32::new(rate_limit.burst_size).unwrap_or(NonZeroU32::MIN);
    Duration::try_from_secs_f64(1.0 / rate_limit.requests_per_second)
        .ok()
        .and_then(Quota::with_period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

#[async_trait]
impl<T: ChatTransport> CompletionClient for RetryingClient<T> {
    async fn run_completion(&self, query: &ChatQuery) -> Result<Completion, CompletionError> {
        let transport = &self.transport;
        let limiter = &self.limiter;
        let max_retries = self.retry.max_retries;
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;

        let result = backoff::future::retry_notify(
            self.backoff(),
            move || async move {
                limiter.until_ready().await;
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);

                match transport.send(query).await {
                    Ok(completion) => Ok(completion),
                    Err(e) if e.is_transient() && attempt < max_retries => {
                        Err(backoff::Error::transient(e))
                    }
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            },
            |error: LlmApiError, wait: Duration| {
                warn!(
                    provider = transport.name(),
                    error = %error,
                    wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                    "Transient provider error, retrying"
                );
            },
        )
        .await;

        result.map_err(CompletionError::from)
    }
}
