//! Bounded-concurrency batch execution.

use futures::future::try_join_all;
use std::future::Future;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::{DomainError, DomainResult};

/// Runs a batch of independent units with at most `ceiling` in flight.
///
/// A fresh semaphore is created per batch, so batches never queue behind each
/// other. The batch resolves once every unit has finished, or on the first
/// error, which drops the remaining units. Results keep input order.
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    ceiling: usize,
    cancel: Option<CancellationToken>,
}

impl BoundedExecutor {
    /// Executor running at most `ceiling` units at once (at least one).
    pub fn new(ceiling: usize) -> Self {
        Self {
            ceiling: ceiling.max(1),
            cancel: None,
        }
    }

    /// Abort in-flight batches when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Maximum units in flight.
    pub const fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Run every unit and collect their outputs in input order.
    pub async fn run<I, Fut, T>(&self, units: I) -> DomainResult<Vec<T>>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = DomainResult<T>>,
    {
        let semaphore = Semaphore::new(self.ceiling);

        let guarded = units.into_iter().map(|unit| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| DomainError::ExecutionFailed("Semaphore closed".to_string()))?;
                unit.await
            }
        });
        let batch = try_join_all(guarded);

        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => Err(DomainError::Cancelled),
                    result = batch => result,
                }
            }
            None => batch.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_ceiling_is_never_exceeded() {
        let executor = BoundedExecutor::new(4);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        let units = (0..20).map(|i| {
            let active = active.clone();
            let peak = peak.clone();
            let finished = finished.clone();
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                finished.fetch_add(1, Ordering::SeqCst);
                Ok::<_, DomainError>(i)
            }
        });

        let results = executor.run(units).await.unwrap();

        assert_eq!(results, (0..20).collect::<Vec<_>>());
        assert_eq!(finished.load(Ordering::SeqCst), 20);
        assert!(peak.load(Ordering::SeqCst) <= 4);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_first_error_aborts_batch() {
        let executor = BoundedExecutor::new(2);
        let units = (0..6).map(|i| async move {
            if i == 3 {
                Err(DomainError::Completion("model unavailable".to_string()))
            } else {
                Ok(i)
            }
        });

        let err = executor.run(units).await.unwrap_err();
        assert!(matches!(err, DomainError::Completion(_)));
    }

    #[tokio::test]
    async fn test_zero_ceiling_still_progresses() {
        let executor = BoundedExecutor::new(0);
        assert_eq!(executor.ceiling(), 1);
        let results = executor
            .run((0..3).map(|i| async move { Ok::<_, DomainError>(i * 2) }))
            .await
            .unwrap();
        assert_eq!(results, vec![0, 2, 4]);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_batch() {
        let token = CancellationToken::new();
        let executor = BoundedExecutor::new(2).with_cancellation(token.clone());

        let units = (0..4).map(|_| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, DomainError>(())
        });

        token.cancel();
        let err = executor.run(units).await.unwrap_err();
        assert!(matches!(err, DomainError::Cancelled));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let executor = BoundedExecutor::new(4);
        let results: Vec<u8> = executor
            .run(std::iter::empty::<std::future::Ready<DomainResult<u8>>>())
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
