//! Resilience primitives for provider lookups.
//!
//! [`fetch_with_retry`] drives a [`FetchAdapter`] through backon with a
//! [`RetryPolicy`] schedule. Only transient failures are retried; a missing
//! artist or an empty catalog ends the lookup at once. [`RateLimiter`]
//! spaces out the individual HTTP requests inside one lookup.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backon::{BackoffBuilder, Retryable, Sleeper};
use tokio::sync::Semaphore;
use tokio::time::sleep;

use cantus_core::model::ArtistRequest;

use crate::error::{truncate_cause, MAX_CAUSE_CHARS};
use crate::provider::{FetchAdapter, FetchOutcome};

/// Bounded retry schedule.
///
/// After failed attempt `n` (starting at 1) the next attempt waits
/// `base_delay * n * 2`. There is no wait after the last attempt, so a
/// policy yields `max_retries - 1` delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy. `max_retries` is raised to at least one attempt.
    pub fn new(max_retries: usize, base_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            base_delay,
        }
    }

    /// Wait scheduled after failed attempt `attempt`.
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt.saturating_mul(2)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Every wait the policy can schedule, in order.
    pub fn delays(&self) -> Vec<Duration> {
        (1..self.max_retries).map(|n| self.delay_after(n)).collect()
    }

    /// Total time spent sleeping when every attempt fails.
    pub fn worst_case_wait(&self) -> Duration {
        self.delays().into_iter().sum()
    }
}

impl BackoffBuilder for RetryPolicy {
    type Backoff = std::vec::IntoIter<Duration>;

    fn build(self) -> Self::Backoff {
        self.delays().into_iter()
    }
}

/// Per-client request pacing.
///
/// Limits throughput to a configurable number of requests per second by
/// combining a single-permit [`Semaphore`] with a fixed sleep interval.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    interval: Duration,
}

impl RateLimiter {
    /// Creates a new `RateLimiter` that allows at most
    /// `requests_per_second` requests per second.
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            interval: Duration::from_millis(1000 / u64::from(requests_per_second.max(1))),
        }
    }

    /// Waits until a request slot is available, then holds the slot for
    /// the configured interval to enforce the rate limit.
    pub async fn acquire(&self) {
        match self.semaphore.acquire().await {
            Ok(_permit) => sleep(self.interval).await,
            Err(_) => log::warn!("Rate limiter closed; request not paced"),
        }
    }
}

/// Why an attempt did not produce a terminal outcome.
#[derive(Debug)]
enum AttemptError {
    NotFound,
    Transient { attempt: usize, cause: String },
}

impl AttemptError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Look up `request` with bounded retries.
///
/// `Success` and `Empty` return immediately, as does `NotFound`.
/// `TransientFailure` is retried on the `policy` schedule, sleeping through
/// `sleeper`; once attempts run out the last failure is returned without a
/// further sleep.
pub async fn fetch_with_retry<A, S>(
    adapter: &A,
    request: &ArtistRequest,
    policy: RetryPolicy,
    sleeper: S,
) -> FetchOutcome
where
    A: FetchAdapter + ?Sized,
    S: Sleeper,
{
    let attempts = AtomicUsize::new(0);
    let counter = &attempts;
    let max_retries = policy.max_retries;

    let fetch_once = || {
        let (counter, adapter, request) = (counter, adapter, request);
        async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            log::debug!(
                "Fetching {} (attempt {}/{})",
                request.name,
                n,
                max_retries
            );

            match adapter.fetch(&request.name, request.max_songs).await {
                outcome @ (FetchOutcome::Success { .. } | FetchOutcome::Empty) => Ok(outcome),
                FetchOutcome::NotFound => Err(AttemptError::NotFound),
                FetchOutcome::TransientFailure { cause } => {
                    Err(AttemptError::Transient { attempt: n, cause })
                }
            }
        }
    };

    let result = fetch_once
        .retry(policy)
        .sleep(sleeper)
        .when(AttemptError::is_transient)
        .notify(|err: &AttemptError, delay: Duration| {
            if let AttemptError::Transient { attempt, cause } = err {
                log::warn!(
                    "Attempt {}/{} for {} failed: {}; retrying in {:.1}s",
                    attempt,
                    max_retries,
                    request.name,
                    truncate_cause(cause, MAX_CAUSE_CHARS),
                    delay.as_secs_f64()
                );
            }
        })
        .await;

    match result {
        Ok(outcome) => outcome,
        Err(AttemptError::NotFound) => {
            log::warn!("Could not find artist: {}", request.name);
            FetchOutcome::NotFound
        }
        Err(AttemptError::Transient { attempt, cause }) => {
            log::error!(
                "Giving up on {} after {} attempts: {}",
                request.name,
                attempt,
                truncate_cause(&cause, MAX_CAUSE_CHARS)
            );
            FetchOutcome::TransientFailure { cause }
        }
    }
}
