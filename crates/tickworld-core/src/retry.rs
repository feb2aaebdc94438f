//! Bounded, randomized exponential backoff for external calls.
//!
//! Before retry `n` (counting from zero) the caller sleeps a random delay in
//! `[ceiling / 2, ceiling]`, where `ceiling = min(base_delay * 2^n,
//! max_delay)`. Errors that are not transient stop the loop immediately;
//! running out of attempts turns the last transient error into
//! [`RetryError::Exhausted`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::PromptError;

/// How often and how patiently an external call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Ceiling of the first backoff.
    pub base_delay: Duration,
    /// Upper bound of any single backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// The largest delay allowed before retry `retry` (zero-based).
    pub fn ceiling(&self, retry: u32) -> Duration {
        let factor = 1_u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// A randomized delay in `[ceiling / 2, ceiling]` before retry `retry`.
    pub fn delay(&self, retry: u32, rng: &mut impl Rng) -> Duration {
        let ceiling = millis(self.ceiling(retry));
        let floor = ceiling / 2;
        Duration::from_millis(rng.random_range(floor..=ceiling))
    }

    /// Bounds on the total time slept when the first `retries` retries all
    /// happen.
    pub fn total_delay_bounds(&self, retries: u32) -> (Duration, Duration) {
        (0..retries).fold((Duration::ZERO, Duration::ZERO), |(low, high), n| {
            let ceiling = millis(self.ceiling(n));
            (
                low.saturating_add(Duration::from_millis(ceiling / 2)),
                high.saturating_add(Duration::from_millis(ceiling)),
            )
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Errors that know whether another attempt could succeed.
pub trait Transient {
    /// Whether retrying the same call may succeed.
    fn is_transient(&self) -> bool;
}

impl Transient for PromptError {
    fn is_transient(&self) -> bool {
        Self::is_transient(self)
    }
}

/// The outcome of a call that never succeeded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a transient error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// The final error.
        last: E,
    },
    /// The call failed with an error that retrying cannot fix.
    #[error("{0}")]
    Permanent(E),
}

impl<E> RetryError<E> {
    /// The underlying error.
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } | Self::Permanent(last) => last,
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or the policy runs out.
///
/// `op` receives the one-based attempt number. `label` names the call in
/// logs.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 1;
    loop {
        let err = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !err.is_transient() {
            return Err(RetryError::Permanent(err));
        }
        if attempt >= max_attempts {
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        let delay = policy.delay(attempt.saturating_sub(1), &mut rand::rng());
        warn!(
            call = label,
            attempt,
            delay_ms = millis(delay),
            error = %err,
            "transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt = attempt.saturating_add(1);
    }
}
