//! Retry pacing.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with uniform jitter.
///
/// `delay(n) = min(initial * multiplier^n, max_backoff) + uniform(0, max_jitter)`.
/// The first attempt (`n == 0`) is immediate unless `delay_first_attempt` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub max_jitter: Duration,
    pub max_backoff: Duration,
    pub delay_first_attempt: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(1000),
            multiplier: 2,
            max_jitter: Duration::from_millis(1000),
            max_backoff: Duration::from_secs(300),
            delay_first_attempt: false,
        }
    }
}

impl BackoffPolicy {
    /// A policy that never waits. Used by tests and dry runs.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            initial_backoff: Duration::ZERO,
            multiplier: 1,
            max_jitter: Duration::ZERO,
            max_backoff: Duration::ZERO,
            delay_first_attempt: false,
        }
    }

    /// Deterministic part of the delay before an attempt with `retries` prior failures.
    #[must_use]
    pub fn base_delay(&self, retries: u32) -> Duration {
        if retries == 0 && !self.delay_first_attempt {
            return Duration::ZERO;
        }

        let factor = self.multiplier.checked_pow(retries).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Full delay, drawing jitter from `rng`.
    #[must_use]
    pub fn delay_with<R: Rng>(&self, retries: u32, rng: &mut R) -> Duration {
        let base = self.base_delay(retries);
        if base.is_zero() || self.max_jitter.is_zero() {
            return base;
        }

        let jitter_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        base + Duration::from_millis(rng.gen_range(0..=jitter_ms))
    }

    /// Full delay using the thread-local RNG.
    #[must_use]
    pub fn delay(&self, retries: u32) -> Duration {
        self.delay_with(retries, &mut rand::thread_rng())
    }
}
