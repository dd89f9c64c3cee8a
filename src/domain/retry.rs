//! Bounded retry with backoff.
//!
//! Retry behaviour is a strategy handed to whoever needs it (the session
//! uses one around stream start-up). Sleeping goes through a caller-supplied
//! function so tests can run without waiting.

use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, error, warn};

pub trait RetryStrategy {
    /// Total attempts, including the first. Never less than 1.
    fn max_attempts(&self) -> u32;

    /// Delay to wait before attempt number `attempt` (1-based; attempt 1 has none).
    fn delay_before(&self, attempt: u32) -> Duration;
}

/// Exponential backoff capped at `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl ExponentialBackoff {
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
            multiplier,
        }
    }

    /// Constant delay between attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::new(max_attempts, delay, delay, 1.0)
    }

    pub fn no_retry() -> Self {
        Self::fixed(1, Duration::ZERO)
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 2).min(i32::MAX as u32) as i32;
        let scaled = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !scaled.is_finite() || scaled >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(scaled.max(0.0))
        }
    }
}

/// Run `op` until it succeeds or `strategy` runs out of attempts.
///
/// `op` receives the 1-based attempt number. On exhaustion the last error is
/// returned.
pub fn retry<T, E, F, S>(
    strategy: &dyn RetryStrategy,
    operation: &str,
    mut sleep: S,
    mut op: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
    S: FnMut(Duration),
{
    let max_attempts = strategy.max_attempts();
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts => {
                let delay = strategy.delay_before(attempt + 1);
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    error = %e,
                    "Attempt failed, retrying in {:?}",
                    delay
                );
                sleep(delay);
                attempt += 1;
            }
            Err(e) => {
                error!(operation, max_attempts, error = %e, "Max retries reached");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_stream_defaults() {
        let policy = ExponentialBackoff::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_secs(5));
        assert_eq!(policy.delay_before(3), Duration::from_secs(10));
    }

    #[test]
    fn backoff_is_capped() {
        let policy = ExponentialBackoff::new(
            10,
            Duration::from_secs(1),
            Duration::from_secs(5),
            2.0,
        );
        assert_eq!(policy.delay_before(4), Duration::from_secs(4));
        assert_eq!(policy.delay_before(5), Duration::from_secs(5));
        assert_eq!(policy.delay_before(40), Duration::from_secs(5));
    }

    #[test]
    fn fixed_policy_never_grows() {
        let policy = ExponentialBackoff::fixed(4, Duration::from_millis(250));
        for attempt in 2..=4 {
            assert_eq!(policy.delay_before(attempt), Duration::from_millis(250));
        }
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let policy = ExponentialBackoff::fixed(0, Duration::ZERO);
        let mut calls = 0;
        let result: Result<(), String> = retry(&policy, "op", |_| {}, |_| {
            calls += 1;
            Err("nope".to_string())
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let policy = ExponentialBackoff::default();
        let mut slept = Vec::new();
        let result: Result<u32, String> = retry(
            &policy,
            "stream",
            |d| slept.push(d),
            |attempt| {
                if attempt < 3 {
                    Err(format!("fail {attempt}"))
                } else {
                    Ok(attempt)
                }
            },
        );
        assert_eq!(result, Ok(3));
        assert_eq!(slept, vec![Duration::from_secs(5), Duration::from_secs(10)]);
    }

    #[test]
    fn returns_last_error_when_exhausted() {
        let policy = ExponentialBackoff::fixed(3, Duration::from_secs(5));
        let mut calls = 0;
        let mut sleeps = 0;
        let result: Result<(), String> = retry(
            &policy,
            "stream",
            |_| sleeps += 1,
            |attempt| {
                calls += 1;
                Err(format!("fail {attempt}"))
            },
        );
        assert_eq!(result, Err("fail 3".to_string()));
        assert_eq!(calls, 3);
        assert_eq!(sleeps, 2);
    }

    #[test]
    fn no_retry_never_sleeps() {
        let policy = ExponentialBackoff::no_retry();
        let mut sleeps = 0;
        let result: Result<(), &str> = retry(&policy, "op", |_| sleeps += 1, |_| Err("x"));
        assert!(result.is_err());
        assert_eq!(sleeps, 0);
    }
}
