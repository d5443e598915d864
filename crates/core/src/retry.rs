//! Bounded retry with a fixed delay between attempts.
//!
//! Each attempt re-runs the whole operation. There is no backoff growth, no
//! jitter and nothing carried over from a failed attempt.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

/// Attempts for both group and participant listing.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const GROUP_LIST_DELAY: Duration = Duration::from_millis(5000);
pub const PARTICIPANT_LIST_DELAY: Duration = Duration::from_millis(3000);

/// Errors decide for themselves whether another attempt can help.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Suspension primitive. Production code blocks the thread; tests record.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    pub const fn group_listing() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, GROUP_LIST_DELAY)
    }

    pub const fn participant_listing() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, PARTICIPANT_LIST_DELAY)
    }

    /// Run `op` until it succeeds, fails non-transiently, or `max_attempts`
    /// consecutive transient failures occur. The last error is returned.
    ///
    /// `max_attempts` of zero is treated as one attempt.
    pub fn run<T, E, F>(&self, sleeper: &dyn Sleeper, label: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Result<T, E>,
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 1u32;

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) if attempt >= max => {
                    tracing::warn!(attempts = max, error = %err, "{label}: giving up");
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = max,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %err,
                        "{label}: attempt failed, retrying",
                    );
                    sleeper.sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSleeper;
    use super::*;

    #[derive(Debug, PartialEq)]
    struct FakeError {
        transient: bool,
        n: u32,
    }

    impl Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake failure #{}", self.n)
        }
    }

    impl Retryable for FakeError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    const POLICY: RetryPolicy = RetryPolicy::new(3, Duration::from_millis(3000));

    #[test]
    fn succeeds_on_third_attempt() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let result = POLICY.run(&sleeper, "list", || {
            calls += 1;
            if calls < 3 {
                Err(FakeError { transient: true, n: calls })
            } else {
                Ok("members")
            }
        });

        assert_eq!(result, Ok("members"));
        assert_eq!(calls, 3);
        assert_eq!(*sleeper.slept.borrow(), vec![Duration::from_millis(3000); 2]);
    }

    #[test]
    fn always_failing_stops_after_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let result: Result<(), _> = POLICY.run(&sleeper, "list", || {
            calls += 1;
            Err(FakeError { transient: true, n: calls })
        });

        assert_eq!(calls, 3);
        // last error is the one surfaced
        assert_eq!(result.unwrap_err().n, 3);
        // no delay after the final attempt
        assert_eq!(sleeper.slept.borrow().len(), 2);
    }

    #[test]
    fn permanent_error_is_not_retried() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let result: Result<(), _> = POLICY.run(&sleeper, "list", || {
            calls += 1;
            Err(FakeError { transient: false, n: calls })
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert!(sleeper.slept.borrow().is_empty());
    }

    #[test]
    fn zero_attempts_runs_once() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let _: Result<(), _> = policy.run(&sleeper, "list", || {
            calls += 1;
            Err(FakeError { transient: true, n: calls })
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn call_site_defaults() {
        assert_eq!(RetryPolicy::group_listing().max_attempts, 3);
        assert_eq!(RetryPolicy::participant_listing().max_attempts, 3);
        assert!(RetryPolicy::group_listing().delay > RetryPolicy::participant_listing().delay);
    }
}
