//! Bounded polling of remote state.
//!
//! `poll_until` is the only retry primitive in the crate. Debrid backends
//! process torrents out-of-band, so adapters call it to wait for a state
//! transition instead of writing their own sleep loops.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// How often and how many times to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two consecutive polls.
    pub interval: Duration,
    /// Total number of polls before giving up.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    /// 3s between polls, 40 polls (about two minutes).
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 40,
        }
    }
}

impl PollPolicy {
    /// Upper bound of time spent sleeping when every poll is non-terminal.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Why polling stopped without a terminal value.
#[derive(Debug, Error)]
pub enum PollError<E> {
    #[error("no terminal state after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("{0}")]
    Poll(E),
}

/// Call `poll_fn` until `is_terminal` accepts its value.
///
/// Sleeps `policy.interval` between attempts (never after the last one) and
/// yields to the runtime while doing so. An error from `poll_fn` stops
/// polling immediately.
pub async fn poll_until<T, E, F, Fut, P>(
    mut poll_fn: F,
    is_terminal: P,
    policy: &PollPolicy,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    for attempt in 1..=policy.max_attempts {
        let value = poll_fn().await.map_err(PollError::Poll)?;
        if is_terminal(&value) {
            debug!(attempt, "Poll reached terminal state");
            return Ok(value);
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(PollError::Timeout {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn policy(interval_ms: u64, max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(interval_ms),
            max_attempts,
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(3));
        assert_eq!(policy.max_attempts, 40);
        assert_eq!(policy.ceiling(), Duration::from_secs(117));
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_first_terminal_value() {
        let mut calls = 0u32;
        let result = poll_until(
            || {
                calls += 1;
                let n = calls;
                async move { Ok::<_, String>(n) }
            },
            |n| *n == 3,
            &policy(100, 10),
        )
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_on_first_poll_does_not_sleep() {
        let start = Instant::now();
        let result = poll_until(
            || async { Ok::<_, String>("ready") },
            |s| *s == "ready",
            &policy(1000, 5),
        )
        .await;

        assert_eq!(result.unwrap(), "ready");
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_max_attempts() {
        let mut calls = 0u32;
        let start = Instant::now();
        let result = poll_until(
            || {
                calls += 1;
                async { Ok::<_, String>(false) }
            },
            |done| *done,
            &policy(3000, 4),
        )
        .await;

        assert!(matches!(result, Err(PollError::Timeout { attempts: 4 })));
        assert_eq!(calls, 4);
        // Three sleeps between four polls
        assert_eq!(start.elapsed(), Duration::from_millis(9000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_aborts_immediately() {
        let mut calls = 0u32;
        let result: Result<u32, _> = poll_until(
            || {
                calls += 1;
                async { Err::<u32, _>("HTTP 401".to_string()) }
            },
            |_| false,
            &policy(100, 10),
        )
        .await;

        match result {
            Err(PollError::Poll(msg)) => assert_eq!(msg, "HTTP 401"),
            other => panic!("Expected poll error, got {:?}", other),
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_error_display() {
        let err: PollError<String> = PollError::Timeout { attempts: 40 };
        assert_eq!(err.to_string(), "no terminal state after 40 attempts");

        let err: PollError<String> = PollError::Poll("boom".to_string());
        assert_eq!(err.to_string(), "boom");
    }
}
