use crate::error::{Result, SyncError};
use std::thread;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Blocks the calling thread. Swapped out in tests to record delays.
pub trait Pause {
    fn pause(&mut self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// Bounded exponential backoff for remote calls that may hit a rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// Runs `call` until it succeeds, fails with something other than a rate
    /// limit, or `max_attempts` rate-limited attempts have been made.
    ///
    /// Every rate-limited attempt is followed by a pause, the last one
    /// included. The pause starts at `initial_delay` and doubles up to
    /// `max_delay`. Running out of attempts yields
    /// [`SyncError::RateLimitExhausted`].
    pub fn execute<T, F>(&self, pause: &mut dyn Pause, mut call: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut delay = self.initial_delay;
        for attempt in 1..=self.max_attempts {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_rate_limited() => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_secs = delay.as_secs(),
                        "rate limit exceeded, retrying"
                    );
                    pause.pause(delay);
                    delay = (delay * 2).min(self.max_delay);
                }
                Err(err) => return Err(err),
            }
        }
        Err(SyncError::RateLimitExhausted {
            attempts: self.max_attempts,
        })
    }
}
