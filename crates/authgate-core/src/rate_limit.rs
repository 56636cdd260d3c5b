//! Fixed-window login attempt limiter keyed by client.
//!
//! Only the client key is counted, never the target account. Many clients
//! hammering one account are therefore not throttled as a group.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::clock::{Clock, SystemClock};
use crate::error::{GateError, GateResult};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy)]
pub struct RateLimitCounter {
    pub window_start: Instant,
    pub attempts: u32,
}

pub struct LoginRateLimiter {
    counters: DashMap<String, RateLimitCounter>,
    max_attempts: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self::with_clock(max_attempts, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_attempts: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            counters: DashMap::new(),
            max_attempts,
            window,
            clock,
        }
    }

    /// Records one attempt for `client_key`.
    ///
    /// Returns how many attempts remain in the current window, or
    /// `TooManyAttempts` once the window's budget is spent. The window is
    /// reset lazily on the first attempt after it elapses.
    pub fn check_and_record(&self, client_key: &str) -> GateResult<u32> {
        let now = self.clock.now();
        let mut counter = self
            .counters
            .entry(client_key.to_string())
            .or_insert(RateLimitCounter {
                window_start: now,
                attempts: 0,
            });

        if now.duration_since(counter.window_start) > self.window {
            counter.window_start = now;
            counter.attempts = 0;
        }

        if counter.attempts >= self.max_attempts {
            let retry_after = counter
                .window_start
                .checked_add(self.window)
                .map_or(self.window, |end| end.saturating_duration_since(now));
            tracing::warn!("Login rate limit hit for {client_key}");
            return Err(GateError::TooManyAttempts { retry_after });
        }

        counter.attempts += 1;
        Ok(self.max_attempts - counter.attempts)
    }

    pub fn counter(&self, client_key: &str) -> Option<RateLimitCounter> {
        self.counters.get(client_key).map(|c| *c)
    }

    /// Drops counters whose window has elapsed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let window = self.window;
        let before = self.counters.len();
        self.counters
            .retain(|_, c| now.duration_since(c.window_start) <= window);
        before.saturating_sub(self.counters.len())
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}
