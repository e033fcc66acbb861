//! Duplicate-click suppression
//!
//! A redirect page can fire the record operation twice for a single user
//! action (effect re-invocation, redirect retries). The guard remembers the
//! last attempt per tracking code and suppresses repeats inside a short
//! window. Best-effort and process-local: it does not coordinate across
//! instances or devices.

use dashmap::DashMap;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_WINDOW_MS: i64 = 3_000;
pub const DEFAULT_MAX_AGE_MS: i64 = 3_600_000;

/// Injectable time source so the window and GC policy are testable
/// without real timers.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

pub trait ClickGuard: Send + Sync {
    /// True when an attempt for this code was recorded inside the window
    fn should_suppress(&self, tracking_code: &str) -> bool;

    /// Remember an attempt for this code at the current time
    fn record_attempt(&self, tracking_code: &str);
}

/// Process-local guard keyed by tracking code.
///
/// Entries older than `max_age_ms` are purged opportunistically on each
/// call so the map stays bounded.
pub struct InMemoryClickGuard {
    attempts: DashMap<String, i64>,
    window_ms: i64,
    max_age_ms: i64,
    clock: Box<dyn Clock>,
}

impl InMemoryClickGuard {
    pub fn new(window_ms: i64, max_age_ms: i64, clock: Box<dyn Clock>) -> Self {
        Self {
            attempts: DashMap::new(),
            window_ms,
            max_age_ms,
            clock,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_WINDOW_MS, DEFAULT_MAX_AGE_MS, Box::new(SystemClock))
    }

    fn purge_stale(&self, now: i64) {
        let cutoff = now - self.max_age_ms;
        self.attempts.retain(|_, last| *last > cutoff);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.attempts.len()
    }
}

impl ClickGuard for InMemoryClickGuard {
    fn should_suppress(&self, tracking_code: &str) -> bool {
        let now = self.clock.now_millis();
        self.purge_stale(now);
        match self.attempts.get(tracking_code) {
            Some(last) => now - *last < self.window_ms,
            None => false,
        }
    }

    fn record_attempt(&self, tracking_code: &str) {
        let now = self.clock.now_millis();
        self.attempts.insert(tracking_code.to_string(), now);
        self.purge_stale(now);
    }
}
