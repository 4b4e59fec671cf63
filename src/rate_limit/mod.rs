//! Fixed-window request counters keyed by client.
//!
//! Entries are created on first sight and never evicted. Each check runs
//! under the DashMap shard lock for its key, so concurrent requests from the
//! same client cannot both observe the last free slot.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

/// Outcome of one check-and-increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, never less than one
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let secs = (self.reset_at - now).num_seconds();
        secs.max(1) as u64
    }
}

#[derive(Debug, Default)]
pub struct RateLimitStore {
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, key: &str, limit: u32, window: Duration) -> RateLimitDecision {
        self.check_at(key, limit, window, Utc::now())
    }

    /// Check against an explicit clock reading
    pub fn check_at(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let window = chrono::Duration::milliseconds(window.as_millis().min(i64::MAX as u128) as i64);

        let mut entry = self.entries.entry(key.to_string()).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        if now - entry.window_start > window {
            entry.count = 0;
            entry.window_start = now;
        }

        let reset_at = entry.window_start + window;

        if entry.count >= limit {
            return RateLimitDecision {
                allowed: false,
                limit,
                remaining: 0,
                reset_at,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            limit,
            remaining: limit - entry.count,
            reset_at,
        }
    }

    /// Snapshot of one client's counter
    pub fn entry(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|entry| *entry)
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn first_n_calls_pass_then_deny() {
        let store = RateLimitStore::new();
        let now = Utc::now();

        for expected in (0..5).rev() {
            let decision = store.check_at("10.0.0.1", 5, MINUTE, now);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected);
        }

        let denied = store.check_at("10.0.0.1", 5, MINUTE, now);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        // denial does not consume
        assert_eq!(store.entry("10.0.0.1").unwrap().count, 5);
    }

    #[test]
    fn window_rollover_resets_the_count() {
        let store = RateLimitStore::new();
        let start = Utc::now();

        store.check_at("client", 1, MINUTE, start);
        assert!(!store.check_at("client", 1, MINUTE, start + chrono::Duration::seconds(30)).allowed);

        // exactly one window later is still the same window
        assert!(!store.check_at("client", 1, MINUTE, start + chrono::Duration::seconds(60)).allowed);

        let later = start + chrono::Duration::seconds(61);
        let decision = store.check_at("client", 1, MINUTE, later);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(store.entry("client").unwrap().window_start, later);
    }

    #[test]
    fn two_per_minute_for_one_address() {
        let store = RateLimitStore::new();
        let now = Utc::now();

        let first = store.check_at("203.0.113.5", 2, MINUTE, now);
        let second = store.check_at("203.0.113.5", 2, MINUTE, now);
        let third = store.check_at("203.0.113.5", 2, MINUTE, now + chrono::Duration::seconds(5));

        assert!(first.allowed && second.allowed);
        assert_eq!((first.remaining, second.remaining), (1, 0));
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
        assert_eq!(third.reset_at, now + chrono::Duration::seconds(60));
        assert_eq!(third.retry_after_secs(now + chrono::Duration::seconds(5)), 55);
    }

    #[test]
    fn retry_after_is_at_least_one_second() {
        let now = Utc::now();
        let decision = RateLimitDecision {
            allowed: false,
            limit: 1,
            remaining: 0,
            reset_at: now,
        };
        assert_eq!(decision.retry_after_secs(now), 1);
    }

    #[test]
    fn keys_are_tracked_independently() {
        let store = RateLimitStore::new();
        assert!(store.check("a", 1, MINUTE).allowed);
        assert!(store.check("b", 1, MINUTE).allowed);
        assert!(!store.check("a", 1, MINUTE).allowed);
        assert_eq!(store.tracked_keys(), 2);
        assert!(store.entry("c").is_none());
    }

    #[test]
    fn concurrent_checks_never_exceed_the_limit() {
        let store = RateLimitStore::new();
        let allowed = AtomicU32::new(0);

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        if store.check("shared", 100, MINUTE).allowed {
                            allowed.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(allowed.load(Ordering::SeqCst), 100);
        assert_eq!(store.entry("shared").unwrap().count, 100);
    }
}
