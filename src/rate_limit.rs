use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitResult {
    /// Whether the request is allowed.
    pub allowed: bool,
    /// Maximum requests allowed in this window.
    pub limit: u32,
    /// Requests remaining in the current window (0 when denied).
    pub remaining: u32,
    /// Seconds until the oldest request leaves the window.
    pub reset_after_secs: u64,
}

/// Per-key sliding-window rate limiter.
///
/// Each key holds the timestamps of its recent requests; only timestamps
/// within the trailing window count toward the limit. A denied request is
/// NOT recorded, so a burst of rejected calls does not extend the throttle —
/// the window drains purely by time.
///
/// State is process-local: with several server instances each one counts
/// independently, so the effective limit is per instance, not global.
pub struct RateLimiter<K: Eq + Hash> {
    window: Mutex<HashMap<K, Vec<Instant>>>,
    max_per_window: u32,
    window_duration: Duration,
}

impl<K: Eq + Hash> RateLimiter<K> {
    /// Evict empty/expired entries once the map exceeds this many keys.
    const EVICTION_THRESHOLD: usize = 10_000;

    pub fn new(max_per_window: u32, window_secs: u64) -> Self {
        Self {
            window: Mutex::new(HashMap::new()),
            max_per_window,
            window_duration: Duration::from_secs(window_secs),
        }
    }

    /// Check whether the key is within its limit and record the request if so.
    ///
    /// Expired timestamps are dropped first; if the remaining count has
    /// reached the limit the call is denied without recording. Periodically
    /// evicts stale keys to bound memory usage.
    pub fn check_and_record(&self, key: K) -> RateLimitResult {
        let now = Instant::now();
        let mut guard = self
            .window
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if guard.len() > Self::EVICTION_THRESHOLD {
            let window = self.window_duration;
            guard.retain(|_, times| {
                times.retain(|t| now.duration_since(*t) < window);
                !times.is_empty()
            });
        }

        let times = guard.entry(key).or_default();
        times.retain(|t| now.duration_since(*t) < self.window_duration);

        let reset_after_secs = self.reset_after(times, now);
        if times.len() as u32 >= self.max_per_window {
            return RateLimitResult {
                allowed: false,
                limit: self.max_per_window,
                remaining: 0,
                reset_after_secs,
            };
        }

        times.push(now);
        RateLimitResult {
            allowed: true,
            limit: self.max_per_window,
            remaining: self.max_per_window.saturating_sub(times.len() as u32),
            reset_after_secs: self.reset_after(times, now),
        }
    }

    /// Recompute the current quota for a key without recording anything.
    ///
    /// Used to report `X-RateLimit-*` headers alongside a response.
    pub fn peek(&self, key: &K) -> RateLimitResult {
        let now = Instant::now();
        let guard = self
            .window
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let (valid_count, reset_after_secs) = guard.get(key).map_or_else(
            || (0, self.window_duration.as_secs()),
            |times| {
                let live: Vec<Instant> = times
                    .iter()
                    .copied()
                    .filter(|t| now.duration_since(*t) < self.window_duration)
                    .collect();
                (live.len() as u32, self.reset_after(&live, now))
            },
        );

        RateLimitResult {
            allowed: valid_count < self.max_per_window,
            limit: self.max_per_window,
            remaining: self.max_per_window.saturating_sub(valid_count),
            reset_after_secs,
        }
    }

    /// Seconds until the oldest in-window timestamp expires; a full window
    /// when the key has no live timestamps.
    fn reset_after(&self, times: &[Instant], now: Instant) -> u64 {
        times.first().map_or_else(
            || self.window_duration.as_secs(),
            |oldest| {
                self.window_duration
                    .saturating_sub(now.duration_since(*oldest))
                    .as_secs()
            },
        )
    }
}

/// Rate limiter keyed by client IP string; used for all public endpoints.
pub type IpRateLimiter = RateLimiter<String>;
