//! Fixed-window rate limiter keyed by client network address.
//!
//! One counter map per tier, held in process memory. This is best-effort,
//! per-instance limiting: each scale-out instance owns its own counters, so
//! the effective global ceiling is `max_requests x live_instances`. The map
//! is private to this module; cross-instance enforcement would swap the
//! storage behind [`RateLimiter::check`] without changing the contract.

use std::collections::HashMap;
use std::time::Duration;

use axum::http::HeaderMap;
use chrono::Utc;
use parking_lot::Mutex;

/// Immutable per-tier limits.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Maximum requests per window (must be > 0)
    pub max_requests: u32,
    /// Window length in milliseconds (must be > 0)
    pub window_ms: i64,
}

/// Counter state for one client key.
#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    reset_at: i64,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request allowed; handler proceeds
    Allowed,
    /// Request rejected with a retry hint
    Denied {
        /// How long until the window resets
        retry_after: Duration,
        /// Ceiling for the window
        limit: u32,
        /// Epoch-millis reset timestamp
        reset_at: i64,
    },
}

/// Fixed-window counter map for a single tier.
pub struct RateLimiter {
    config: RateLimitConfig,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    /// Creates a limiter with the given tier configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        debug_assert!(config.max_requests > 0);
        debug_assert!(config.window_ms > 0);
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Checks and counts a request for `key` at the current wall-clock time.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Utc::now().timestamp_millis())
    }

    /// Checks and counts a request at an explicit timestamp.
    ///
    /// The read-modify-write of the entry happens under one lock acquisition
    /// so concurrent requests for the same key cannot double-count.
    pub fn check_at(&self, key: &str, now: i64) -> RateLimitDecision {
        let mut entries = self.entries.lock();

        match entries.get_mut(key) {
            Some(entry) if entry.reset_at >= now => {
                if entry.count >= self.config.max_requests {
                    let remaining_ms = (entry.reset_at - now).max(0) as u64;
                    return RateLimitDecision::Denied {
                        retry_after: Duration::from_secs(remaining_ms.div_ceil(1000)),
                        limit: self.config.max_requests,
                        reset_at: entry.reset_at,
                    };
                }
                entry.count += 1;
                RateLimitDecision::Allowed
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    RateLimitEntry {
                        count: 1,
                        reset_at: now + self.config.window_ms,
                    },
                );
                RateLimitDecision::Allowed
            }
        }
    }

    /// Removes entries whose window has already elapsed.
    ///
    /// Bounds memory growth from clients that stop sending requests; called
    /// by the periodic sweep task.
    pub fn sweep(&self) {
        self.sweep_at(Utc::now().timestamp_millis());
    }

    /// Sweep with an explicit timestamp.
    pub fn sweep_at(&self, now: i64) {
        self.entries.lock().retain(|_, entry| entry.reset_at >= now);
    }

    /// Number of tracked client keys.
    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().len()
    }

    /// The tier configuration this limiter enforces.
    pub fn config(&self) -> RateLimitConfig {
        self.config
    }
}

/// The four named tiers, each with an independent counter map.
pub struct RateLimiters {
    /// 5 requests / 60s, for sensitive operations
    pub very_strict: RateLimiter,
    /// 10 requests / 60s
    pub strict: RateLimiter,
    /// 60 requests / 60s, for general external-data proxying
    pub standard: RateLimiter,
    /// 100 requests / 60s
    pub lenient: RateLimiter,
}

const WINDOW_MS: i64 = 60_000;

impl Default for RateLimiters {
    fn default() -> Self {
        Self {
            very_strict: RateLimiter::new(RateLimitConfig {
                max_requests: 5,
                window_ms: WINDOW_MS,
            }),
            strict: RateLimiter::new(RateLimitConfig {
                max_requests: 10,
                window_ms: WINDOW_MS,
            }),
            standard: RateLimiter::new(RateLimitConfig {
                max_requests: 60,
                window_ms: WINDOW_MS,
            }),
            lenient: RateLimiter::new(RateLimitConfig {
                max_requests: 100,
                window_ms: WINDOW_MS,
            }),
        }
    }
}

impl RateLimiters {
    /// Sweeps expired entries across all tiers.
    pub fn sweep_all(&self) {
        self.very_strict.sweep();
        self.strict.sweep();
        self.standard.sweep();
        self.lenient.sweep();
    }
}

/// Derives the rate-limit key from client-supplied address headers.
///
/// Priority: `x-forwarded-for`, then `x-real-ip`, then `"unknown"`. These
/// headers are spoofable by a caller who controls them directly; keying on a
/// platform-guaranteed connecting-IP field is deployment-specific and left to
/// the hosting edge network.
pub fn client_key(headers: &HeaderMap) -> String {
    for name in ["x-forwarded-for", "x-real-ip"] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    "unknown".to_string()
}
