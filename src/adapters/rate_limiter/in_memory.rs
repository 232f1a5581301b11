//! In-memory rate limiter implementation for testing and single-process use.
//!
//! Uses a sliding-window log: every accepted request's instant is kept until
//! it ages out of the window, so a burst straddling a window boundary can
//! never exceed the limit. Not shared between processes.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::config::{RateLimitConfig, WindowLimit};

/// In-memory sliding-window rate limiter.
///
/// Keys whose log has gone idle for a full window are swept at most once per
/// window, so memory tracks recently active callers only.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    state: Mutex<Logs>,
}

#[derive(Debug)]
struct Logs {
    /// Accepted request instants per storage key, oldest first.
    by_key: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

impl Logs {
    /// Drop every key with no request inside `idle`.
    fn sweep(&mut self, now: Instant, idle: Duration) {
        if now.duration_since(self.last_sweep) < idle {
            return;
        }
        self.by_key.retain(|_, log| {
            log.back()
                .is_some_and(|newest| now.duration_since(*newest) < idle)
        });
        self.last_sweep = now;
    }
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(Logs {
                by_key: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Longest window of any scope; an idle key older than this is empty.
    fn longest_window(&self) -> Duration {
        Duration::from_millis(self.config.global.window_ms.max(self.config.per_ip.window_ms))
    }

    /// Create a rate limiter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.state.lock().await.by_key.len()
    }
}

/// Drop entries that have aged out of the window.
fn prune(log: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = log.front() {
        if now.duration_since(*oldest) >= window {
            log.pop_front();
        } else {
            break;
        }
    }
}

/// Milliseconds until the oldest entry leaves the window.
fn until_oldest_expires(log: &VecDeque<Instant>, now: Instant, window: Duration) -> u64 {
    log.front()
        .map(|oldest| window.saturating_sub(now.duration_since(*oldest)))
        .unwrap_or(window)
        .as_millis() as u64
}

fn status_of(log: &VecDeque<Instant>, now: Instant, limit: WindowLimit) -> RateLimitStatus {
    let window = Duration::from_millis(limit.window_ms);
    RateLimitStatus {
        limit: limit.requests,
        remaining: limit.requests.saturating_sub(log.len() as u32),
        reset_at: Timestamp::now().plus_millis(until_oldest_expires(log, now, window)),
        window_ms: limit.window_ms,
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let storage_key = key.to_storage_key();
        let limit = self.config.limit_for(&key);
        let window = Duration::from_millis(limit.window_ms);
        let now = Instant::now();

        let mut state = self.state.lock().await;
        state.sweep(now, self.longest_window());
        let log = state.by_key.entry(storage_key).or_default();
        prune(log, now, window);

        if log.len() as u32 >= limit.requests {
            let retry_after_ms = until_oldest_expires(log, now, window).max(1);
            return Ok(RateLimitResult::Denied(RateLimitDenied {
                limit: limit.requests,
                retry_after_ms,
                scope: key.scope,
                message: format!(
                    "Rate limit exceeded for {}. Retry after {} ms.",
                    key.scope, retry_after_ms
                ),
            }));
        }

        log.push_back(now);
        Ok(RateLimitResult::Allowed(status_of(log, now, limit)))
    }

    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
        let storage_key = key.to_storage_key();
        let limit = self.config.limit_for(&key);
        let window = Duration::from_millis(limit.window_ms);
        let now = Instant::now();

        let mut state = self.state.lock().await;
        state.sweep(now, self.longest_window());
        let status = match state.by_key.get_mut(&storage_key) {
            Some(log) => {
                prune(log, now, window);
                status_of(log, now, limit)
            }
            None => status_of(&VecDeque::new(), now, limit),
        };
        if state.by_key.get(&storage_key).is_some_and(VecDeque::is_empty) {
            state.by_key.remove(&storage_key);
        }
        Ok(status)
    }

    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError> {
        self.state.lock().await.by_key.remove(&key.to_storage_key());
        Ok(())
    }
}
