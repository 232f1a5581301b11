//! Rate limit configuration types.

use serde::{Deserialize, Serialize};

use crate::ports::{RateLimitKey, RateLimitScope};

/// Complete rate limit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Ceiling across all callers (infrastructure protection).
    pub global: WindowLimit,
    /// Per network origin.
    pub per_ip: WindowLimit,
}

/// `requests` allowed in any sliding window of `window_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowLimit {
    pub requests: u32,
    pub window_ms: u64,
}

impl WindowLimit {
    pub const fn new(requests: u32, window_ms: u64) -> Self {
        Self {
            requests,
            window_ms,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global: WindowLimit::new(10_000, 60_000),
            per_ip: WindowLimit::new(2, 1_000),
        }
    }
}

impl RateLimitConfig {
    /// Default global ceiling with a custom per-origin budget.
    pub fn per_ip(requests: u32, window_ms: u64) -> Self {
        Self {
            per_ip: WindowLimit::new(requests, window_ms),
            ..Self::default()
        }
    }

    /// Limit applying to `key`.
    pub fn limit_for(&self, key: &RateLimitKey) -> WindowLimit {
        match key.scope {
            RateLimitScope::Global => self.global,
            RateLimitScope::Ip => self.per_ip,
        }
    }
}
