//! Relay tuning: per-connection queues and the ingress rate limit

use serde::Deserialize;

use crate::adapters::rate_limiter::RateLimitConfig;

use super::error::ValidationError;

/// Relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Events a connection may have queued before new ones are dropped for it
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer: usize,

    /// Ingress requests allowed per origin per window
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,

    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,
}

impl RelayConfig {
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::per_ip(self.rate_limit_requests, self.rate_limit_window_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.connection_buffer == 0 {
            return Err(ValidationError::InvalidConnectionBuffer);
        }
        if self.rate_limit_requests == 0 || self.rate_limit_window_ms == 0 {
            return Err(ValidationError::InvalidRateLimit);
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            connection_buffer: default_connection_buffer(),
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
        }
    }
}

fn default_connection_buffer() -> usize {
    64
}

fn default_rate_limit_requests() -> u32 {
    2
}

fn default_rate_limit_window_ms() -> u64 {
    1_000
}
