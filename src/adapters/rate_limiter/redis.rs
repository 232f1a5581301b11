//! Redis-backed rate limiter for relays running as several processes.
//!
//! Uses a sliding window over a sorted set per key: members are accepted
//! requests scored by their arrival time in milliseconds. Pruning, counting
//! and recording run in one Lua script, so concurrent processes can never
//! jointly overshoot the limit.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};
use uuid::Uuid;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter,
};

use super::config::{RateLimitConfig, WindowLimit};

/// KEYS[1] = key; ARGV = now_ms, window_ms, limit, member.
/// Returns {allowed, count, oldest_ms}.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
local oldest = now
local first = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
if first[2] then
    oldest = tonumber(first[2])
end

if count >= limit then
    return {0, count, oldest}
end

redis.call('ZADD', key, now, ARGV[4])
redis.call('PEXPIRE', key, window)
return {1, count + 1, oldest}
"#;

/// Redis-backed sliding-window rate limiter.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    config: RateLimitConfig,
    script: Script,
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection, config: RateLimitConfig) -> Self {
        Self {
            conn,
            config,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
        }
    }

    /// Connect to `url` and build a limiter over a multiplexed connection.
    pub async fn connect(url: &str, config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self::new(conn, config))
    }
}

fn unavailable(e: redis::RedisError) -> RateLimitError {
    RateLimitError::Unavailable(e.to_string())
}

/// Milliseconds until a request arriving `now_ms` would be admitted.
fn retry_after_ms(oldest_ms: u64, now_ms: u64, limit: WindowLimit) -> u64 {
    (oldest_ms + limit.window_ms).saturating_sub(now_ms).max(1)
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let storage_key = key.to_storage_key();
        let limit = self.config.limit_for(&key);
        let now_ms = Timestamp::now().as_unix_millis();
        let member = format!("{}-{}", now_ms, Uuid::new_v4());

        let mut conn = self.conn.clone();
        let (allowed, count, oldest_ms): (i64, i64, i64) = self
            .script
            .key(&storage_key)
            .arg(now_ms)
            .arg(limit.window_ms)
            .arg(limit.requests)
            .arg(member)
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        let oldest_ms = oldest_ms.max(0) as u64;

        if allowed == 0 {
            let retry_after_ms = retry_after_ms(oldest_ms, now_ms, limit);
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

        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit: limit.requests,
            remaining: limit.requests.saturating_sub(count.max(0) as u32),
            reset_at: Timestamp::from_unix_millis(oldest_ms + limit.window_ms),
            window_ms: limit.window_ms,
        }))
    }

    async fn status(&self, key: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
        let storage_key = key.to_storage_key();
        let limit = self.config.limit_for(&key);
        let now_ms = Timestamp::now().as_unix_millis();
        let window_start = format!("({}", now_ms.saturating_sub(limit.window_ms));

        let mut conn = self.conn.clone();
        let count: u32 = conn
            .zcount(&storage_key, window_start, "+inf")
            .await
            .map_err(unavailable)?;

        Ok(RateLimitStatus {
            limit: limit.requests,
            remaining: limit.requests.saturating_sub(count),
            reset_at: Timestamp::from_unix_millis(now_ms + limit.window_ms),
            window_ms: limit.window_ms,
        })
    }

    async fn reset(&self, key: RateLimitKey) -> Result<(), RateLimitError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key.to_storage_key())
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_counts_from_oldest_entry() {
        let limit = WindowLimit::new(2, 1_000);
        assert_eq!(retry_after_ms(10_000, 10_300, limit), 700);
    }

    #[test]
    fn retry_after_is_never_zero() {
        let limit = WindowLimit::new(2, 1_000);
        assert_eq!(retry_after_ms(10_000, 11_000, limit), 1);
        assert_eq!(retry_after_ms(10_000, 12_000, limit), 1);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis at REDIS_URL"]
    async fn shared_window_denies_third_request() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into());
        let limiter = RedisRateLimiter::connect(&url, RateLimitConfig::per_ip(2, 1_000))
            .await
            .unwrap();
        let key = RateLimitKey::ip_resource(&Uuid::new_v4().to_string(), "status_update");

        assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
        assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
        assert!(limiter.check(key.clone()).await.unwrap().is_denied());

        limiter.reset(key.clone()).await.unwrap();
        assert_eq!(limiter.status(key).await.unwrap().remaining, 2);
    }
}
