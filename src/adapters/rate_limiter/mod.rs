//! Rate limiter adapters.
//!
//! Implementations of the RateLimiter port for different backends.
//!
//! ## Available Adapters
//!
//! - `InMemoryRateLimiter` - single process, sliding-window log
//! - `RedisRateLimiter` - shared between processes, sorted-set sliding window
//!
//! ## Usage
//!
//! ```ignore
//! use presence_relay::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig};
//!
//! let limiter = InMemoryRateLimiter::new(RateLimitConfig::per_ip(2, 1_000));
//! let limiter = RedisRateLimiter::connect("redis://127.0.0.1/", RateLimitConfig::default()).await?;
//! ```

mod config;
mod in_memory;
mod redis;

pub use config::{RateLimitConfig, WindowLimit};
pub use in_memory::InMemoryRateLimiter;
pub use redis::RedisRateLimiter;
