//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PRESENCE_RELAY` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use presence_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Relay listening on {:?}", config.server.socket_addr());
//! ```

mod database;
mod error;
mod oauth;
mod redis;
mod relay;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use oauth::OAuthConfig;
pub use redis::RedisConfig;
pub use relay::RelayConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bind address, environment, logging
    #[serde(default)]
    pub server: ServerConfig,

    /// Credential store (PostgreSQL)
    pub database: DatabaseConfig,

    /// Shared rate limiter; absent means per-process limiting
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    /// External OAuth platform
    pub oauth: OAuthConfig,

    /// Queues and rate limits
    #[serde(default)]
    pub relay: RelayConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PRESENCE_RELAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PRESENCE_RELAY__SERVER__PORT=8237` -> `server.port = 8237`
    /// - `PRESENCE_RELAY__OAUTH__CLIENT_ID=...` -> `oauth.client_id = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PRESENCE_RELAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        self.oauth.validate(self.server.environment)?;
        self.relay.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; serialize tests that touch them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "PRESENCE_RELAY__DATABASE__URL",
        "PRESENCE_RELAY__OAUTH__CLIENT_ID",
        "PRESENCE_RELAY__OAUTH__CLIENT_SECRET",
        "PRESENCE_RELAY__OAUTH__CALLBACK_URI",
        "PRESENCE_RELAY__REDIS__URL",
        "PRESENCE_RELAY__SERVER__PORT",
        "PRESENCE_RELAY__SERVER__ENVIRONMENT",
        "PRESENCE_RELAY__RELAY__RATE_LIMIT_REQUESTS",
    ];

    fn set_minimal_env() {
        env::set_var("PRESENCE_RELAY__DATABASE__URL", "postgres://relay@localhost/relay");
        env::set_var("PRESENCE_RELAY__OAUTH__CLIENT_ID", "1234");
        env::set_var("PRESENCE_RELAY__OAUTH__CLIENT_SECRET", "shh");
        env::set_var(
            "PRESENCE_RELAY__OAUTH__CALLBACK_URI",
            "https://relay.example.com/authorize/callback",
        );
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn loads_minimal_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.database.url, "postgres://relay@localhost/relay");
        assert_eq!(config.oauth.client_id, "1234");
        assert_eq!(config.oauth.client_secret.expose_secret(), "shh");
        assert!(config.redis.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_apply() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.server.port, 8237);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.relay.rate_limit_requests, 2);
        assert_eq!(config.oauth.scope, "identify");
    }

    #[test]
    fn nested_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("PRESENCE_RELAY__SERVER__PORT", "3000"),
            ("PRESENCE_RELAY__SERVER__ENVIRONMENT", "production"),
            ("PRESENCE_RELAY__REDIS__URL", "redis://localhost:6379"),
            ("PRESENCE_RELAY__RELAY__RATE_LIMIT_REQUESTS", "5"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert_eq!(
            config.redis.as_ref().map(|r| r.url.as_str()),
            Some("redis://localhost:6379")
        );
        assert_eq!(config.relay.rate_limit().per_ip.requests, 5);
    }

    #[test]
    fn missing_oauth_section_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PRESENCE_RELAY__DATABASE__URL", "postgres://relay@localhost/relay");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }
}
