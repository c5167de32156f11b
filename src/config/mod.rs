//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `CHAT_HUB` prefix and
//! `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use chat_hub::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod auth;
mod database;
mod error;
mod hub;
mod server;

pub use auth::{AuthConfig, MIN_PRODUCTION_SECRET_BYTES};
pub use database::{DatabaseConfig, MAX_POOL_SIZE};
pub use error::{ConfigError, ValidationError};
pub use hub::HubConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Handshake token verification
    pub auth: AuthConfig,

    /// Connection hub tuning
    #[serde(default)]
    pub hub: HubConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CHAT_HUB` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CHAT_HUB__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CHAT_HUB__HUB__QUEUE_CAPACITY=4096` -> `hub.queue_capacity = 4096`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CHAT_HUB")
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
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.hub.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use std::time::Duration;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("CHAT_HUB__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("CHAT_HUB__AUTH__JWT_SECRET", "development-secret");
    }

    fn clear_env() {
        for key in [
            "CHAT_HUB__DATABASE__URL",
            "CHAT_HUB__AUTH__JWT_SECRET",
            "CHAT_HUB__AUTH__ISSUER",
            "CHAT_HUB__SERVER__PORT",
            "CHAT_HUB__SERVER__ENVIRONMENT",
            "CHAT_HUB__HUB__KEEPALIVE_INTERVAL_SECS",
            "CHAT_HUB__HUB__QUEUE_CAPACITY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("CHAT_HUB__AUTH__ISSUER", "chat-hub-auth");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.auth.issuer.as_deref(), Some("chat-hub-auth"));
        assert_eq!(config.auth.audience, None);
    }

    #[test]
    fn test_validate_minimal_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.hub.keepalive_interval(), Duration::from_secs(10));
        assert_eq!(config.hub.queue_capacity, 1024);
    }

    #[test]
    fn test_hub_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("CHAT_HUB__HUB__KEEPALIVE_INTERVAL_SECS", "30");
        env::set_var("CHAT_HUB__HUB__QUEUE_CAPACITY", "64");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.hub.keepalive_interval_secs, 30);
        assert_eq!(config.hub.queue_capacity, 64);
    }

    #[test]
    fn test_production_rejects_short_secret() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("CHAT_HUB__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert!(matches!(
            config.validate(),
            Err(ValidationError::JwtSecretTooShort(_))
        ));
    }

    #[test]
    fn test_missing_database_url_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("CHAT_HUB__AUTH__JWT_SECRET", "development-secret");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }
}
