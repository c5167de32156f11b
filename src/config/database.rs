//! History store connection settings

use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use super::error::ValidationError;

/// Upper bound on pool size.
pub const MAX_POOL_SIZE: u32 = 100;

/// PostgreSQL pool settings for the message history.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` or `postgresql://` URL
    pub url: String,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a handler may wait for a pooled connection
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Apply `migrations/` at startup
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Pool options built from these settings; the caller connects.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout())
    }

    /// Checks the URL scheme, `min <= max <= 100` and a non-zero acquire timeout.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("CHAT_HUB__DATABASE__URL"));
        }
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max_connections > MAX_POOL_SIZE {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        if self.acquire_timeout_secs == 0 {
            return Err(ValidationError::InvalidAcquireTimeout);
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            run_migrations: false,
        }
    }
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_suit_a_single_hub_process() {
        let config = with_url("postgres://chat@localhost/chat");
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout(), Duration::from_secs(5));
        assert!(!config.run_migrations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_url_is_missing() {
        assert!(matches!(
            with_url("  ").validate(),
            Err(ValidationError::MissingRequired("CHAT_HUB__DATABASE__URL"))
        ));
    }

    #[test]
    fn both_postgres_schemes_are_accepted() {
        assert!(with_url("postgres://localhost/chat").validate().is_ok());
        assert!(with_url("postgresql://localhost/chat").validate().is_ok());
        assert!(matches!(
            with_url("sqlite://chat.db").validate(),
            Err(ValidationError::InvalidDatabaseUrl)
        ));
    }

    #[test]
    fn pool_bounds_are_enforced() {
        let inverted = DatabaseConfig {
            min_connections: 8,
            max_connections: 4,
            ..with_url("postgres://localhost/chat")
        };
        assert!(matches!(inverted.validate(), Err(ValidationError::InvalidPoolSize)));

        let empty = DatabaseConfig {
            min_connections: 0,
            max_connections: 0,
            ..with_url("postgres://localhost/chat")
        };
        assert!(matches!(empty.validate(), Err(ValidationError::InvalidPoolSize)));

        let at_limit = DatabaseConfig {
            max_connections: MAX_POOL_SIZE,
            ..with_url("postgres://localhost/chat")
        };
        assert!(at_limit.validate().is_ok());

        let over_limit = DatabaseConfig {
            max_connections: MAX_POOL_SIZE + 1,
            ..with_url("postgres://localhost/chat")
        };
        assert!(matches!(over_limit.validate(), Err(ValidationError::PoolSizeTooLarge)));
    }

    #[test]
    fn zero_acquire_timeout_is_rejected() {
        let config = DatabaseConfig {
            acquire_timeout_secs: 0,
            ..with_url("postgres://localhost/chat")
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidAcquireTimeout)));
    }

    #[test]
    fn pool_options_carry_pool_bounds() {
        let config = DatabaseConfig {
            min_connections: 2,
            max_connections: 6,
            acquire_timeout_secs: 3,
            ..with_url("postgres://localhost/chat")
        };
        let options = config.pool_options();
        assert_eq!(options.get_min_connections(), 2);
        assert_eq!(options.get_max_connections(), 6);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(3));
    }
}
