//! Database configuration module.
//!
//! Provides configuration structures for the SQLite connection pool.

use std::{env, str::FromStr};
use thiserror::Error;

/// URL used when `DATABASE_URL` is unset.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://goofsino.db";

/// URL of a private in-memory database.
pub const IN_MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Error, Eq, PartialEq)]
pub enum DbConfigError {
    #[error("{key} must be a valid {expected}, got {value:?}")]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("DB_MIN_CONNECTIONS ({min}) exceeds DB_MAX_CONNECTIONS ({max})")]
    PoolBounds { min: u32, max: u32 },
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL, e.g. `sqlite://goofsino.db`
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Recognized environment variables:
    /// - `DATABASE_URL`: SQLite connection string (default: `sqlite://goofsino.db`)
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 5)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 1)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    ///
    /// # Errors
    ///
    /// Returns `DbConfigError` if a variable is set but does not parse, or
    /// the pool bounds are inverted.
    pub fn from_env() -> Result<Self, DbConfigError> {
        let defaults = Self::development();
        let config = Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_env("DB_MAX_CONNECTIONS", "u32", defaults.max_connections)?,
            min_connections: parse_env("DB_MIN_CONNECTIONS", "u32", defaults.min_connections)?,
            connection_timeout_secs: parse_env(
                "DB_CONNECTION_TIMEOUT",
                "u64",
                defaults.connection_timeout_secs,
            )?,
            idle_timeout_secs: parse_env("DB_IDLE_TIMEOUT", "u64", defaults.idle_timeout_secs)?,
            max_lifetime_secs: parse_env("DB_MAX_LIFETIME", "u64", defaults.max_lifetime_secs)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration for development
    ///
    /// Uses `sqlite://goofsino.db` in the working directory.
    pub fn development() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
            min_connections: 1,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }

    /// A private in-memory database, used by tests.
    pub fn in_memory() -> Self {
        Self {
            database_url: IN_MEMORY_URL.to_string(),
            ..Self::development()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    pub fn validate(&self) -> Result<(), DbConfigError> {
        if self.min_connections > self.max_connections {
            return Err(DbConfigError::PoolBounds {
                min: self.min_connections,
                max: self.max_connections,
            });
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn parse_env<T: FromStr>(
    key: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, DbConfigError> {
    match env::var(key) {
        Ok(value) => value.parse().map_err(|_| DbConfigError::InvalidValue {
            key,
            expected,
            value,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_detection() {
        assert!(DatabaseConfig::in_memory().is_in_memory());
        assert!(!DatabaseConfig::development().is_in_memory());
        let shared = DatabaseConfig {
            database_url: "sqlite:file:casino?mode=memory&cache=shared".to_string(),
            ..DatabaseConfig::development()
        };
        assert!(shared.is_in_memory());
    }

    #[test]
    fn test_inverted_pool_bounds() {
        let config = DatabaseConfig {
            min_connections: 10,
            max_connections: 2,
            ..DatabaseConfig::development()
        };
        assert_eq!(
            config.validate(),
            Err(DbConfigError::PoolBounds { min: 10, max: 2 })
        );
    }
}
