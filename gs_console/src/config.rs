//! Console configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use goofsino::{DatabaseConfig, GameConfig, LedgerConfig, db::DbConfigError};

/// Complete console configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Starting balance, minimum bet and lock timeout
    pub ledger: LedgerConfig,
    /// Shoe sizes and table rules
    pub games: GameConfig,
    /// Chat user allowed to run operator commands
    pub operator: String,
}

impl ConsoleConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `operator_override` - Optional operator name override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but can't be parsed
    pub fn from_env(
        database_url_override: Option<String>,
        operator_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut database = DatabaseConfig::from_env()?;
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        let operator = operator_override
            .or_else(|| std::env::var("GOOFSINO_OPERATOR").ok())
            .unwrap_or_else(|| "operator".to_string());

        Ok(ConsoleConfig {
            database,
            ledger: LedgerConfig::from_env(),
            games: GameConfig::from_env(),
            operator,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;

        self.ledger
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "ledger".to_string(),
                reason,
            })?;

        self.games.validate().map_err(|reason| ConfigError::Invalid {
            var: "games".to_string(),
            reason,
        })?;

        let operator = self.operator.trim();
        if operator.is_empty() || operator.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                var: "GOOFSINO_OPERATOR".to_string(),
                reason: "Must be a single non-empty chat name".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Database(#[from] DbConfigError),

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConsoleConfig {
        ConsoleConfig {
            database: DatabaseConfig::in_memory(),
            ledger: LedgerConfig::default(),
            games: GameConfig::default(),
            operator: "croupier".to_string(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_operator() {
        let mut config = config();
        config.operator = "   ".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        config.operator = "two words".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_ledger() {
        let mut config = config();
        config.ledger.starting_balance = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("STARTING_BALANCE"));
    }

    #[test]
    fn test_config_validation_pool_bounds() {
        let mut config = config();
        config.database.min_connections = 10;
        config.database.max_connections = 2;
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Database(DbConfigError::PoolBounds { .. })
        ));
    }
}
