//! Ledger configuration.

use std::{env, time::Duration};

/// Money rules of the casino.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Balance given to new accounts and restored on bankruptcy
    pub starting_balance: i64,

    /// Smallest accepted wager
    pub min_bet: i64,

    /// How long a caller waits for the ledger lock before giving up
    pub lock_timeout: Duration,
}

impl LedgerConfig {
    /// Create configuration from environment variables
    ///
    /// Recognized variables (all optional):
    /// - `STARTING_BALANCE` (default: 1000)
    /// - `MIN_BET` (default: 1)
    /// - `LEDGER_LOCK_TIMEOUT_MS` (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            starting_balance: parse_env_or("STARTING_BALANCE", defaults.starting_balance),
            min_bet: parse_env_or("MIN_BET", defaults.min_bet),
            lock_timeout: env::var("LEDGER_LOCK_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.lock_timeout),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.starting_balance <= 0 {
            return Err("STARTING_BALANCE must be positive".to_string());
        }
        if self.min_bet < 1 {
            return Err("MIN_BET must be at least 1".to_string());
        }
        if self.lock_timeout.is_zero() {
            return Err("LEDGER_LOCK_TIMEOUT_MS must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            starting_balance: 1000,
            min_bet: 1,
            lock_timeout: Duration::from_millis(5000),
        }
    }
}

fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
