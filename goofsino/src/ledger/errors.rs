//! Ledger error types.

use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Wager under the configured minimum
    #[error("The minimum bet is {minimum} points")]
    BelowMinimum { minimum: i64, requested: i64 },

    /// Wager would commit more than the balance
    #[error("Insufficient funds: balance {balance}, already wagered {open}, requested {requested}")]
    InsufficientFunds {
        balance: i64,
        open: i64,
        requested: i64,
    },

    /// The house account can't place bets or be reset
    #[error("Account {0} is reserved")]
    ReservedAccount(String),

    /// Empty account identifier
    #[error("Account identifier must not be empty")]
    InvalidAccount,

    /// The ledger lock couldn't be acquired in time
    #[error("Ledger is busy, timed out after {0:?}")]
    Busy(std::time::Duration),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Money conservation or storage invariant broken; the transaction is aborted
    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),
}

impl LedgerError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            LedgerError::Database(_) | LedgerError::InvariantViolation(_) => {
                "The casino broke! Please try again later.".to_string()
            }
            LedgerError::Busy(_) => "The casino is busy right now, try again in a moment.".to_string(),
            LedgerError::InsufficientFunds {
                balance,
                open,
                requested,
            } => format!(
                "You can't afford that! Balance {balance} points, {open} already on the table, asked for {requested}"
            ),
            LedgerError::ReservedAccount(_) => "That account belongs to the house.".to_string(),
            // All other errors are safe to expose
            _ => self.to_string(),
        }
    }

    /// Errors caused by the caller rather than the casino.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::BelowMinimum { .. }
                | LedgerError::InsufficientFunds { .. }
                | LedgerError::ReservedAccount(_)
                | LedgerError::InvalidAccount
        )
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
