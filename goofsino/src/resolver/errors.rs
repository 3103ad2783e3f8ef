//! Bet resolver error types.

use thiserror::Error;

use crate::{
    games::{GameError, GameKind},
    ledger::LedgerError,
};

#[derive(Debug, Error)]
pub enum CasinoError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("The table refused: {0}")]
    Game(#[from] GameError),

    /// Wager text that isn't a whole number
    #[error("{0:?} isn't a valid amount, bet a whole number of points")]
    InvalidAmount(String),

    #[error("{0}")]
    UnknownPocket(String),

    #[error("Bets are closed on {0} until the current round is settled")]
    BetsClosed(GameKind),
}

impl CasinoError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            CasinoError::Ledger(err) => err.client_message(),
            _ => self.to_string(),
        }
    }
}

pub type CasinoResult<T> = Result<T, CasinoError>;
