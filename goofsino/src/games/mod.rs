//! Game engines: card and wheel primitives plus the roulette, blackjack and
//! baccarat tables.
//!
//! Engines know nothing about money. Each table walks the same lifecycle:
//!
//! - **Idle**: no round in play, bets are open
//! - **Dealt / Spun**: a round is in play (blackjack only, waiting on actions)
//! - **Resolved**: an outcome exists but has not been settled yet
//!
//! A resolved table goes back to idle once the resolver reports a successful
//! settlement through `mark_settled`.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub mod baccarat;
pub mod blackjack;
pub mod cards;
pub mod config;
pub mod roulette;

pub use baccarat::{BaccaratOutcome, BaccaratTable, Burn, Side};
pub use blackjack::{BlackjackOutcome, BlackjackTable, Hand, HandResult, HandValue};
pub use cards::{Card, Shoe, Suit};
pub use config::GameConfig;
pub use roulette::{Color, Pocket, RouletteOutcome, RouletteTable};

/// The games offered at the casino.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum GameKind {
    Roulette,
    Blackjack,
    Baccarat,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::Roulette, GameKind::Blackjack, GameKind::Baccarat];
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Roulette => "roulette",
            Self::Blackjack => "blackjack",
            Self::Baccarat => "baccarat",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "roulette" => Ok(Self::Roulette),
            "blackjack" | "bj" => Ok(Self::Blackjack),
            "baccarat" => Ok(Self::Baccarat),
            other => Err(format!("There is no {other} table")),
        }
    }
}

/// Errors raised by a table when an action doesn't fit its current phase.
#[derive(Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("a round is already in progress")]
    RoundInProgress,
    #[error("no round in progress")]
    NoRoundInProgress,
    #[error("the last round hasn't been settled yet")]
    UnsettledRound,
    #[error("no player hand is left to play")]
    NoHandToPlay,
    #[error("can only split a first two-card hand of matching rank")]
    IllegalSplit,
    #[error("the shoe ran out of cards")]
    ShoeExhausted,
}

/// Round lifecycle shared by all tables.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Phase {
    #[default]
    Idle,
    Dealt,
    Resolved,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Idle => "idle",
            Self::Dealt => "in progress",
            Self::Resolved => "awaiting settlement",
        };
        write!(f, "{repr}")
    }
}
