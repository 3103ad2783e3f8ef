//! The bet catalog: every wager the casino accepts, its stable identifier,
//! payout and display name.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::games::{GameKind, Pocket};

/// Payout as a rational multiple of the stake, not counting the stake itself.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PayoutRatio {
    pub numer: i64,
    pub denom: i64,
}

impl PayoutRatio {
    pub const fn new(numer: i64, denom: i64) -> Self {
        Self { numer, denom }
    }

    /// Winnings for `amount`, rounded toward zero. `None` on overflow.
    pub fn apply(&self, amount: i64) -> Option<i64> {
        let winnings = i128::from(amount) * i128::from(self.numer) / i128::from(self.denom);
        i64::try_from(winnings).ok()
    }
}

impl fmt::Display for PayoutRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.numer, self.denom)
    }
}

/// How a wager resolved against an outcome.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Resolution {
    Won,
    Lost,
    /// Stake returned, no money moves.
    Push,
}

impl From<bool> for Resolution {
    fn from(won: bool) -> Self {
        if won { Self::Won } else { Self::Lost }
    }
}

/// Every bet the casino takes.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum BetType {
    // Roulette
    Red,
    Black,
    Green,
    Even,
    Odd,
    Low,
    High,
    FirstDozen,
    SecondDozen,
    ThirdDozen,
    FirstColumn,
    SecondColumn,
    ThirdColumn,
    TopLine,
    Straight(Pocket),
    // Baccarat
    Punto,
    Banco,
    Tie,
    // Blackjack
    Player,
    Dealer,
    Natural,
}

impl BetType {
    /// Bets that only need an amount, i.e. everything but straight-up bets.
    pub const SIMPLE: [BetType; 20] = [
        BetType::Red,
        BetType::Black,
        BetType::Green,
        BetType::Even,
        BetType::Odd,
        BetType::Low,
        BetType::High,
        BetType::FirstDozen,
        BetType::SecondDozen,
        BetType::ThirdDozen,
        BetType::FirstColumn,
        BetType::SecondColumn,
        BetType::ThirdColumn,
        BetType::TopLine,
        BetType::Punto,
        BetType::Banco,
        BetType::Tie,
        BetType::Player,
        BetType::Dealer,
        BetType::Natural,
    ];

    /// Every bet type belonging to `game`.
    pub fn for_game(game: GameKind) -> Vec<BetType> {
        let mut bets: Vec<BetType> = Self::SIMPLE
            .into_iter()
            .filter(|bet| bet.game() == game)
            .collect();
        if game == GameKind::Roulette {
            bets.extend(Pocket::all().map(BetType::Straight));
        }
        bets
    }

    pub fn game(&self) -> GameKind {
        match self {
            Self::Punto | Self::Banco | Self::Tie => GameKind::Baccarat,
            Self::Player | Self::Dealer | Self::Natural => GameKind::Blackjack,
            _ => GameKind::Roulette,
        }
    }

    pub fn payout(&self) -> PayoutRatio {
        match self {
            Self::Red | Self::Black | Self::Even | Self::Odd | Self::Low | Self::High => {
                PayoutRatio::new(1, 1)
            }
            Self::Green => PayoutRatio::new(17, 1),
            Self::FirstDozen
            | Self::SecondDozen
            | Self::ThirdDozen
            | Self::FirstColumn
            | Self::SecondColumn
            | Self::ThirdColumn => PayoutRatio::new(2, 1),
            Self::TopLine => PayoutRatio::new(6, 1),
            Self::Straight(_) => PayoutRatio::new(35, 1),
            Self::Punto | Self::Player | Self::Dealer => PayoutRatio::new(1, 1),
            // 5% commission on banco wins
            Self::Banco => PayoutRatio::new(19, 20),
            Self::Tie => PayoutRatio::new(8, 1),
            Self::Natural => PayoutRatio::new(3, 2),
        }
    }

    /// Stable identifier, used as the persisted key and the command name.
    pub fn id(&self) -> String {
        let id = match self {
            Self::Red => "red",
            Self::Black => "black",
            Self::Green => "green",
            Self::Even => "even",
            Self::Odd => "odd",
            Self::Low => "low",
            Self::High => "high",
            Self::FirstDozen => "dozen1",
            Self::SecondDozen => "dozen2",
            Self::ThirdDozen => "dozen3",
            Self::FirstColumn => "column1",
            Self::SecondColumn => "column2",
            Self::ThirdColumn => "column3",
            Self::TopLine => "topline",
            Self::Straight(pocket) => return format!("straight:{pocket}"),
            Self::Punto => "punto",
            Self::Banco => "banco",
            Self::Tie => "tie",
            Self::Player => "player",
            Self::Dealer => "dealer",
            Self::Natural => "natural",
        };
        id.to_string()
    }

    pub fn display_name(&self) -> String {
        let name = match self {
            Self::Red => "Red",
            Self::Black => "Black",
            Self::Green => "Green (0/00)",
            Self::Even => "Even",
            Self::Odd => "Odd",
            Self::Low => "Low (1-18)",
            Self::High => "High (19-36)",
            Self::FirstDozen => "1st Dozen",
            Self::SecondDozen => "2nd Dozen",
            Self::ThirdDozen => "3rd Dozen",
            Self::FirstColumn => "1st Column",
            Self::SecondColumn => "2nd Column",
            Self::ThirdColumn => "3rd Column",
            Self::TopLine => "Top Line (00-0-1-2-3)",
            Self::Straight(pocket) => return format!("Straight Up {pocket}"),
            Self::Punto => "Punto",
            Self::Banco => "Banco",
            Self::Tie => "Tie",
            Self::Player => "Player",
            Self::Dealer => "Dealer",
            Self::Natural => "Blackjack",
        };
        name.to_string()
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for BetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if let Some(pocket) = s.strip_prefix("straight:") {
            return pocket.parse().map(BetType::Straight);
        }
        Self::SIMPLE
            .into_iter()
            .find(|bet| bet.id() == s)
            .ok_or_else(|| format!("unknown bet type {s}"))
    }
}
