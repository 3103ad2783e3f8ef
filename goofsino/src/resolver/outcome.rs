//! Mapping from a round outcome to how every bet type of its game resolves.
//!
//! Pure functions only: settlement happens in the resolver.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::{
    catalog::{BetType, Resolution},
    games::{BaccaratOutcome, BlackjackOutcome, Color, GameKind, RouletteOutcome, Side},
};

/// Implemented by every game outcome.
#[enum_dispatch]
pub trait Resolve {
    fn game(&self) -> GameKind;

    /// How each bet type of the outcome's game resolves. Covers every bet
    /// type of the game exactly once.
    fn resolutions(&self) -> Vec<(BetType, Resolution)>;

    /// One-line description for the chat.
    fn summary(&self) -> String;
}

/// The outcome of a finished round on any table.
#[enum_dispatch(Resolve)]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Outcome {
    RouletteOutcome,
    BlackjackOutcome,
    BaccaratOutcome,
}

impl Resolve for RouletteOutcome {
    fn game(&self) -> GameKind {
        GameKind::Roulette
    }

    fn resolutions(&self) -> Vec<(BetType, Resolution)> {
        let pocket = self.pocket;
        BetType::for_game(GameKind::Roulette)
            .into_iter()
            .map(|bet| {
                let won = match bet {
                    BetType::Red => pocket.color() == Color::Red,
                    BetType::Black => pocket.color() == Color::Black,
                    BetType::Green => pocket.is_green(),
                    BetType::Even => pocket.is_even(),
                    BetType::Odd => pocket.is_odd(),
                    BetType::Low => pocket.is_low(),
                    BetType::High => pocket.is_high(),
                    BetType::FirstDozen => pocket.dozen() == 1,
                    BetType::SecondDozen => pocket.dozen() == 2,
                    BetType::ThirdDozen => pocket.dozen() == 3,
                    BetType::FirstColumn => pocket.column() == 1,
                    BetType::SecondColumn => pocket.column() == 2,
                    BetType::ThirdColumn => pocket.column() == 3,
                    BetType::TopLine => pocket.is_top_line(),
                    BetType::Straight(target) => target == pocket,
                    _ => false,
                };
                (bet, Resolution::from(won))
            })
            .collect()
    }

    fn summary(&self) -> String {
        format!("The ball lands on {self}!")
    }
}

impl Resolve for BlackjackOutcome {
    fn game(&self) -> GameKind {
        GameKind::Blackjack
    }

    /// The player bet follows the majority of hands; with split hands that
    /// win and lose equally it pushes. The dealer bet is its mirror image.
    fn resolutions(&self) -> Vec<(BetType, Resolution)> {
        let (player, dealer) = match self.wins().cmp(&self.losses()) {
            Ordering::Greater => (Resolution::Won, Resolution::Lost),
            Ordering::Less => (Resolution::Lost, Resolution::Won),
            Ordering::Equal => (Resolution::Push, Resolution::Push),
        };
        vec![
            (BetType::Player, player),
            (BetType::Dealer, dealer),
            (BetType::Natural, Resolution::from(self.natural)),
        ]
    }

    fn summary(&self) -> String {
        self.to_string()
    }
}

impl Resolve for BaccaratOutcome {
    fn game(&self) -> GameKind {
        GameKind::Baccarat
    }

    /// On a tie, punto and banco wagers push.
    fn resolutions(&self) -> Vec<(BetType, Resolution)> {
        let (punto, banco, tie) = match self.winner {
            Side::Punto => (Resolution::Won, Resolution::Lost, Resolution::Lost),
            Side::Banco => (Resolution::Lost, Resolution::Won, Resolution::Lost),
            Side::Tie => (Resolution::Push, Resolution::Push, Resolution::Won),
        };
        vec![
            (BetType::Punto, punto),
            (BetType::Banco, banco),
            (BetType::Tie, tie),
        ]
    }

    fn summary(&self) -> String {
        self.to_string()
    }
}
