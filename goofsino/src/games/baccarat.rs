//! Punto banco baccarat dealt from a multi-deck shoe.

use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    GameConfig, GameError, Phase,
    cards::{ACE, Card, Shoe, show_cards},
};

/// Most cards a coup can take: two per side plus both third cards.
pub const COUP_CARDS: usize = 6;

/// Baccarat value of a card: ace 1, two to nine at face value, tens and
/// court cards 0.
pub fn card_value(card: &Card) -> u8 {
    match card.rank() {
        ACE => 1,
        r @ 2..=9 => r,
        _ => 0,
    }
}

/// Hand total: sum of card values mod 10.
pub fn hand_total(cards: &[Card]) -> u8 {
    cards.iter().map(card_value).sum::<u8>() % 10
}

/// Punto draws a third card on 0-5 and stands on 6-7.
pub fn punto_draws(punto_total: u8) -> bool {
    punto_total <= 5
}

/// Banco's third-card rule. Without a Punto third card Banco draws on 0-5;
/// otherwise the standard tableau applies to totals 3-6.
pub fn banco_draws(banco_total: u8, punto_third: Option<&Card>) -> bool {
    let Some(third) = punto_third.map(card_value) else {
        return banco_total <= 5;
    };
    match banco_total {
        0..=2 => true,
        3 => third != 8,
        4 => (2..=7).contains(&third),
        5 => (4..=7).contains(&third),
        6 => (6..=7).contains(&third),
        _ => false,
    }
}

/// Cards burned off the top of a fresh shoe.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Burn {
    /// Face-up card that set the burn count
    pub revealed: Card,
    /// Cards discarded after the revealed one
    pub burned: usize,
}

/// Reveals the top card and discards as many cards as its value, ten for a
/// zero-valued card.
pub fn burn(shoe: &mut Shoe) -> Result<Burn, GameError> {
    let revealed = shoe.draw()?;
    let burned = match card_value(&revealed) {
        0 => 10,
        v => v as usize,
    };
    shoe.skip(burned)?;
    Ok(Burn { revealed, burned })
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Side {
    Punto,
    Banco,
    Tie,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Punto => "Punto wins",
            Self::Banco => "Banco wins",
            Self::Tie => "Tie",
        };
        write!(f, "{repr}")
    }
}

/// A finished coup.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BaccaratOutcome {
    pub punto: Vec<Card>,
    pub banco: Vec<Card>,
    pub winner: Side,
}

impl BaccaratOutcome {
    pub fn punto_total(&self) -> u8 {
        hand_total(&self.punto)
    }

    pub fn banco_total(&self) -> u8 {
        hand_total(&self.banco)
    }
}

impl fmt::Display for BaccaratOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Punto: {} ({}) | Banco: {} ({}) | {}",
            show_cards(&self.punto),
            self.punto_total(),
            show_cards(&self.banco),
            self.banco_total(),
            self.winner
        )
    }
}

#[derive(Debug)]
pub struct BaccaratTable {
    shoe: Shoe,
    burn_on_shuffle: bool,
    /// The shoe still needs its first shuffle.
    fresh: bool,
    phase: Phase,
    last_burn: Option<Burn>,
    pending: Option<BaccaratOutcome>,
}

impl BaccaratTable {
    /// Builds a table whose shoe gets shuffled (and burned) before the first
    /// coup.
    pub fn new(config: &GameConfig) -> Self {
        Self {
            shoe: Shoe::new(config.baccarat_decks, config.baccarat_penetration),
            burn_on_shuffle: config.baccarat_burn,
            fresh: true,
            phase: Phase::Idle,
            last_burn: None,
            pending: None,
        }
    }

    pub fn with_shoe(shoe: Shoe, burn_on_shuffle: bool) -> Self {
        Self {
            shoe,
            burn_on_shuffle,
            fresh: false,
            phase: Phase::Idle,
            last_burn: None,
            pending: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_burn(&self) -> Option<Burn> {
        self.last_burn
    }

    pub fn pending(&self) -> Option<&BaccaratOutcome> {
        self.pending.as_ref()
    }

    pub fn mark_settled(&mut self) {
        self.pending = None;
        self.phase = Phase::Idle;
    }

    /// Shuffles the shoe and, when enabled, burns cards off the top.
    pub fn reshuffle<R: Rng + CryptoRng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        self.shoe.shuffle(rng);
        self.fresh = false;
        self.last_burn = if self.burn_on_shuffle {
            let burned = burn(&mut self.shoe)?;
            log::info!(
                "Baccarat shoe shuffled, {} revealed and {} cards burned",
                burned.revealed,
                burned.burned
            );
            Some(burned)
        } else {
            None
        };
        Ok(())
    }

    /// Deals a full coup: two cards each (P, B, P, B), then third cards by the
    /// tableau unless either side has a natural 8 or 9.
    pub fn deal<R: Rng + CryptoRng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<BaccaratOutcome, GameError> {
        if self.phase == Phase::Resolved {
            return Err(GameError::UnsettledRound);
        }
        if self.fresh || self.shoe.needs_reshuffle() {
            self.reshuffle(rng)?;
        }
        if self.shoe.remaining() < COUP_CARDS {
            return Err(GameError::ShoeExhausted);
        }

        let mut punto = vec![self.shoe.draw()?];
        let mut banco = vec![self.shoe.draw()?];
        punto.push(self.shoe.draw()?);
        banco.push(self.shoe.draw()?);

        let punto_two = hand_total(&punto);
        let banco_two = hand_total(&banco);
        if punto_two < 8 && banco_two < 8 {
            let punto_third = if punto_draws(punto_two) {
                let card = self.shoe.draw()?;
                punto.push(card);
                Some(card)
            } else {
                None
            };
            if banco_draws(banco_two, punto_third.as_ref()) {
                banco.push(self.shoe.draw()?);
            }
        }

        let winner = match hand_total(&punto).cmp(&hand_total(&banco)) {
            std::cmp::Ordering::Greater => Side::Punto,
            std::cmp::Ordering::Less => Side::Banco,
            std::cmp::Ordering::Equal => Side::Tie,
        };
        let outcome = BaccaratOutcome {
            punto,
            banco,
            winner,
        };
        self.phase = Phase::Resolved;
        self.pending = Some(outcome.clone());
        Ok(outcome)
    }

    pub fn status(&self) -> String {
        match &self.pending {
            Some(outcome) => format!("Baccarat is {}. {outcome}", self.phase),
            None => format!(
                "Baccarat is {}. {} cards left in the shoe",
                self.phase,
                self.shoe.remaining()
            ),
        }
    }
}
