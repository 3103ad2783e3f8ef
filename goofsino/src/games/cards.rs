use rand::{CryptoRng, Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::GameError;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card ranks.
pub type Value = u8;

pub const ACE: Value = 1;
pub const JACK: Value = 11;
pub const QUEEN: Value = 12;
pub const KING: Value = 13;

/// A card is a tuple of a rank (ace=1u8 ... king=13u8) and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    pub fn rank(&self) -> Value {
        self.0
    }

    pub fn is_ace(&self) -> bool {
        self.0 == ACE
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            ACE => "A",
            JACK => "J",
            QUEEN => "Q",
            KING => "K",
            v => &v.to_string(),
        };
        write!(f, "{value}{}", self.1)
    }
}

/// Formats a run of cards separated by spaces.
pub fn show_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A multi-deck card source with a cursor and a cut depth.
///
/// Cards are dealt from `cursor` onwards. Once the cursor reaches the cut
/// depth the shoe reports that it wants a reshuffle; it is up to the table to
/// reshuffle between rounds and never in the middle of one.
#[derive(Clone, Debug)]
pub struct Shoe {
    cards: Vec<Card>,
    cursor: usize,
    cut: usize,
}

impl Shoe {
    /// Builds an ordered shoe of `decks` standard 52-card decks. The cut card
    /// sits at `penetration` (a fraction of the shoe) from the front.
    pub fn new(decks: usize, penetration: f64) -> Self {
        let mut cards = Vec::with_capacity(52 * decks);
        for _ in 0..decks {
            for value in ACE..=KING {
                for suit in Suit::ALL {
                    cards.push(Card(value, suit));
                }
            }
        }
        let cut = ((cards.len() as f64) * penetration.clamp(0.0, 1.0)) as usize;
        Self {
            cards,
            cursor: 0,
            cut,
        }
    }

    /// Builds a shoe that deals exactly `cards` in order. The cut card is
    /// placed after the last card, so the shoe only asks for a reshuffle once
    /// it is empty.
    pub fn stacked(cards: Vec<Card>) -> Self {
        let cut = cards.len();
        Self {
            cards,
            cursor: 0,
            cut,
        }
    }

    /// Shuffles every card back into the shoe (Fisher-Yates) and resets the
    /// cursor.
    pub fn shuffle<R: Rng + CryptoRng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.cursor = 0;
    }

    pub fn draw(&mut self) -> Result<Card, GameError> {
        let card = *self
            .cards
            .get(self.cursor)
            .ok_or(GameError::ShoeExhausted)?;
        self.cursor += 1;
        Ok(card)
    }

    /// Discards `count` cards from the front of the shoe.
    pub fn skip(&mut self, count: usize) -> Result<(), GameError> {
        if self.remaining() < count {
            return Err(GameError::ShoeExhausted);
        }
        self.cursor += count;
        Ok(())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.cursor
    }

    /// Cards left once the cut card comes out.
    pub fn behind_cut(&self) -> usize {
        self.cards.len().saturating_sub(self.cut)
    }

    pub fn needs_reshuffle(&self) -> bool {
        self.cursor >= self.cut
    }
}
