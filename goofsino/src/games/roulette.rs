//! American roulette: 38 pockets, `0` and `00` included.

use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{GameError, Phase};

/// A wheel pocket. Numbers 0-36 are stored as-is and `00` is stored as -1.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Pocket(i8);

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Color {
    Red,
    Black,
    Green,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Red => "Red",
            Self::Black => "Black",
            Self::Green => "Green",
        };
        write!(f, "{repr}")
    }
}

impl Pocket {
    pub const DOUBLE_ZERO: Pocket = Pocket(-1);
    pub const ZERO: Pocket = Pocket(0);

    pub fn new(number: i8) -> Option<Self> {
        (-1..=36).contains(&number).then_some(Self(number))
    }

    /// Every pocket on the wheel, `00` first.
    pub fn all() -> impl Iterator<Item = Pocket> {
        (-1..=36).map(Pocket)
    }

    pub fn number(&self) -> i8 {
        self.0
    }

    pub fn is_green(&self) -> bool {
        self.0 <= 0
    }

    pub fn color(&self) -> Color {
        let n = self.0;
        match n {
            1..=10 | 19..=28 if n % 2 == 1 => Color::Red,
            1..=10 | 19..=28 => Color::Black,
            11..=18 | 29..=36 if n % 2 == 1 => Color::Black,
            11..=18 | 29..=36 => Color::Red,
            _ => Color::Green,
        }
    }

    /// Column 1-3, or 0 for the green pockets.
    pub fn column(&self) -> u8 {
        match self.0 {
            n if n >= 1 => match n % 3 {
                0 => 3,
                c => c as u8,
            },
            _ => 0,
        }
    }

    /// Dozen 1-3, or 0 for the green pockets.
    pub fn dozen(&self) -> u8 {
        match self.0 {
            n if n >= 1 => (n as u8).div_ceil(12),
            _ => 0,
        }
    }

    pub fn is_high(&self) -> bool {
        self.0 >= 19
    }

    pub fn is_low(&self) -> bool {
        (1..=18).contains(&self.0)
    }

    pub fn is_even(&self) -> bool {
        self.0 >= 1 && self.0 % 2 == 0
    }

    pub fn is_odd(&self) -> bool {
        self.0 >= 1 && self.0 % 2 == 1
    }

    pub fn is_top_line(&self) -> bool {
        (-1..=3).contains(&self.0)
    }
}

impl fmt::Display for Pocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            -1 => write!(f, "00"),
            n => write!(f, "{n}"),
        }
    }
}

impl FromStr for Pocket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "00" {
            return Ok(Self::DOUBLE_ZERO);
        }
        s.parse::<i8>()
            .ok()
            .filter(|n| (0..=36).contains(n))
            .map(Pocket)
            .ok_or_else(|| format!("{s} is not a pocket on the wheel"))
    }
}

/// The result of one spin.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RouletteOutcome {
    pub pocket: Pocket,
}

impl fmt::Display for RouletteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.pocket, self.pocket.color())
    }
}

/// The wheel and its last result.
#[derive(Debug, Default)]
pub struct RouletteTable {
    phase: Phase,
    last: Option<Pocket>,
}

impl RouletteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_spin(&self) -> Option<Pocket> {
        self.last
    }

    /// Spins the wheel, drawing each of the 38 pockets with equal odds.
    pub fn spin<R: Rng + CryptoRng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<RouletteOutcome, GameError> {
        let number: i8 = rng.random_range(-1..=36);
        self.land(Pocket(number))
    }

    /// Records a ball landing in `pocket`.
    pub fn land(&mut self, pocket: Pocket) -> Result<RouletteOutcome, GameError> {
        if self.phase == Phase::Resolved {
            return Err(GameError::UnsettledRound);
        }
        self.last = Some(pocket);
        self.phase = Phase::Resolved;
        Ok(RouletteOutcome { pocket })
    }

    /// The spin waiting on settlement, if any.
    pub fn pending(&self) -> Option<RouletteOutcome> {
        match (self.phase, self.last) {
            (Phase::Resolved, Some(pocket)) => Some(RouletteOutcome { pocket }),
            _ => None,
        }
    }

    pub fn mark_settled(&mut self) {
        self.phase = Phase::Idle;
    }

    pub fn status(&self) -> String {
        match self.last {
            Some(pocket) => format!(
                "Roulette is {}. Last spin: {} {}",
                self.phase,
                pocket,
                pocket.color()
            ),
            None => format!("Roulette is {}. The wheel hasn't spun yet", self.phase),
        }
    }
}
