//! Table configuration.

use std::env;

use super::{baccarat::COUP_CARDS, blackjack::ROUND_RESERVE, cards::Shoe};

/// Shoe and house-rule settings for the card tables.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Number of 52-card decks in the blackjack shoe
    pub blackjack_decks: usize,

    /// Fraction of the blackjack shoe dealt before a reshuffle is due
    pub blackjack_penetration: f64,

    /// Whether the dealer draws on a soft 17
    pub dealer_hits_soft_17: bool,

    /// Number of 52-card decks in the baccarat shoe
    pub baccarat_decks: usize,

    /// Fraction of the baccarat shoe dealt before a reshuffle is due
    pub baccarat_penetration: f64,

    /// Whether a fresh baccarat shoe burns cards off the top
    pub baccarat_burn: bool,
}

impl GameConfig {
    /// Create configuration from environment variables
    ///
    /// Recognized variables (all optional):
    /// - `BLACKJACK_DECKS` (default: 6)
    /// - `BLACKJACK_PENETRATION` (default: 0.75)
    /// - `DEALER_HITS_SOFT_17` (default: false)
    /// - `BACCARAT_DECKS` (default: 8)
    /// - `BACCARAT_PENETRATION` (default: 0.8)
    /// - `BACCARAT_BURN` (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            blackjack_decks: parse_env_or("BLACKJACK_DECKS", defaults.blackjack_decks),
            blackjack_penetration: parse_env_or(
                "BLACKJACK_PENETRATION",
                defaults.blackjack_penetration,
            ),
            dealer_hits_soft_17: parse_env_or("DEALER_HITS_SOFT_17", defaults.dealer_hits_soft_17),
            baccarat_decks: parse_env_or("BACCARAT_DECKS", defaults.baccarat_decks),
            baccarat_penetration: parse_env_or(
                "BACCARAT_PENETRATION",
                defaults.baccarat_penetration,
            ),
            baccarat_burn: parse_env_or("BACCARAT_BURN", defaults.baccarat_burn),
        }
    }

    /// Check the settings leave enough cards behind the cut for a full round.
    pub fn validate(&self) -> Result<(), String> {
        if self.blackjack_decks == 0 || self.baccarat_decks == 0 {
            return Err("shoes need at least one deck".to_string());
        }
        for (name, penetration) in [
            ("BLACKJACK_PENETRATION", self.blackjack_penetration),
            ("BACCARAT_PENETRATION", self.baccarat_penetration),
        ] {
            if !(0.1..=0.9).contains(&penetration) {
                return Err(format!("{name} must be between 0.1 and 0.9"));
            }
        }
        for (name, decks, penetration, reserve) in [
            (
                "BLACKJACK_PENETRATION",
                self.blackjack_decks,
                self.blackjack_penetration,
                ROUND_RESERVE,
            ),
            (
                "BACCARAT_PENETRATION",
                self.baccarat_decks,
                self.baccarat_penetration,
                COUP_CARDS,
            ),
        ] {
            let behind_cut = Shoe::new(decks, penetration).behind_cut();
            if behind_cut < reserve {
                return Err(format!(
                    "{name} leaves {behind_cut} cards behind the cut, a round needs {reserve}"
                ));
            }
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            blackjack_decks: 6,
            blackjack_penetration: 0.75,
            dealer_hits_soft_17: false,
            baccarat_decks: 8,
            baccarat_penetration: 0.8,
            baccarat_burn: true,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_full_penetration() {
        let config = GameConfig {
            blackjack_penetration: 1.0,
            ..GameConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("BLACKJACK_PENETRATION"));
    }

    #[test]
    fn test_rejects_cut_too_deep_for_a_round() {
        let config = GameConfig {
            blackjack_decks: 1,
            blackjack_penetration: 0.9,
            ..GameConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("behind the cut"), "unexpected error: {err}");

        let config = GameConfig {
            blackjack_decks: 1,
            blackjack_penetration: 0.6,
            ..GameConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_shoe() {
        let config = GameConfig {
            baccarat_decks: 0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
