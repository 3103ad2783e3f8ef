//! Ledger data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::errors::{LedgerError, LedgerResult};
use crate::catalog::{BetType, Resolution};

/// Account id reserved for the casino's counterparty account.
pub const HOUSE_ACCOUNT_ID: &str = "__house__";

/// Identifies a round of play in the journal.
pub type RoundId = Uuid;

/// Stable, non-empty account identifier supplied by the chat front-end.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> LedgerResult<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(LedgerError::InvalidAccount);
        }
        Ok(Self(id))
    }

    pub fn house() -> Self {
        Self(HOUSE_ACCOUNT_ID.to_string())
    }

    /// Wraps an id read back from storage.
    pub(crate) fn stored(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_house(&self) -> bool {
        self.0 == HOUSE_ACCOUNT_ID
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub display_name: String,
    pub balance: i64,
    /// Currency ever minted into the account: starting balance plus top-ups
    pub issued: i64,
    pub last_update: DateTime<Utc>,
}

/// An open wager waiting on a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenBet {
    pub account_id: AccountId,
    pub bet_type: BetType,
    pub amount: i64,
}

/// A settled wager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub account_id: AccountId,
    pub display_name: String,
    pub bet_type: BetType,
    /// The stake that was on the table
    pub amount: i64,
    pub resolution: Resolution,
    /// Change to the player's balance; the house moved by the negation
    pub delta: i64,
    pub balance: i64,
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolution {
            Resolution::Won => write!(
                f,
                "{} won {} points on {}! Balance: {} points",
                self.display_name, self.delta, self.bet_type, self.balance
            ),
            Resolution::Lost => write!(
                f,
                "{} lost {} points on {}. Balance: {} points",
                self.display_name, self.amount, self.bet_type, self.balance
            ),
            Resolution::Push => write!(
                f,
                "{} pushed on {}, {} points returned. Balance: {} points",
                self.display_name, self.bet_type, self.amount, self.balance
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankruptcyRecord {
    pub account_id: AccountId,
    pub display_name: String,
    pub count: i64,
    pub last_update: DateTime<Utc>,
}

/// Journal row kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Win,
    Loss,
    Push,
    Bankruptcy,
}

impl From<Resolution> for EntryKind {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Won => EntryKind::Win,
            Resolution::Lost => EntryKind::Loss,
            Resolution::Push => EntryKind::Push,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Win => write!(f, "win"),
            EntryKind::Loss => write!(f, "loss"),
            EntryKind::Push => write!(f, "push"),
            EntryKind::Bankruptcy => write!(f, "bankruptcy"),
        }
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win" => Ok(EntryKind::Win),
            "loss" => Ok(EntryKind::Loss),
            "push" => Ok(EntryKind::Push),
            "bankruptcy" => Ok(EntryKind::Bankruptcy),
            other => Err(format!("unknown entry kind {other}")),
        }
    }
}

/// Ledger journal row. Every settlement writes one row for the player and
/// one for the house, so the amounts of a round sum to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub round_id: RoundId,
    pub account_id: AccountId,
    pub bet_type: Option<BetType>,
    pub kind: EntryKind,
    /// Signed change to the account's balance
    pub amount: i64,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = self.created_at.format("%Y-%m-%d %H:%M");
        match (self.kind, self.bet_type) {
            (EntryKind::Bankruptcy, _) | (_, None) => write!(
                f,
                "{when} {} {:+} (balance {})",
                self.kind, self.amount, self.balance_after
            ),
            (kind, Some(bet)) => write!(
                f,
                "{when} {kind} on {bet} {:+} (balance {})",
                self.amount, self.balance_after
            ),
        }
    }
}

/// Conservation snapshot of the whole ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAudit {
    /// Sum of every player balance
    pub players: i64,
    pub house: i64,
    /// Sum of currency ever minted
    pub issued: i64,
    /// Sum of every open wager
    pub open: i64,
}

impl LedgerAudit {
    /// Money is neither created nor destroyed outside of issuance.
    pub fn is_conserved(&self) -> bool {
        i128::from(self.players) + i128::from(self.house) == i128::from(self.issued)
    }
}

impl fmt::Display for LedgerAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Players hold {} points, the house {} points, {} points issued, {} points on the table. {}",
            self.players,
            self.house,
            self.issued,
            self.open,
            if self.is_conserved() {
                "The books balance."
            } else {
                "THE BOOKS DO NOT BALANCE!"
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::Pocket;

    #[test]
    fn test_account_id_validation() {
        assert!(matches!(AccountId::new("  "), Err(LedgerError::InvalidAccount)));
        assert_eq!(AccountId::new(" alice ").unwrap().as_str(), "alice");
        assert!(AccountId::house().is_house());
        assert!(AccountId::new(HOUSE_ACCOUNT_ID).unwrap().is_house());
    }

    #[test]
    fn test_settlement_messages() {
        let mut settlement = Settlement {
            account_id: AccountId::new("alice").unwrap(),
            display_name: "Alice".to_string(),
            bet_type: BetType::Straight(Pocket::new(17).unwrap()),
            amount: 10,
            resolution: Resolution::Won,
            delta: 350,
            balance: 1350,
        };
        assert_eq!(
            settlement.to_string(),
            "Alice won 350 points on Straight Up 17! Balance: 1350 points"
        );

        settlement.resolution = Resolution::Lost;
        settlement.delta = -10;
        settlement.balance = 990;
        assert_eq!(
            settlement.to_string(),
            "Alice lost 10 points on Straight Up 17. Balance: 990 points"
        );
    }

    #[test]
    fn test_audit_conservation() {
        let audit = LedgerAudit {
            players: 1800,
            house: 200,
            issued: 2000,
            open: 0,
        };
        assert!(audit.is_conserved());
        assert!(!LedgerAudit { house: 0, ..audit }.is_conserved());
    }

    #[test]
    fn test_entry_kind_parse() {
        for kind in [EntryKind::Win, EntryKind::Loss, EntryKind::Push, EntryKind::Bankruptcy] {
            assert_eq!(kind.to_string().parse::<EntryKind>().unwrap(), kind);
        }
    }
}
