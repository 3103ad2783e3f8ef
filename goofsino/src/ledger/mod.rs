//! Ledger module: player balances, open wagers and their settlement against
//! the house.
//!
//! Every access goes through the single [`LedgerGuard`] of a [`Ledger`]:
//! - [`Ledger::read`] hands out a [`LedgerReader`] holding shared access
//! - [`Ledger::write`] hands out a [`LedgerWriter`] holding exclusive access
//!   and one open transaction
//!
//! A writer that is dropped before [`LedgerWriter::commit`] rolls back, so a
//! caller that gives up halfway never leaves a partial settlement behind.
//!
//! ## Example
//!
//! ```no_run
//! use goofsino::catalog::{BetType, Resolution};
//! use goofsino::db::{Database, DatabaseConfig};
//! use goofsino::ledger::{AccountId, Ledger, LedgerConfig, LedgerRead};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::in_memory()).await?;
//!     db.migrate().await?;
//!     let ledger = Ledger::new(Arc::new(db.pool().clone()), LedgerConfig::default());
//!
//!     let alice = AccountId::new("alice")?;
//!     let mut writer = ledger.write().await?;
//!     writer.ensure_account(&alice, "Alice").await?;
//!     writer.place_bet(&alice, BetType::Red, 200).await?;
//!     writer.settle_all_bets_of_type(BetType::Red, Resolution::Lost).await?;
//!     writer.commit().await?;
//!
//!     let balance = ledger.read().await?.get_balance(&alice).await?;
//!     println!("Alice has {balance} points");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod guard;
pub mod models;
pub mod store;

pub use config::LedgerConfig;
pub use errors::{LedgerError, LedgerResult};
pub use guard::LedgerGuard;
pub use models::{
    Account, AccountId, BankruptcyRecord, EntryKind, HOUSE_ACCOUNT_ID, LedgerAudit, LedgerEntry,
    OpenBet, RoundId, Settlement,
};
pub use store::{Ledger, LedgerRead, LedgerReader, LedgerWriter};
