//! # Goofsino
//!
//! The wagering ledger and settlement engine of a chat casino offering
//! roulette, blackjack and baccarat for play money.
//!
//! Many chat participants bet concurrently against one house. Every balance
//! change happens inside one SQL transaction under one exclusive ledger
//! lock, and every payout to a player is taken from the house, so money is
//! only ever created by issuing starting balances and bankruptcy top-ups.
//!
//! ## Architecture
//!
//! A command flows through the crate like this:
//!
//! - **CommandRegistry**: maps `!command args` to a handler
//! - **BetResolver**: takes the ledger lock, drives a table, settles the outcome
//! - **Ledger**: guarded reads and transactional writes over SQLite
//! - **Tables**: roulette wheel, blackjack and baccarat shoes (in memory)
//!
//! ## Core Modules
//!
//! - [`games`]: Cards, shoes and the three table engines
//! - [`catalog`]: Every bet type with its payout
//! - [`ledger`]: Accounts, open wagers, settlement and the concurrency guard
//! - [`resolver`]: Outcome to settlement mapping and round orchestration
//! - [`commands`]: Chat command dispatch
//! - [`db`]: Connection pool and schema
//!
//! ## Example
//!
//! ```no_run
//! use goofsino::{CommandRegistry, Database, DatabaseConfig, GameConfig, Ledger, LedgerConfig};
//! use goofsino::resolver::BetResolver;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::in_memory()).await?;
//!     db.migrate().await?;
//!
//!     let ledger = Ledger::new(Arc::new(db.pool().clone()), LedgerConfig::default());
//!     let resolver = Arc::new(BetResolver::new(ledger, &GameConfig::default()));
//!     let commands = CommandRegistry::casino_defaults(resolver);
//!
//!     if let Some(reply) = commands.dispatch("red", "200", "alice", "Alice").await {
//!         println!("{reply}");
//!     }
//!     if let Some(reply) = commands.dispatch("spin", "", "operator", "Operator").await {
//!         println!("{reply}");
//!     }
//!     Ok(())
//! }
//! ```

/// Bet catalog.
pub mod catalog;
pub use catalog::{BetType, PayoutRatio, Resolution};

/// Chat command dispatch.
pub mod commands;
pub use commands::{Caller, CommandHandler, CommandRegistry};

/// Database pool and schema.
pub mod db;
pub use db::{Database, DatabaseConfig};

/// Table engines.
pub mod games;
pub use games::{GameConfig, GameError, GameKind};

/// Balances, wagers and settlement.
pub mod ledger;
pub use ledger::{AccountId, Ledger, LedgerConfig, LedgerError, LedgerRead};

/// Round orchestration.
pub mod resolver;
pub use resolver::{BetResolver, CasinoError, Outcome};
