//! Ledger schema. Every statement is idempotent so `migrate` can run on each
//! start.

use crate::ledger::HOUSE_ACCOUNT_ID;

pub(super) const TABLES: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS accounts (
        account_id   TEXT PRIMARY KEY NOT NULL,
        display_name TEXT NOT NULL,
        balance      INTEGER NOT NULL,
        issued       INTEGER NOT NULL DEFAULT 0,
        last_update  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS open_bets (
        account_id TEXT NOT NULL REFERENCES accounts (account_id),
        bet_type   TEXT NOT NULL,
        amount     INTEGER NOT NULL CHECK (amount > 0),
        PRIMARY KEY (account_id, bet_type)
    )",
    "CREATE TABLE IF NOT EXISTS bankruptcies (
        account_id  TEXT PRIMARY KEY NOT NULL REFERENCES accounts (account_id),
        count       INTEGER NOT NULL DEFAULT 0,
        last_update TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS ledger_entries (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        round_id      TEXT NOT NULL,
        account_id    TEXT NOT NULL REFERENCES accounts (account_id),
        bet_type      TEXT,
        kind          TEXT NOT NULL,
        amount        INTEGER NOT NULL,
        balance_after INTEGER NOT NULL,
        created_at    TEXT NOT NULL
    )",
];

pub(super) const INDICES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS idx_accounts_leaderboard
        ON accounts (balance DESC, last_update DESC)",
    "CREATE INDEX IF NOT EXISTS idx_bankruptcies_leaderboard
        ON bankruptcies (count DESC, last_update DESC)",
    "CREATE INDEX IF NOT EXISTS idx_open_bets_type ON open_bets (bet_type)",
    "CREATE INDEX IF NOT EXISTS idx_ledger_entries_account
        ON ledger_entries (account_id, id DESC)",
];

/// Inserts the house account with a zero balance if it does not exist yet.
pub(super) fn seed_house() -> String {
    format!(
        "INSERT OR IGNORE INTO accounts (account_id, display_name, balance, issued, last_update)
         VALUES ('{HOUSE_ACCOUNT_ID}', 'The House', 0, 0, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))"
    )
}
