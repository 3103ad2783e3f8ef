//! Ledger store: guarded reads and transactional writes over the account,
//! wager, bankruptcy and journal tables.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    Row, Sqlite, SqliteConnection, SqlitePool, Transaction, pool::PoolConnection,
    sqlite::SqliteRow,
};
use std::sync::Arc;
use tokio::sync::{RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{
    config::LedgerConfig,
    errors::{LedgerError, LedgerResult},
    guard::LedgerGuard,
    models::{
        Account, AccountId, BankruptcyRecord, EntryKind, LedgerAudit, LedgerEntry, OpenBet,
        RoundId, Settlement,
    },
};
use crate::catalog::{BetType, Resolution};

/// Handle to the ledger. Clones share the pool and the guard.
#[derive(Clone, Debug)]
pub struct Ledger {
    pool: Arc<SqlitePool>,
    guard: Arc<LedgerGuard>,
    config: Arc<LedgerConfig>,
}

impl Ledger {
    pub fn new(pool: Arc<SqlitePool>, config: LedgerConfig) -> Self {
        Self {
            pool,
            guard: Arc::new(LedgerGuard::new(config.lock_timeout)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Takes shared access and a pooled connection.
    pub async fn read(&self) -> LedgerResult<LedgerReader<'_>> {
        let guard = self.guard.shared().await?;
        let conn = self.pool.acquire().await.map_err(|e| {
            log::error!("Failed to acquire a ledger connection: {e}");
            LedgerError::Busy(self.guard.timeout())
        })?;
        Ok(LedgerReader {
            conn,
            _guard: guard,
        })
    }

    /// Takes exclusive access and opens a transaction under a fresh round id.
    pub async fn write(&self) -> LedgerResult<LedgerWriter<'_>> {
        self.write_round(Uuid::new_v4()).await
    }

    /// Takes exclusive access and opens a transaction whose journal rows are
    /// tagged with `round_id`.
    pub async fn write_round(&self, round_id: RoundId) -> LedgerResult<LedgerWriter<'_>> {
        let guard = self.guard.exclusive().await?;
        let tx = self.pool.begin().await.map_err(|e| {
            log::error!("[round {round_id}] Failed to open a ledger transaction: {e}");
            LedgerError::Busy(self.guard.timeout())
        })?;
        Ok(LedgerWriter {
            tx,
            _guard: guard,
            config: &self.config,
            round_id,
        })
    }
}

/// Queries shared by readers and writers.
#[async_trait]
pub trait LedgerRead: Send {
    fn connection(&mut self) -> &mut SqliteConnection;

    /// Balance of `account`, 0 when the account does not exist.
    async fn get_balance(&mut self, account: &AccountId) -> LedgerResult<i64> {
        let row = sqlx::query("SELECT balance FROM accounts WHERE account_id = ?")
            .bind(account.as_str())
            .fetch_optional(self.connection())
            .await?;
        Ok(row.map_or(0, |row| row.get("balance")))
    }

    async fn get_account(&mut self, account: &AccountId) -> LedgerResult<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT account_id, display_name, balance, issued, last_update
            FROM accounts
            WHERE account_id = ?
            "#,
        )
        .bind(account.as_str())
        .fetch_optional(self.connection())
        .await?;
        Ok(row.as_ref().map(account_from_row))
    }

    async fn get_open_bet_amount(
        &mut self,
        account: &AccountId,
        bet_type: BetType,
    ) -> LedgerResult<i64> {
        let row = sqlx::query("SELECT amount FROM open_bets WHERE account_id = ? AND bet_type = ?")
            .bind(account.as_str())
            .bind(bet_type.id())
            .fetch_optional(self.connection())
            .await?;
        Ok(row.map_or(0, |row| row.get("amount")))
    }

    async fn get_total_open_bets(&mut self, account: &AccountId) -> LedgerResult<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0) AS total FROM open_bets WHERE account_id = ?",
        )
        .bind(account.as_str())
        .fetch_one(self.connection())
        .await?;
        Ok(row.get("total"))
    }

    async fn open_bets(&mut self, account: &AccountId) -> LedgerResult<Vec<OpenBet>> {
        let rows = sqlx::query(
            "SELECT account_id, bet_type, amount FROM open_bets WHERE account_id = ? ORDER BY bet_type",
        )
        .bind(account.as_str())
        .fetch_all(self.connection())
        .await?;
        rows.iter().map(open_bet_from_row).collect()
    }

    /// Richest players, most recently updated first on ties.
    async fn top_balances(&mut self, limit: i64) -> LedgerResult<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT account_id, display_name, balance, issued, last_update
            FROM accounts
            WHERE account_id != ?
            ORDER BY balance DESC, last_update DESC
            LIMIT ?
            "#,
        )
        .bind(AccountId::house().as_str())
        .bind(limit)
        .fetch_all(self.connection())
        .await?;
        Ok(rows.iter().map(account_from_row).collect())
    }

    /// Most frequently bankrupt players, most recent first on ties.
    async fn most_bankruptcies(&mut self, limit: i64) -> LedgerResult<Vec<BankruptcyRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT b.account_id, a.display_name, b.count, b.last_update
            FROM bankruptcies b
            JOIN accounts a ON a.account_id = b.account_id
            ORDER BY b.count DESC, b.last_update DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.connection())
        .await?;
        Ok(rows
            .iter()
            .map(|row| BankruptcyRecord {
                account_id: AccountId::stored(row.get("account_id")),
                display_name: row.get("display_name"),
                count: row.get("count"),
                last_update: row.get::<DateTime<Utc>, _>("last_update"),
            })
            .collect())
    }

    async fn bankruptcy_count(&mut self, account: &AccountId) -> LedgerResult<i64> {
        let row = sqlx::query("SELECT count FROM bankruptcies WHERE account_id = ?")
            .bind(account.as_str())
            .fetch_optional(self.connection())
            .await?;
        Ok(row.map_or(0, |row| row.get("count")))
    }

    /// Latest journal rows of `account`, newest first.
    async fn recent_entries(
        &mut self,
        account: &AccountId,
        limit: i64,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, round_id, account_id, bet_type, kind, amount, balance_after, created_at
            FROM ledger_entries
            WHERE account_id = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(account.as_str())
        .bind(limit)
        .fetch_all(self.connection())
        .await?;
        rows.iter().map(entry_from_row).collect()
    }

    /// Every journal row written under `round_id`, oldest first.
    async fn round_entries(&mut self, round_id: RoundId) -> LedgerResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, round_id, account_id, bet_type, kind, amount, balance_after, created_at
            FROM ledger_entries
            WHERE round_id = ?
            ORDER BY id
            "#,
        )
        .bind(round_id.to_string())
        .fetch_all(self.connection())
        .await?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn audit(&mut self) -> LedgerResult<LedgerAudit> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN account_id != ?1 THEN balance END), 0) AS players,
                COALESCE(SUM(CASE WHEN account_id = ?1 THEN balance END), 0) AS house,
                COALESCE(SUM(issued), 0) AS issued,
                (SELECT COALESCE(SUM(amount), 0) FROM open_bets) AS open_total
            FROM accounts
            "#,
        )
        .bind(AccountId::house().as_str())
        .fetch_one(self.connection())
        .await?;
        Ok(LedgerAudit {
            players: row.get("players"),
            house: row.get("house"),
            issued: row.get("issued"),
            open: row.get("open_total"),
        })
    }
}

/// Shared access to the ledger.
pub struct LedgerReader<'a> {
    conn: PoolConnection<Sqlite>,
    _guard: RwLockReadGuard<'a, ()>,
}

impl LedgerRead for LedgerReader<'_> {
    fn connection(&mut self) -> &mut SqliteConnection {
        &mut *self.conn
    }
}

/// Exclusive access to the ledger inside one transaction.
///
/// Dropping the writer without calling [`commit`](Self::commit) rolls the
/// transaction back before the lock is released.
pub struct LedgerWriter<'a> {
    // Field order matters: the transaction must be dropped before the guard.
    tx: Transaction<'static, Sqlite>,
    _guard: RwLockWriteGuard<'a, ()>,
    config: &'a LedgerConfig,
    round_id: RoundId,
}

impl LedgerRead for LedgerWriter<'_> {
    fn connection(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }
}

impl LedgerWriter<'_> {
    pub fn round_id(&self) -> RoundId {
        self.round_id
    }

    /// Create the account with the starting balance if it does not exist.
    /// An existing account only gets its display name refreshed.
    pub async fn ensure_account(
        &mut self,
        account: &AccountId,
        display_name: &str,
    ) -> LedgerResult<Account> {
        check_player(account)?;
        let row = sqlx::query(
            r#"
            INSERT INTO accounts (account_id, display_name, balance, issued, last_update)
            VALUES (?1, ?2, ?3, ?3, ?4)
            ON CONFLICT (account_id) DO UPDATE SET display_name = excluded.display_name
            RETURNING account_id, display_name, balance, issued, last_update
            "#,
        )
        .bind(account.as_str())
        .bind(display_name)
        .bind(self.config.starting_balance)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(account_from_row(&row))
    }

    /// Add `amount` to the account's wager on `bet_type`.
    ///
    /// # Returns
    ///
    /// * `LedgerResult<i64>` - The new total wagered on `bet_type`
    ///
    /// # Errors
    ///
    /// * `LedgerError::BelowMinimum` - Amount under the minimum bet
    /// * `LedgerError::InsufficientFunds` - Open wagers would exceed the balance
    pub async fn place_bet(
        &mut self,
        account: &AccountId,
        bet_type: BetType,
        amount: i64,
    ) -> LedgerResult<i64> {
        if amount < self.config.min_bet {
            return Err(LedgerError::BelowMinimum {
                minimum: self.config.min_bet,
                requested: amount,
            });
        }
        check_player(account)?;

        let balance = self.get_balance(account).await?;
        let open = self.get_total_open_bets(account).await?;
        let insufficient = LedgerError::InsufficientFunds {
            balance,
            open,
            requested: amount,
        };
        match open.checked_add(amount) {
            Some(committed) if committed <= balance => {}
            _ => return Err(insufficient),
        }

        let row = sqlx::query(
            r#"
            INSERT INTO open_bets (account_id, bet_type, amount)
            VALUES (?, ?, ?)
            ON CONFLICT (account_id, bet_type) DO UPDATE SET amount = open_bets.amount + excluded.amount
            RETURNING amount
            "#,
        )
        .bind(account.as_str())
        .bind(bet_type.id())
        .bind(amount)
        .fetch_one(&mut *self.tx)
        .await?;

        let total: i64 = row.get("amount");
        log::debug!("{account} has {total} on {} ({amount} added)", bet_type.id());
        Ok(total)
    }

    /// Settle the account's wager on `bet_type`, moving money between the
    /// account and the house.
    ///
    /// Returns `None` when there is no such wager.
    pub async fn settle_bet(
        &mut self,
        account: &AccountId,
        bet_type: BetType,
        resolution: Resolution,
    ) -> LedgerResult<Option<Settlement>> {
        let Some(row) = sqlx::query(
            "DELETE FROM open_bets WHERE account_id = ? AND bet_type = ? RETURNING amount",
        )
        .bind(account.as_str())
        .bind(bet_type.id())
        .fetch_optional(&mut *self.tx)
        .await?
        else {
            return Ok(None);
        };
        let amount: i64 = row.get("amount");

        let delta = match resolution {
            Resolution::Won => bet_type.payout().apply(amount).ok_or_else(|| {
                self.invariant(format!("payout overflow on {amount} for {}", bet_type.id()))
            })?,
            Resolution::Lost => -amount,
            Resolution::Push => 0,
        };

        let Some(player) = self.get_account(account).await? else {
            return Err(self.invariant(format!("open wager without an account for {account}")));
        };
        let balance = player.balance.checked_add(delta).ok_or_else(|| {
            self.invariant(format!("balance overflow for {account}"))
        })?;
        let house = self.get_balance(&AccountId::house()).await?;
        let house_balance = house.checked_sub(delta).ok_or_else(|| {
            self.invariant("house balance overflow".to_string())
        })?;

        let now = Utc::now();
        self.set_balance(account, balance, now).await?;
        self.set_balance(&AccountId::house(), house_balance, now)
            .await?;

        let kind = EntryKind::from(resolution);
        self.create_entry(account, Some(bet_type), kind, delta, balance, now)
            .await?;
        self.create_entry(
            &AccountId::house(),
            Some(bet_type),
            kind,
            -delta,
            house_balance,
            now,
        )
        .await?;

        Ok(Some(Settlement {
            account_id: account.clone(),
            display_name: player.display_name,
            bet_type,
            amount,
            resolution,
            delta,
            balance,
        }))
    }

    /// Settle every open wager on `bet_type`, in account id order.
    ///
    /// Settling a type with no wagers is a no-op, so repeating a settlement
    /// never pays twice.
    pub async fn settle_all_bets_of_type(
        &mut self,
        bet_type: BetType,
        resolution: Resolution,
    ) -> LedgerResult<Vec<Settlement>> {
        let accounts: Vec<String> = sqlx::query_scalar(
            "SELECT account_id FROM open_bets WHERE bet_type = ? ORDER BY account_id",
        )
        .bind(bet_type.id())
        .fetch_all(&mut *self.tx)
        .await?;

        let mut settlements = Vec::with_capacity(accounts.len());
        for account in accounts {
            let account = AccountId::stored(account);
            if let Some(settlement) = self.settle_bet(&account, bet_type, resolution).await? {
                settlements.push(settlement);
            }
        }

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM open_bets WHERE bet_type = ?")
                .bind(bet_type.id())
                .fetch_one(&mut *self.tx)
                .await?;
        if remaining != 0 {
            return Err(self.invariant(format!(
                "{remaining} wagers on {} survived settlement",
                bet_type.id()
            )));
        }
        Ok(settlements)
    }

    /// Reset a broke account to the starting balance.
    ///
    /// Returns false when the account still has money or wagers on the
    /// table, or does not exist.
    pub async fn try_declare_bankruptcy(&mut self, account: &AccountId) -> LedgerResult<bool> {
        check_player(account)?;
        let Some(player) = self.get_account(account).await? else {
            return Ok(false);
        };
        let open = self.get_total_open_bets(account).await?;
        if player.balance.saturating_add(open) > 0 {
            return Ok(false);
        }

        let starting = self.config.starting_balance;
        let top_up = starting - player.balance;
        let now = Utc::now();
        sqlx::query(
            "UPDATE accounts SET balance = ?, issued = issued + ?, last_update = ? WHERE account_id = ?",
        )
        .bind(starting)
        .bind(top_up)
        .bind(now)
        .bind(account.as_str())
        .execute(&mut *self.tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO bankruptcies (account_id, count, last_update)
            VALUES (?, 1, ?)
            ON CONFLICT (account_id) DO UPDATE SET
                count = bankruptcies.count + 1,
                last_update = excluded.last_update
            "#,
        )
        .bind(account.as_str())
        .bind(now)
        .execute(&mut *self.tx)
        .await?;

        self.create_entry(account, None, EntryKind::Bankruptcy, top_up, starting, now)
            .await?;

        log::info!(
            "[round {}] {} declared bankruptcy, balance reset to {starting}",
            self.round_id,
            account
        );
        Ok(true)
    }

    /// Commit every change made through this writer and release the lock.
    pub async fn commit(self) -> LedgerResult<()> {
        let Self { tx, _guard: guard, .. } = self;
        tx.commit().await?;
        drop(guard);
        Ok(())
    }

    /// Discard every change made through this writer and release the lock.
    pub async fn rollback(self) -> LedgerResult<()> {
        let Self { tx, _guard: guard, .. } = self;
        tx.rollback().await?;
        drop(guard);
        Ok(())
    }

    async fn set_balance(
        &mut self,
        account: &AccountId,
        balance: i64,
        now: DateTime<Utc>,
    ) -> LedgerResult<()> {
        sqlx::query("UPDATE accounts SET balance = ?, last_update = ? WHERE account_id = ?")
            .bind(balance)
            .bind(now)
            .bind(account.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    /// Append a journal row
    async fn create_entry(
        &mut self,
        account: &AccountId,
        bet_type: Option<BetType>,
        kind: EntryKind,
        amount: i64,
        balance_after: i64,
        now: DateTime<Utc>,
    ) -> LedgerResult<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO ledger_entries (round_id, account_id, bet_type, kind, amount, balance_after, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(self.round_id.to_string())
        .bind(account.as_str())
        .bind(bet_type.map(|bet| bet.id()))
        .bind(kind.to_string())
        .bind(amount)
        .bind(balance_after)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.get("id"))
    }

    fn invariant(&self, message: String) -> LedgerError {
        log::error!("[round {}] Ledger invariant violated: {message}", self.round_id);
        LedgerError::InvariantViolation(message)
    }
}

fn check_player(account: &AccountId) -> LedgerResult<()> {
    if account.is_house() {
        return Err(LedgerError::ReservedAccount(account.to_string()));
    }
    Ok(())
}

fn parse_bet_type(id: &str) -> LedgerResult<BetType> {
    id.parse()
        .map_err(|e| LedgerError::InvariantViolation(format!("stored {e}")))
}

fn account_from_row(row: &SqliteRow) -> Account {
    Account {
        account_id: AccountId::stored(row.get("account_id")),
        display_name: row.get("display_name"),
        balance: row.get("balance"),
        issued: row.get("issued"),
        last_update: row.get::<DateTime<Utc>, _>("last_update"),
    }
}

fn open_bet_from_row(row: &SqliteRow) -> LedgerResult<OpenBet> {
    Ok(OpenBet {
        account_id: AccountId::stored(row.get("account_id")),
        bet_type: parse_bet_type(row.get("bet_type"))?,
        amount: row.get("amount"),
    })
}

fn entry_from_row(row: &SqliteRow) -> LedgerResult<LedgerEntry> {
    let round_id: String = row.get("round_id");
    let kind: String = row.get("kind");
    let bet_type: Option<String> = row.get("bet_type");
    Ok(LedgerEntry {
        id: row.get("id"),
        round_id: Uuid::parse_str(&round_id)
            .map_err(|e| LedgerError::InvariantViolation(format!("stored round id: {e}")))?,
        account_id: AccountId::stored(row.get("account_id")),
        bet_type: bet_type.as_deref().map(parse_bet_type).transpose()?,
        kind: kind.parse().map_err(LedgerError::InvariantViolation)?,
        amount: row.get("amount"),
        balance_after: row.get("balance_after"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}
