//! Bet resolver: the only path that changes the ledger.
//!
//! Every mutating operation takes the ledger's exclusive guard first and the
//! table mutex second, never the other way around. A round's outcome is
//! settled inside the same transaction that produced it; if the commit fails
//! the outcome stays pending on its table and [`BetResolver::settle_pending`]
//! retries it.

pub mod errors;
pub mod outcome;

pub use errors::{CasinoError, CasinoResult};
pub use outcome::{Outcome, Resolve};

use std::fmt;
use tokio::sync::Mutex;

use crate::{
    catalog::BetType,
    games::{
        BaccaratTable, BlackjackOutcome, BlackjackTable, GameConfig, GameKind, Phase, Pocket,
        RouletteTable,
    },
    ledger::{
        Account, AccountId, BankruptcyRecord, Ledger, LedgerAudit, LedgerEntry, LedgerRead,
        LedgerWriter, RoundId, Settlement,
    },
};

/// The three tables of the casino floor.
#[derive(Debug)]
pub struct Tables {
    pub roulette: RouletteTable,
    pub blackjack: BlackjackTable,
    pub baccarat: BaccaratTable,
}

impl Tables {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            roulette: RouletteTable::new(),
            blackjack: BlackjackTable::new(config, &mut rand::rng()),
            baccarat: BaccaratTable::new(config),
        }
    }

    pub fn phase(&self, game: GameKind) -> Phase {
        match game {
            GameKind::Roulette => self.roulette.phase(),
            GameKind::Blackjack => self.blackjack.phase(),
            GameKind::Baccarat => self.baccarat.phase(),
        }
    }

    /// The outcome of `game` still waiting on settlement.
    pub fn pending(&self, game: GameKind) -> Option<Outcome> {
        match game {
            GameKind::Roulette => self.roulette.pending().map(Outcome::from),
            GameKind::Blackjack => self.blackjack.pending().cloned().map(Outcome::from),
            GameKind::Baccarat => self.baccarat.pending().cloned().map(Outcome::from),
        }
    }

    fn mark_settled(&mut self, game: GameKind) {
        match game {
            GameKind::Roulette => self.roulette.mark_settled(),
            GameKind::Blackjack => self.blackjack.mark_settled(),
            GameKind::Baccarat => self.baccarat.mark_settled(),
        }
    }

    pub fn status(&self, game: GameKind) -> String {
        match game {
            GameKind::Roulette => self.roulette.status(),
            GameKind::Blackjack => self.blackjack.status(),
            GameKind::Baccarat => self.baccarat.status(),
        }
    }
}

/// A settled round.
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub round_id: RoundId,
    pub outcome: Outcome,
    pub settlements: Vec<Settlement>,
}

impl RoundReport {
    /// Sum of every player delta, i.e. what the house lost on the round.
    pub fn house_loss(&self) -> i64 {
        self.settlements.iter().map(|s| s.delta).sum()
    }
}

impl fmt::Display for RoundReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.outcome.summary())?;
        if self.settlements.is_empty() {
            return write!(f, "\nNo bets were riding on it.");
        }
        for settlement in &self.settlements {
            write!(f, "\n{settlement}")?;
        }
        Ok(())
    }
}

/// Result of a blackjack action.
#[derive(Debug, Clone)]
pub enum Play {
    /// The round goes on; carries the table status
    InProgress(String),
    Settled(RoundReport),
}

impl fmt::Display for Play {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Play::InProgress(status) => write!(f, "{status}"),
            Play::Settled(report) => write!(f, "{report}"),
        }
    }
}

/// An accepted wager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetReceipt {
    pub display_name: String,
    pub bet_type: BetType,
    pub amount: i64,
    /// Total now riding on the bet type
    pub total: i64,
}

impl fmt::Display for BetReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == self.amount {
            write!(
                f,
                "{} bet {} points on {}",
                self.display_name, self.amount, self.bet_type
            )
        } else {
            write!(
                f,
                "{} increased their bet on {} to {} points",
                self.display_name, self.bet_type, self.total
            )
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceReport {
    pub balance: i64,
    /// Part of the balance riding on open wagers
    pub open: i64,
    pub bankruptcies: i64,
}

/// Runs rounds and settles wagers against them.
#[derive(Debug)]
pub struct BetResolver {
    ledger: Ledger,
    tables: Mutex<Tables>,
}

impl BetResolver {
    pub fn new(ledger: Ledger, config: &GameConfig) -> Self {
        Self::with_tables(ledger, Tables::new(config))
    }

    pub fn with_tables(ledger: Ledger, tables: Tables) -> Self {
        Self {
            ledger,
            tables: Mutex::new(tables),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Place or add to a wager.
    ///
    /// # Errors
    ///
    /// * `CasinoError::InvalidAmount` - `amount` isn't a whole number
    /// * `CasinoError::BetsClosed` - the bet's table has a round in play
    /// * `LedgerError::BelowMinimum` - under the minimum bet, zero and negative amounts included
    /// * `LedgerError::InsufficientFunds` - rejected by the ledger
    pub async fn place_bet(
        &self,
        caller: &AccountId,
        display_name: &str,
        bet_type: BetType,
        amount: &str,
    ) -> CasinoResult<BetReceipt> {
        let amount = parse_amount(amount)?;

        let mut writer = self.ledger.write().await?;
        let game = bet_type.game();
        if self.tables.lock().await.phase(game) != Phase::Idle {
            return Err(CasinoError::BetsClosed(game));
        }

        let account = writer.ensure_account(caller, display_name).await?;
        let total = writer.place_bet(caller, bet_type, amount).await?;
        writer.commit().await?;

        Ok(BetReceipt {
            display_name: account.display_name,
            bet_type,
            amount,
            total,
        })
    }

    /// Spin the wheel and settle every roulette wager.
    pub async fn spin(&self) -> CasinoResult<RoundReport> {
        let writer = self.ledger.write().await?;
        let mut tables = self.tables.lock().await;
        let outcome = tables.roulette.spin(&mut rand::rng())?;
        self.settle(writer, &mut tables, outcome.into()).await
    }

    /// Land the ball in a chosen pocket and settle every roulette wager.
    pub async fn land_roulette(&self, pocket: Pocket) -> CasinoResult<RoundReport> {
        let writer = self.ledger.write().await?;
        let mut tables = self.tables.lock().await;
        let outcome = tables.roulette.land(pocket)?;
        self.settle(writer, &mut tables, outcome.into()).await
    }

    /// Deal a blackjack round. Naturals settle straight away.
    pub async fn deal_blackjack(&self) -> CasinoResult<Play> {
        let writer = self.ledger.write().await?;
        let mut tables = self.tables.lock().await;
        let resolved = tables.blackjack.deal(&mut rand::rng())?;
        self.advance_blackjack(writer, &mut tables, resolved).await
    }

    pub async fn hit(&self) -> CasinoResult<Play> {
        let writer = self.ledger.write().await?;
        let mut tables = self.tables.lock().await;
        let resolved = tables.blackjack.hit()?;
        self.advance_blackjack(writer, &mut tables, resolved).await
    }

    pub async fn stand(&self) -> CasinoResult<Play> {
        let writer = self.ledger.write().await?;
        let mut tables = self.tables.lock().await;
        let resolved = tables.blackjack.stand()?;
        self.advance_blackjack(writer, &mut tables, resolved).await
    }

    pub async fn split(&self) -> CasinoResult<Play> {
        let writer = self.ledger.write().await?;
        let mut tables = self.tables.lock().await;
        let resolved = tables.blackjack.split()?;
        self.advance_blackjack(writer, &mut tables, resolved).await
    }

    /// Deal a full baccarat coup and settle it.
    pub async fn deal_baccarat(&self) -> CasinoResult<RoundReport> {
        let writer = self.ledger.write().await?;
        let mut tables = self.tables.lock().await;
        let outcome = tables.baccarat.deal(&mut rand::rng())?;
        self.settle(writer, &mut tables, outcome.into()).await
    }

    /// Retry settlement of every outcome left pending by a failed commit.
    pub async fn settle_pending(&self) -> CasinoResult<Vec<RoundReport>> {
        let mut reports = Vec::new();
        for game in GameKind::ALL {
            let writer = self.ledger.write().await?;
            let mut tables = self.tables.lock().await;
            if let Some(outcome) = tables.pending(game) {
                log::info!("Retrying settlement of a pending {game} round");
                reports.push(self.settle(writer, &mut tables, outcome).await?);
            }
        }
        Ok(reports)
    }

    /// Reset a broke player to the starting balance. Returns the player's
    /// bankruptcy count when the reset happened.
    pub async fn declare_bankruptcy(
        &self,
        caller: &AccountId,
        display_name: &str,
    ) -> CasinoResult<Option<i64>> {
        let mut writer = self.ledger.write().await?;
        writer.ensure_account(caller, display_name).await?;
        let count = if writer.try_declare_bankruptcy(caller).await? {
            Some(writer.bankruptcy_count(caller).await?)
        } else {
            None
        };
        writer.commit().await?;
        Ok(count)
    }

    pub async fn balance(&self, caller: &AccountId) -> CasinoResult<BalanceReport> {
        let mut reader = self.ledger.read().await?;
        Ok(BalanceReport {
            balance: reader.get_balance(caller).await?,
            open: reader.get_total_open_bets(caller).await?,
            bankruptcies: reader.bankruptcy_count(caller).await?,
        })
    }

    pub async fn top_balances(&self, limit: i64) -> CasinoResult<Vec<Account>> {
        Ok(self.ledger.read().await?.top_balances(limit).await?)
    }

    pub async fn most_bankruptcies(&self, limit: i64) -> CasinoResult<Vec<BankruptcyRecord>> {
        Ok(self.ledger.read().await?.most_bankruptcies(limit).await?)
    }

    pub async fn history(&self, caller: &AccountId, limit: i64) -> CasinoResult<Vec<LedgerEntry>> {
        Ok(self.ledger.read().await?.recent_entries(caller, limit).await?)
    }

    pub async fn audit(&self) -> CasinoResult<LedgerAudit> {
        Ok(self.ledger.read().await?.audit().await?)
    }

    pub async fn table_status(&self, game: GameKind) -> String {
        self.tables.lock().await.status(game)
    }

    async fn advance_blackjack(
        &self,
        writer: LedgerWriter<'_>,
        tables: &mut Tables,
        resolved: Option<BlackjackOutcome>,
    ) -> CasinoResult<Play> {
        match resolved {
            Some(outcome) => Ok(Play::Settled(
                self.settle(writer, tables, outcome.into()).await?,
            )),
            None => Ok(Play::InProgress(tables.blackjack.status())),
        }
    }

    /// Settle every bet type of the outcome's game, then commit. The table is
    /// only released once the commit went through.
    async fn settle(
        &self,
        mut writer: LedgerWriter<'_>,
        tables: &mut Tables,
        outcome: Outcome,
    ) -> CasinoResult<RoundReport> {
        let round_id = writer.round_id();
        let game = outcome.game();

        let mut settlements = Vec::new();
        for (bet_type, resolution) in outcome.resolutions() {
            let settled = writer
                .settle_all_bets_of_type(bet_type, resolution)
                .await
                .inspect_err(|e| {
                    log::error!("[round {round_id}] Settling {game} failed, round stays pending: {e}");
                })?;
            settlements.extend(settled);
        }
        writer.commit().await.inspect_err(|e| {
            log::error!("[round {round_id}] Commit of {game} round failed, round stays pending: {e}");
        })?;
        tables.mark_settled(game);

        let report = RoundReport {
            round_id,
            outcome,
            settlements,
        };
        log::info!(
            "[round {round_id}] {game}: {} | {} wagers settled, house net {:+}",
            report.outcome.summary(),
            report.settlements.len(),
            -report.house_loss()
        );
        Ok(report)
    }
}

/// Zero and negative amounts parse; the ledger turns them away as below the minimum.
fn parse_amount(text: &str) -> CasinoResult<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| CasinoError::InvalidAmount(text.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 250 ").unwrap(), 250);
        assert_eq!(parse_amount("0").unwrap(), 0);
        assert_eq!(parse_amount("-5").unwrap(), -5);
        assert!(matches!(parse_amount("1.5"), Err(CasinoError::InvalidAmount(_))));
        assert!(matches!(parse_amount("all"), Err(CasinoError::InvalidAmount(_))));
    }

    #[test]
    fn test_receipt_messages() {
        let mut receipt = BetReceipt {
            display_name: "Alice".to_string(),
            bet_type: BetType::Red,
            amount: 50,
            total: 50,
        };
        assert_eq!(receipt.to_string(), "Alice bet 50 points on Red");
        receipt.total = 150;
        assert_eq!(
            receipt.to_string(),
            "Alice increased their bet on Red to 150 points"
        );
    }
}
