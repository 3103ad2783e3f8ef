//! The casino's chat commands.

use async_trait::async_trait;

use super::{Caller, CommandHandler};
use crate::{
    catalog::BetType,
    games::{GameKind, Pocket},
    resolver::{BetResolver, CasinoError, CasinoResult},
};

const LEADERBOARD_SIZE: i64 = 5;
const MAX_LISTING: i64 = 20;

/// Optional listing size argument, clamped to something chat can take.
fn listing_size(args: &[&str], default: i64) -> i64 {
    args.first()
        .and_then(|arg| arg.parse::<i64>().ok())
        .map_or(default, |n| n.clamp(1, MAX_LISTING))
}

/// `!<bet> <amount>` for every bet that needs nothing but an amount.
pub struct BetCommand(pub BetType);

#[async_trait]
impl CommandHandler for BetCommand {
    async fn handle(
        &self,
        resolver: &BetResolver,
        caller: &Caller,
        args: &[&str],
    ) -> CasinoResult<String> {
        let [amount] = args else {
            return Ok(format!("Usage: !{} <amount>", self.0.id()));
        };
        let receipt = resolver
            .place_bet(&caller.id, &caller.name, self.0, amount)
            .await?;
        Ok(receipt.to_string())
    }
}

/// `!straight <pocket> <amount>`
pub struct StraightCommand;

#[async_trait]
impl CommandHandler for StraightCommand {
    async fn handle(
        &self,
        resolver: &BetResolver,
        caller: &Caller,
        args: &[&str],
    ) -> CasinoResult<String> {
        let [pocket, amount] = args else {
            return Ok("Usage: !straight <0-36 or 00> <amount>".to_string());
        };
        let pocket: Pocket = pocket.parse().map_err(CasinoError::UnknownPocket)?;
        let receipt = resolver
            .place_bet(&caller.id, &caller.name, BetType::Straight(pocket), amount)
            .await?;
        Ok(receipt.to_string())
    }
}

pub struct BalanceCommand;

#[async_trait]
impl CommandHandler for BalanceCommand {
    async fn handle(
        &self,
        resolver: &BetResolver,
        caller: &Caller,
        _args: &[&str],
    ) -> CasinoResult<String> {
        let report = resolver.balance(&caller.id).await?;
        let mut response = format!("{} has {} points", caller.name, report.balance);
        if report.open > 0 {
            response.push_str(&format!(" ({} on the table)", report.open));
        }
        if report.bankruptcies > 0 {
            response.push_str(&format!(", bankrupt {} times", report.bankruptcies));
        }
        Ok(response)
    }
}

pub struct BankruptCommand;

#[async_trait]
impl CommandHandler for BankruptCommand {
    async fn handle(
        &self,
        resolver: &BetResolver,
        caller: &Caller,
        _args: &[&str],
    ) -> CasinoResult<String> {
        let starting = resolver.ledger().config().starting_balance;
        Ok(match resolver.declare_bankruptcy(&caller.id, &caller.name).await? {
            Some(count) => format!(
                "{} declared bankruptcy and starts over with {starting} points. Bankruptcy #{count}",
                caller.name
            ),
            None => format!("{} isn't broke yet!", caller.name),
        })
    }
}

pub struct LeaderboardCommand;

#[async_trait]
impl CommandHandler for LeaderboardCommand {
    async fn handle(
        &self,
        resolver: &BetResolver,
        _caller: &Caller,
        args: &[&str],
    ) -> CasinoResult<String> {
        let accounts = resolver
            .top_balances(listing_size(args, LEADERBOARD_SIZE))
            .await?;
        if accounts.is_empty() {
            return Ok("Nobody has played yet.".to_string());
        }
        Ok(accounts
            .iter()
            .enumerate()
            .map(|(i, account)| {
                format!("{}. {}: {} points", i + 1, account.display_name, account.balance)
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

pub struct BankruptciesCommand;

#[async_trait]
impl CommandHandler for BankruptciesCommand {
    async fn handle(
        &self,
        resolver: &BetResolver,
        _caller: &Caller,
        args: &[&str],
    ) -> CasinoResult<String> {
        let records = resolver
            .most_bankruptcies(listing_size(args, LEADERBOARD_SIZE))
            .await?;
        if records.is_empty() {
            return Ok("Nobody has gone bankrupt yet.".to_string());
        }
        Ok(records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let noun = if record.count == 1 {
                    "bankruptcy"
                } else {
                    "bankruptcies"
                };
                format!("{}. {}: {} {noun}", i + 1, record.display_name, record.count)
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

pub struct HistoryCommand;

#[async_trait]
impl CommandHandler for HistoryCommand {
    async fn handle(
        &self,
        resolver: &BetResolver,
        caller: &Caller,
        args: &[&str],
    ) -> CasinoResult<String> {
        let entries = resolver
            .history(&caller.id, listing_size(args, LEADERBOARD_SIZE))
            .await?;
        if entries.is_empty() {
            return Ok(format!("{} has no history yet.", caller.name));
        }
        Ok(entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// `!status [game]`
pub struct StatusCommand;

#[async_trait]
impl CommandHandler for StatusCommand {
    async fn handle(
        &self,
        resolver: &BetResolver,
        _caller: &Caller,
        args: &[&str],
    ) -> CasinoResult<String> {
        let games = match args.first() {
            Some(game) => match game.parse::<GameKind>() {
                Ok(game) => vec![game],
                Err(message) => return Ok(message),
            },
            None => GameKind::ALL.to_vec(),
        };
        let mut lines = Vec::with_capacity(games.len());
        for game in games {
            lines.push(resolver.table_status(game).await);
        }
        Ok(lines.join("\n"))
    }
}

pub struct SpinCommand;

#[async_trait]
impl CommandHandler for SpinCommand {
    fn requires_operator(&self) -> bool {
        true
    }

    async fn handle(
        &self,
        resolver: &BetResolver,
        _caller: &Caller,
        _args: &[&str],
    ) -> CasinoResult<String> {
        Ok(resolver.spin().await?.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlackjackAction {
    Deal,
    Hit,
    Stand,
    Split,
}

pub struct BlackjackCommand(pub BlackjackAction);

#[async_trait]
impl CommandHandler for BlackjackCommand {
    fn requires_operator(&self) -> bool {
        true
    }

    async fn handle(
        &self,
        resolver: &BetResolver,
        _caller: &Caller,
        _args: &[&str],
    ) -> CasinoResult<String> {
        let play = match self.0 {
            BlackjackAction::Deal => resolver.deal_blackjack().await?,
            BlackjackAction::Hit => resolver.hit().await?,
            BlackjackAction::Stand => resolver.stand().await?,
            BlackjackAction::Split => resolver.split().await?,
        };
        Ok(play.to_string())
    }
}

pub struct BaccaratCommand;

#[async_trait]
impl CommandHandler for BaccaratCommand {
    fn requires_operator(&self) -> bool {
        true
    }

    async fn handle(
        &self,
        resolver: &BetResolver,
        _caller: &Caller,
        _args: &[&str],
    ) -> CasinoResult<String> {
        Ok(resolver.deal_baccarat().await?.to_string())
    }
}

/// Retries rounds whose settlement failed.
pub struct SettleCommand;

#[async_trait]
impl CommandHandler for SettleCommand {
    fn requires_operator(&self) -> bool {
        true
    }

    async fn handle(
        &self,
        resolver: &BetResolver,
        _caller: &Caller,
        _args: &[&str],
    ) -> CasinoResult<String> {
        let reports = resolver.settle_pending().await?;
        if reports.is_empty() {
            return Ok("Nothing to settle.".to_string());
        }
        Ok(reports
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

pub struct AuditCommand;

#[async_trait]
impl CommandHandler for AuditCommand {
    fn requires_operator(&self) -> bool {
        true
    }

    async fn handle(
        &self,
        resolver: &BetResolver,
        _caller: &Caller,
        _args: &[&str],
    ) -> CasinoResult<String> {
        Ok(resolver.audit().await?.to_string())
    }
}
