//! Command dispatch: the surface the chat front-end talks to.
//!
//! The front-end parses `!command args` out of chat, checks
//! [`CommandRegistry::requires_operator`] against its own notion of who runs
//! the casino, and forwards the rest to [`CommandRegistry::dispatch`].

use async_trait::async_trait;
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    catalog::BetType,
    ledger::AccountId,
    resolver::{BetResolver, CasinoResult},
};

pub mod handlers;

use handlers::{
    AuditCommand, BaccaratCommand, BalanceCommand, BankruptCommand, BankruptciesCommand,
    BetCommand, BlackjackAction, BlackjackCommand, HistoryCommand, LeaderboardCommand,
    SettleCommand, SpinCommand, StatusCommand, StraightCommand,
};

/// Who issued a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: AccountId,
    pub name: String,
}

/// A single chat command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Whether only the casino operator may run the command
    fn requires_operator(&self) -> bool {
        false
    }

    async fn handle(
        &self,
        resolver: &BetResolver,
        caller: &Caller,
        args: &[&str],
    ) -> CasinoResult<String>;
}

/// Maps command names to handlers.
pub struct CommandRegistry {
    resolver: Arc<BetResolver>,
    handlers: BTreeMap<String, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new(resolver: Arc<BetResolver>) -> Self {
        Self {
            resolver,
            handlers: BTreeMap::new(),
        }
    }

    /// Every command the casino offers.
    pub fn casino_defaults(resolver: Arc<BetResolver>) -> Self {
        let mut registry = Self::new(resolver);
        for bet_type in BetType::SIMPLE {
            registry.register(&bet_type.id(), BetCommand(bet_type));
        }
        registry.register("straight", StraightCommand);
        registry.register("balance", BalanceCommand);
        registry.register("bankrupt", BankruptCommand);
        registry.register("leaderboard", LeaderboardCommand);
        registry.register("bankruptcies", BankruptciesCommand);
        registry.register("history", HistoryCommand);
        registry.register("status", StatusCommand);

        registry.register("spin", SpinCommand);
        registry.register("deal", BlackjackCommand(BlackjackAction::Deal));
        registry.register("hit", BlackjackCommand(BlackjackAction::Hit));
        registry.register("stand", BlackjackCommand(BlackjackAction::Stand));
        registry.register("split", BlackjackCommand(BlackjackAction::Split));
        registry.register("baccarat", BaccaratCommand);
        registry.register("settle", SettleCommand);
        registry.register("audit", AuditCommand);
        registry
    }

    pub fn register(&mut self, name: &str, handler: impl CommandHandler + 'static) {
        self.handlers.insert(name.to_lowercase(), Box::new(handler));
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Whether `command` is restricted to the operator. Unknown commands are
    /// not.
    pub fn requires_operator(&self, command: &str) -> bool {
        self.handler(command)
            .is_some_and(|handler| handler.requires_operator())
    }

    /// Run `command` on behalf of the caller. Returns `None` when no such
    /// command exists so the front-end can stay quiet.
    pub async fn dispatch(
        &self,
        command: &str,
        args: &str,
        caller_id: &str,
        caller_name: &str,
    ) -> Option<String> {
        let handler = self.handler(command)?;

        let id = match AccountId::new(caller_id) {
            Ok(id) if !id.is_house() => id,
            Ok(_) => return Some("That account belongs to the house.".to_string()),
            Err(err) => return Some(err.client_message()),
        };
        let name = match caller_name.trim() {
            "" => id.to_string(),
            name => name.to_string(),
        };
        let caller = Caller { id, name };
        let args: Vec<&str> = args.split_whitespace().collect();

        let response = match handler.handle(&self.resolver, &caller, &args).await {
            Ok(response) => response,
            Err(err) => {
                log::debug!("!{command} from {} refused: {err}", caller.id);
                err.client_message()
            }
        };
        Some(response)
    }

    fn handler(&self, command: &str) -> Option<&dyn CommandHandler> {
        let name = command.trim().trim_start_matches('!').to_lowercase();
        self.handlers.get(&name).map(Box::as_ref)
    }
}
