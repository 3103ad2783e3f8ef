//! Line-oriented console front-end for the chat casino.
//!
//! Reads `<user> !command args` lines from stdin, runs them through the
//! casino's command registry and prints the replies.

mod config;

use std::sync::Arc;

use anyhow::Error;
use ctrlc::set_handler;
use goofsino::{BetResolver, CommandRegistry, Database, Ledger};
use log::info;
use pico_args::Arguments;
use tokio::io::{AsyncBufReadExt, BufReader};

use config::ConsoleConfig;

const HELP: &str = "\
Run the goofsino chat casino on stdin/stdout

USAGE:
  gs_console [OPTIONS]

Each input line is `<user> !command [args]`, e.g. `alice !red 200`.

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL or sqlite://goofsino.db]
  --operator   NAME        User allowed to run rounds  [default: env GOOFSINO_OPERATOR or operator]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             SQLite connection string
  STARTING_BALANCE         Points given to new players and after bankruptcy
  MIN_BET                  Smallest accepted wager
  LEDGER_LOCK_TIMEOUT_MS   How long a command waits for the ledger
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let operator: Option<String> = pargs.opt_value_from_str("--operator")?;
    let config = ConsoleConfig::from_env(database_url, operator)?;
    config.validate()?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    info!("Connecting to database: {}", config.database.database_url);
    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    db.migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to prepare the schema: {}", e))?;
    info!("Database connected successfully");

    let ledger = Ledger::new(Arc::new(db.pool().clone()), config.ledger.clone());
    let resolver = Arc::new(BetResolver::new(ledger, &config.games));
    let commands = CommandRegistry::casino_defaults(resolver);

    info!(
        "Casino open, {} runs the tables. Press Ctrl+C to stop.",
        config.operator
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(reply) = handle_line(&commands, &config.operator, &line).await {
            println!("{reply}");
        }
    }

    info!("Input closed, shutting down");
    db.close().await;
    Ok(())
}

/// Runs one console line. Lines that aren't commands get no reply.
async fn handle_line(commands: &CommandRegistry, operator: &str, line: &str) -> Option<String> {
    let (user, rest) = line.trim().split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    if !rest.starts_with('!') {
        return None;
    }
    let (command, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));

    if command.eq_ignore_ascii_case("!help") {
        let names: Vec<&str> = commands.commands().collect();
        return Some(format!("Commands: !{}", names.join(", !")));
    }
    if commands.requires_operator(command) && user != operator {
        return Some(format!("Only {operator} can do that."));
    }
    commands.dispatch(command, args, user, user).await
}
