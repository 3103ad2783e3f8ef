//! Integration tests for the ledger store and its concurrency guard.
//!
//! Tests account creation, wager acceptance, settlement against the house,
//! bankruptcy, leaderboards, lock timeouts and rollback on abandoned writers.

use goofsino::catalog::{BetType, Resolution};
use goofsino::db::{Database, DatabaseConfig};
use goofsino::games::Pocket;
use goofsino::ledger::{AccountId, EntryKind, Ledger, LedgerConfig, LedgerError, LedgerRead};
use std::sync::Arc;
use std::time::Duration;

/// Helper to create a ledger over a fresh in-memory database
async fn setup_ledger(config: LedgerConfig) -> Ledger {
    let db = Database::new(&DatabaseConfig::in_memory())
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Failed to migrate test database");
    Ledger::new(Arc::new(db.pool().clone()), config)
}

fn account(id: &str) -> AccountId {
    AccountId::new(id).unwrap()
}

/// Helper to open an account with the starting balance
async fn open_account(ledger: &Ledger, id: &str) -> AccountId {
    let id = account(id);
    let mut writer = ledger.write().await.unwrap();
    writer.ensure_account(&id, id.as_str()).await.unwrap();
    writer.commit().await.unwrap();
    id
}

#[tokio::test]
async fn test_ensure_account_never_resets_balance() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = account("alice");

    let mut writer = ledger.write().await.unwrap();
    let created = writer.ensure_account(&alice, "Alice").await.unwrap();
    assert_eq!(created.balance, 1000);
    assert_eq!(created.issued, 1000);
    writer.place_bet(&alice, BetType::Red, 300).await.unwrap();
    writer
        .settle_all_bets_of_type(BetType::Red, Resolution::Lost)
        .await
        .unwrap();
    writer.commit().await.unwrap();

    let mut writer = ledger.write().await.unwrap();
    let again = writer.ensure_account(&alice, "Alice the Bold").await.unwrap();
    writer.commit().await.unwrap();
    assert_eq!(again.balance, 700);
    assert_eq!(again.issued, 1000);
    assert_eq!(again.display_name, "Alice the Bold");
}

#[tokio::test]
async fn test_unknown_account_reads_zero_and_is_not_created() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let ghost = account("ghost");

    let mut reader = ledger.read().await.unwrap();
    assert_eq!(reader.get_balance(&ghost).await.unwrap(), 0);
    assert_eq!(reader.get_total_open_bets(&ghost).await.unwrap(), 0);
    assert!(reader.get_account(&ghost).await.unwrap().is_none());
    assert!(reader.top_balances(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_whole_balance_on_black_then_nothing_more() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;

    let mut writer = ledger.write().await.unwrap();
    assert_eq!(
        writer.place_bet(&alice, BetType::Black, 1000).await.unwrap(),
        1000
    );
    let err = writer.place_bet(&alice, BetType::Red, 1).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientFunds {
            balance: 1000,
            open: 1000,
            requested: 1
        }
    ));
    writer.commit().await.unwrap();

    let mut reader = ledger.read().await.unwrap();
    assert_eq!(reader.get_total_open_bets(&alice).await.unwrap(), 1000);
    assert_eq!(
        reader.get_open_bet_amount(&alice, BetType::Red).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_bets_accumulate_per_type() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;

    let mut writer = ledger.write().await.unwrap();
    assert_eq!(writer.place_bet(&alice, BetType::Red, 100).await.unwrap(), 100);
    assert_eq!(writer.place_bet(&alice, BetType::Red, 50).await.unwrap(), 150);
    assert_eq!(writer.place_bet(&alice, BetType::Odd, 25).await.unwrap(), 25);
    writer.commit().await.unwrap();

    let mut reader = ledger.read().await.unwrap();
    let bets = reader.open_bets(&alice).await.unwrap();
    assert_eq!(bets.len(), 2);
    assert_eq!(reader.get_total_open_bets(&alice).await.unwrap(), 175);
    // Open wagers stay in the balance until they lose
    assert_eq!(reader.get_balance(&alice).await.unwrap(), 1000);
}

#[tokio::test]
async fn test_below_minimum_rejected() {
    let ledger = setup_ledger(LedgerConfig {
        min_bet: 10,
        ..LedgerConfig::default()
    })
    .await;
    let alice = open_account(&ledger, "alice").await;

    let mut writer = ledger.write().await.unwrap();
    let err = writer.place_bet(&alice, BetType::Red, 5).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::BelowMinimum {
            minimum: 10,
            requested: 5
        }
    ));
    assert_eq!(
        writer.get_open_bet_amount(&alice, BetType::Red).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_red_loses_to_the_house() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;

    let mut writer = ledger.write().await.unwrap();
    writer.place_bet(&alice, BetType::Red, 200).await.unwrap();
    writer.commit().await.unwrap();

    // 17 is black
    let mut writer = ledger.write().await.unwrap();
    let round_id = writer.round_id();
    let settlements = writer
        .settle_all_bets_of_type(BetType::Red, Resolution::Lost)
        .await
        .unwrap();
    writer.commit().await.unwrap();

    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0].delta, -200);
    assert_eq!(settlements[0].balance, 800);
    assert_eq!(
        settlements[0].to_string(),
        "alice lost 200 points on Red. Balance: 800 points"
    );

    let mut reader = ledger.read().await.unwrap();
    assert_eq!(reader.get_balance(&alice).await.unwrap(), 800);
    assert_eq!(reader.get_balance(&AccountId::house()).await.unwrap(), 200);
    assert!(reader.audit().await.unwrap().is_conserved());

    let entries = reader.round_entries(round_id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries.iter().map(|e| e.amount).sum::<i64>(), 0);
    assert!(entries.iter().all(|e| e.kind == EntryKind::Loss));
}

#[tokio::test]
async fn test_straight_up_win_paid_by_house() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;
    let seventeen = BetType::Straight(Pocket::new(17).unwrap());

    let mut writer = ledger.write().await.unwrap();
    writer.place_bet(&alice, seventeen, 10).await.unwrap();
    let settled = writer
        .settle_bet(&alice, seventeen, Resolution::Won)
        .await
        .unwrap()
        .unwrap();
    writer.commit().await.unwrap();

    assert_eq!(settled.delta, 350);
    assert_eq!(settled.balance, 1350);
    let mut reader = ledger.read().await.unwrap();
    assert_eq!(reader.get_balance(&AccountId::house()).await.unwrap(), -350);
    assert!(reader.audit().await.unwrap().is_conserved());
}

#[tokio::test]
async fn test_banco_commission_floors() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;

    let mut writer = ledger.write().await.unwrap();
    writer.place_bet(&alice, BetType::Banco, 15).await.unwrap();
    let settled = writer
        .settle_all_bets_of_type(BetType::Banco, Resolution::Won)
        .await
        .unwrap();
    writer.commit().await.unwrap();

    assert_eq!(settled[0].delta, 14);
    let mut reader = ledger.read().await.unwrap();
    assert_eq!(reader.get_balance(&alice).await.unwrap(), 1014);
    assert_eq!(reader.get_balance(&AccountId::house()).await.unwrap(), -14);
}

#[tokio::test]
async fn test_push_returns_the_stake() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;

    let mut writer = ledger.write().await.unwrap();
    writer.place_bet(&alice, BetType::Punto, 100).await.unwrap();
    let settled = writer
        .settle_all_bets_of_type(BetType::Punto, Resolution::Push)
        .await
        .unwrap();
    writer.commit().await.unwrap();

    assert_eq!(settled[0].delta, 0);
    assert_eq!(settled[0].balance, 1000);
    let mut reader = ledger.read().await.unwrap();
    assert_eq!(reader.get_total_open_bets(&alice).await.unwrap(), 0);
}

#[tokio::test]
async fn test_second_settlement_is_a_noop() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;
    let bob = open_account(&ledger, "bob").await;

    let mut writer = ledger.write().await.unwrap();
    writer.place_bet(&alice, BetType::Green, 10).await.unwrap();
    writer.place_bet(&bob, BetType::Green, 20).await.unwrap();
    let first = writer
        .settle_all_bets_of_type(BetType::Green, Resolution::Won)
        .await
        .unwrap();
    let second = writer
        .settle_all_bets_of_type(BetType::Green, Resolution::Won)
        .await
        .unwrap();
    writer.commit().await.unwrap();

    // Settled in account id order
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].account_id, alice);
    assert_eq!(first[1].account_id, bob);
    assert!(second.is_empty());

    let mut reader = ledger.read().await.unwrap();
    assert_eq!(reader.get_balance(&alice).await.unwrap(), 1170);
    assert_eq!(reader.get_balance(&bob).await.unwrap(), 1340);
    let audit = reader.audit().await.unwrap();
    assert!(audit.is_conserved(), "books should balance: {audit}");
    assert_eq!(audit.open, 0);
}

#[tokio::test]
async fn test_missing_wager_settles_to_none() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;

    let mut writer = ledger.write().await.unwrap();
    let settled = writer
        .settle_bet(&alice, BetType::Tie, Resolution::Won)
        .await
        .unwrap();
    assert!(settled.is_none());
}

#[tokio::test]
async fn test_bankruptcy_resets_broke_player() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;

    let mut writer = ledger.write().await.unwrap();
    assert!(!writer.try_declare_bankruptcy(&alice).await.unwrap());
    writer.place_bet(&alice, BetType::Black, 1000).await.unwrap();
    // Money on the table still counts
    assert!(!writer.try_declare_bankruptcy(&alice).await.unwrap());
    writer
        .settle_all_bets_of_type(BetType::Black, Resolution::Lost)
        .await
        .unwrap();
    assert!(writer.try_declare_bankruptcy(&alice).await.unwrap());
    writer.commit().await.unwrap();

    let mut reader = ledger.read().await.unwrap();
    let account = reader.get_account(&alice).await.unwrap().unwrap();
    assert_eq!(account.balance, 1000);
    assert_eq!(account.issued, 2000);
    assert_eq!(reader.bankruptcy_count(&alice).await.unwrap(), 1);

    let audit = reader.audit().await.unwrap();
    assert_eq!(audit.players, 1000);
    assert_eq!(audit.house, 1000);
    assert!(audit.is_conserved());

    let history = reader.recent_entries(&alice, 10).await.unwrap();
    assert_eq!(history[0].kind, EntryKind::Bankruptcy);
    assert_eq!(history[0].amount, 1000);
    assert_eq!(history[1].kind, EntryKind::Loss);
}

#[tokio::test]
async fn test_house_account_is_reserved() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let house = AccountId::house();

    let mut writer = ledger.write().await.unwrap();
    assert!(matches!(
        writer.ensure_account(&house, "Sneaky").await,
        Err(LedgerError::ReservedAccount(_))
    ));
    assert!(matches!(
        writer.place_bet(&house, BetType::Red, 10).await,
        Err(LedgerError::ReservedAccount(_))
    ));
    assert!(matches!(
        writer.try_declare_bankruptcy(&house).await,
        Err(LedgerError::ReservedAccount(_))
    ));
}

#[tokio::test]
async fn test_leaderboards_rank_recent_first_on_ties() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let bob = open_account(&ledger, "bob").await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let carol = open_account(&ledger, "carol").await;

    // Carol loses 100 to the house
    let mut writer = ledger.write().await.unwrap();
    writer.place_bet(&carol, BetType::Odd, 100).await.unwrap();
    writer
        .settle_all_bets_of_type(BetType::Odd, Resolution::Lost)
        .await
        .unwrap();
    writer.commit().await.unwrap();

    let mut reader = ledger.read().await.unwrap();
    let top = reader.top_balances(10).await.unwrap();
    let order: Vec<&str> = top.iter().map(|a| a.account_id.as_str()).collect();
    assert_eq!(order, vec![bob.as_str(), alice.as_str(), carol.as_str()]);
    assert_eq!(reader.top_balances(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_bankruptcy_leaderboard() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;
    let bob = open_account(&ledger, "bob").await;

    for (player, times) in [(&alice, 1), (&bob, 2)] {
        for _ in 0..times {
            let mut writer = ledger.write().await.unwrap();
            writer.place_bet(player, BetType::High, 1000).await.unwrap();
            writer
                .settle_all_bets_of_type(BetType::High, Resolution::Lost)
                .await
                .unwrap();
            assert!(writer.try_declare_bankruptcy(player).await.unwrap());
            writer.commit().await.unwrap();
        }
    }

    let mut reader = ledger.read().await.unwrap();
    let records = reader.most_bankruptcies(10).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].account_id, bob);
    assert_eq!(records[0].count, 2);
    assert_eq!(records[1].account_id, alice);
    assert!(reader.audit().await.unwrap().is_conserved());
}

#[tokio::test]
async fn test_busy_while_writer_holds_the_lock() {
    let ledger = setup_ledger(LedgerConfig {
        lock_timeout: Duration::from_millis(50),
        ..LedgerConfig::default()
    })
    .await;

    let writer = ledger.write().await.unwrap();
    assert!(matches!(ledger.write().await, Err(LedgerError::Busy(_))));
    assert!(matches!(ledger.read().await, Err(LedgerError::Busy(_))));
    assert_eq!(
        LedgerError::Busy(Duration::from_millis(50)).client_message(),
        "The casino is busy right now, try again in a moment."
    );
    writer.commit().await.unwrap();

    assert!(ledger.read().await.is_ok());
}

#[tokio::test]
async fn test_dropped_writer_rolls_back() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;

    {
        let mut writer = ledger.write().await.unwrap();
        writer.place_bet(&alice, BetType::Red, 500).await.unwrap();
        writer
            .settle_all_bets_of_type(BetType::Red, Resolution::Lost)
            .await
            .unwrap();
        // Abandoned before commit
    }

    let mut reader = ledger.read().await.unwrap();
    assert_eq!(reader.get_balance(&alice).await.unwrap(), 1000);
    assert_eq!(reader.get_balance(&AccountId::house()).await.unwrap(), 0);
    assert!(reader.recent_entries(&alice, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_explicit_rollback() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;

    let mut writer = ledger.write().await.unwrap();
    writer.place_bet(&alice, BetType::Red, 500).await.unwrap();
    writer.rollback().await.unwrap();

    let mut reader = ledger.read().await.unwrap();
    assert_eq!(reader.get_total_open_bets(&alice).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bets_never_overcommit() {
    let ledger = setup_ledger(LedgerConfig::default()).await;
    let alice = open_account(&ledger, "alice").await;

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let ledger = ledger.clone();
        let alice = alice.clone();
        tasks.push(tokio::spawn(async move {
            let mut writer = ledger.write().await?;
            writer.place_bet(&alice, BetType::Even, 100).await?;
            writer.commit().await
        }));
    }

    let mut accepted = 0;
    let mut refused = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => accepted += 1,
            Err(LedgerError::InsufficientFunds { .. }) => refused += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(accepted, 10);
    assert_eq!(refused, 10);

    let mut reader = ledger.read().await.unwrap();
    assert_eq!(
        reader.get_open_bet_amount(&alice, BetType::Even).await.unwrap(),
        1000
    );
}
