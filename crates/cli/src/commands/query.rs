//! Read-only views: balance, history, single transaction

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use stakeledger_core::{StakeState, TokenAccount, Transaction, UserId};
use stakeledger_engine::LedgerEngine;

use super::{engine_error, print_transaction, Output};

#[derive(Serialize)]
struct BalanceView<'a> {
    #[serde(flatten)]
    account: &'a TokenAccount,
    stake_state: StakeState,
}

#[derive(Serialize)]
struct HistoryPage<'a> {
    user_id: UserId,
    total: i64,
    limit: u32,
    offset: u32,
    transactions: &'a [Transaction],
}

pub async fn balance(engine: &LedgerEngine, out: &Output, user_id: UserId) -> Result<()> {
    let account = engine.get_balance(user_id).await.map_err(engine_error)?;
    let stake_state = account.stake_state(Utc::now());

    if out.is_json() {
        return out.json(&BalanceView {
            account: &account,
            stake_state,
        });
    }

    println!("💰 Balance for user {}", user_id);
    println!("   Tokens: {}", account.balance);
    println!("   Points: {}", account.points_balance);
    println!("   Staked: {} ({})", account.staked_amount, stake_state);
    if let (Some(days), Some(end)) = (account.stake_duration_days, account.stake_end_date) {
        println!("   Lock:   {} days, ends {}", days, end.format("%Y-%m-%d %H:%M UTC"));
    }
    println!("   Total:  {}", account.total_tokens());
    Ok(())
}

pub async fn history(
    engine: &LedgerEngine,
    out: &Output,
    user_id: UserId,
    limit: u32,
    offset: u32,
) -> Result<()> {
    let transactions = engine
        .list_transactions(user_id, limit, offset)
        .await
        .map_err(engine_error)?;
    let total = engine
        .count_transactions(user_id)
        .await
        .map_err(engine_error)?;

    if out.is_json() {
        return out.json(&HistoryPage {
            user_id,
            total,
            limit,
            offset,
            transactions: &transactions,
        });
    }

    println!(
        "📜 Transactions for user {} ({} of {}, offset {})",
        user_id,
        transactions.len(),
        total,
        offset
    );
    println!();
    if transactions.is_empty() {
        println!("   (none)");
    }
    for tx in &transactions {
        println!(
            "   {}  {}",
            tx.created_at.format("%Y-%m-%d %H:%M:%S"),
            tx
        );
    }
    Ok(())
}

pub async fn transaction(engine: &LedgerEngine, out: &Output, id: i64) -> Result<()> {
    let tx = engine.get_transaction(id).await.map_err(engine_error)?;

    if out.is_json() {
        return out.json(&tx);
    }

    println!("🧾 Transaction #{}", tx.id);
    print_transaction(&tx);
    Ok(())
}
