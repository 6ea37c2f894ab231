//! Token operations: stake, unstake, transfer

use anyhow::Result;
use rust_decimal::Decimal;
use stakeledger_core::UserId;
use stakeledger_engine::LedgerEngine;

use super::{engine_error, Output};

/// Stake tokens for `days`
pub async fn stake(
    engine: &LedgerEngine,
    out: &Output,
    user_id: UserId,
    amount: Decimal,
    days: u32,
) -> Result<()> {
    let tx = engine
        .stake(user_id, amount, days)
        .await
        .map_err(engine_error)?;

    out.transaction(&format!("Staked for {} days!", days), &tx)
}

/// Release matured stake with reward
pub async fn unstake(engine: &LedgerEngine, out: &Output, user_id: UserId) -> Result<()> {
    let tx = engine.unstake(user_id).await.map_err(engine_error)?;

    out.transaction("Unstaked with reward!", &tx)
}

pub async fn transfer(
    engine: &LedgerEngine,
    out: &Output,
    from: UserId,
    to: UserId,
    amount: Decimal,
) -> Result<()> {
    let tx = engine
        .transfer(from, to, amount)
        .await
        .map_err(engine_error)?;

    out.transaction("Transfer successful!", &tx)
}
