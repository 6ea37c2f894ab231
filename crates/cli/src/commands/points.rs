//! Points operations: grant, show, convert

use anyhow::Result;
use serde_json::json;
use stakeledger_core::UserId;
use stakeledger_engine::LedgerEngine;

use super::{engine_error, Output};
use crate::PointsAction;

pub async fn handle(engine: &LedgerEngine, out: &Output, action: PointsAction) -> Result<()> {
    match action {
        PointsAction::Grant { user_id, points } => grant(engine, out, user_id, points).await,
        PointsAction::Show { user_id } => show(engine, out, user_id).await,
    }
}

/// Credit points to a user profile
pub async fn grant(engine: &LedgerEngine, out: &Output, user_id: UserId, points: i64) -> Result<()> {
    let balance = engine
        .grant_points(user_id, points)
        .await
        .map_err(engine_error)?;

    if out.is_json() {
        return out.json(&json!({ "user_id": user_id, "points": balance }));
    }

    println!("✅ Points granted!");
    println!("   User:    {}", user_id);
    println!("   Granted: +{}", points);
    println!("   Points:  {}", balance);
    Ok(())
}

pub async fn show(engine: &LedgerEngine, out: &Output, user_id: UserId) -> Result<()> {
    let points = engine.get_points(user_id).await.map_err(engine_error)?;

    if out.is_json() {
        return out.json(&json!({ "user_id": user_id, "points": points }));
    }

    println!("🎯 Points for user {}: {}", user_id, points);
    Ok(())
}

/// Convert points into tokens
pub async fn convert(engine: &LedgerEngine, out: &Output, user_id: UserId, points: i64) -> Result<()> {
    let tx = engine
        .convert_points(user_id, points)
        .await
        .map_err(engine_error)?;

    out.transaction("Points converted!", &tx)
}
