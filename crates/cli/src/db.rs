//! Database initialization and status

use anyhow::{Context, Result};
use serde_json::json;
use stakeledger_engine::LedgerEngine;
use stakeledger_persistence::{Database, DatabaseOptions};
use std::path::PathBuf;

use crate::commands::{engine_error, Output};
use crate::config::AppConfig;

/// Open database (schema is created if missing)
pub async fn open(options: &DatabaseOptions) -> Result<Database> {
    Database::open(options)
        .await
        .with_context(|| format!("Failed to open database {}", options.path.display()))
}

/// Open database and build the engine from config
pub async fn engine(config: &AppConfig) -> Result<LedgerEngine> {
    let db = open(&config.database).await?;
    LedgerEngine::new(&db, config.ledger.clone()).map_err(engine_error)
}

/// Initialize the database with schema
pub async fn init_database(options: &DatabaseOptions, force: bool) -> Result<()> {
    if force && options.path.exists() {
        std::fs::remove_file(&options.path).context("Failed to remove existing database")?;
        // WAL side files belong to the old database
        for suffix in ["-wal", "-shm"] {
            let mut side = options.path.clone().into_os_string();
            side.push(suffix);
            let side = PathBuf::from(side);
            if side.exists() {
                std::fs::remove_file(&side)
                    .with_context(|| format!("Failed to remove {}", side.display()))?;
            }
        }
        tracing::info!(path = %options.path.display(), "Removed existing database");
    }

    let db = open(options).await?;
    db.close().await;
    Ok(())
}

/// Show database status
pub async fn show_status(options: &DatabaseOptions, out: &Output) -> Result<()> {
    if !options.path.exists() {
        out.message(&format!(
            "❌ Database not found at {}\n   Run 'stakeledger init' to create the database",
            options.path.display()
        ));
        return Ok(());
    }

    let db = open(options).await?;
    let stats = db.stats().await.context("Failed to count records")?;

    if out.is_json() {
        out.json(&json!({
            "path": options.path.display().to_string(),
            "users": stats.users,
            "accounts": stats.accounts,
            "transactions": stats.transactions,
        }))?;
    } else {
        println!("📊 Database Status");
        println!("   Path: {}", options.path.display());
        println!();
        println!("   Users:        {}", stats.users);
        println!("   Accounts:     {}", stats.accounts);
        println!("   Transactions: {}", stats.transactions);
    }

    db.close().await;
    Ok(())
}
