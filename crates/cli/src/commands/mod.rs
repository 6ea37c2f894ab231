//! Subcommand handlers and shared output helpers

pub mod ledger;
pub mod points;
pub mod query;

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::json;
use stakeledger_core::Transaction;
use stakeledger_engine::EngineError;

/// Output mode selected by `--json`
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print a plain status message
    pub fn message(&self, text: &str) {
        if self.json {
            println!("{}", json!({ "message": text }));
        } else {
            println!("{}", text);
        }
    }

    pub fn json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print a committed transaction under a heading
    pub fn transaction(&self, heading: &str, tx: &Transaction) -> Result<()> {
        if self.json {
            return self.json(tx);
        }

        println!("✅ {}", heading);
        print_transaction(tx);
        Ok(())
    }
}

/// Engine errors surface with their stable code
pub fn engine_error(err: EngineError) -> anyhow::Error {
    anyhow!("[{}] {}", err.code(), err)
}

pub fn print_transaction(tx: &Transaction) {
    println!("   Transaction: #{}", tx.id);
    println!("   Type:        {}", tx.tx_type);
    println!("   User:        {}", tx.user_id);
    println!("   Amount:      {}", tx.amount);
    if let Some(points) = tx.points_converted {
        println!("   Points:      {}", points);
    }
    if let Some(counterparty) = tx.counterparty_user_id {
        println!("   To user:     {}", counterparty);
    }
    println!("   Description: {}", tx.description);
    println!("   Time:        {}", tx.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
}
