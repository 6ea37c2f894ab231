//! Stakeledger CLI - token ledger operations from command line
//!
//! Usage:
//! ```bash
//! stakeledger init
//! stakeledger points grant 1 1000
//! stakeledger convert 1 500
//! stakeledger stake 1 40 --days 30
//! stakeledger transfer 1 2 10.5
//! stakeledger history 1 --limit 10
//! stakeledger --json balance 1
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use stakeledger_core::UserId;
use stakeledger_engine::DEFAULT_PAGE_LIMIT;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod db;

use commands::{ledger, points, query, Output};
use config::AppConfig;

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "stakeledger.toml";

/// Stakeledger - points-to-token ledger with time-locked staking
#[derive(Parser)]
#[command(name = "stakeledger")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file path (overrides [database].path)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// TOML config file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database schema
    Init {
        /// Force re-initialization (drops existing data)
        #[arg(long)]
        force: bool,
    },

    /// Show database status
    Status,

    /// Loyalty points held by the user profile
    Points {
        #[command(subcommand)]
        action: PointsAction,
    },

    /// Convert points into tokens
    Convert {
        /// User ID
        user_id: UserId,
        /// Points to convert
        points: i64,
    },

    /// Stake tokens for a fixed period
    Stake {
        /// User ID
        user_id: UserId,
        /// Amount of tokens to stake
        amount: Decimal,
        /// Lock period in days
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Release a matured stake with reward
    Unstake {
        /// User ID
        user_id: UserId,
    },

    /// Transfer tokens to another user
    Transfer {
        /// Sender user ID
        from: UserId,
        /// Receiver user ID
        to: UserId,
        /// Amount of tokens
        amount: Decimal,
    },

    /// Show token balance and stake
    Balance {
        /// User ID
        user_id: UserId,
    },

    /// List transactions, newest first
    History {
        /// User ID
        user_id: UserId,
        /// Page size
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: u32,
        /// Rows to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Show one transaction
    Tx {
        /// Transaction ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum PointsAction {
    /// Credit points to a user (creates the user)
    Grant {
        /// User ID
        user_id: UserId,
        /// Points to add
        points: i64,
    },
    /// Show points balance
    Show {
        /// User ID
        user_id: UserId,
    },
}

/// Resolve config: explicit file, then ./stakeledger.toml, then defaults
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            AppConfig::load_file(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("Failed to load config {}", DEFAULT_CONFIG_FILE))?
        }
        None => AppConfig::default(),
    };

    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let out = Output::new(cli.json);

    match cli.command {
        Commands::Init { force } => {
            db::init_database(&config.database, force).await?;
            out.message(&format!(
                "✅ Database initialized at {}",
                config.database.path.display()
            ));
        }

        Commands::Status => {
            db::show_status(&config.database, &out).await?;
        }

        Commands::Points { action } => {
            let engine = db::engine(&config).await?;
            points::handle(&engine, &out, action).await?;
        }

        Commands::Convert { user_id, points } => {
            let engine = db::engine(&config).await?;
            points::convert(&engine, &out, user_id, points).await?;
        }

        Commands::Stake {
            user_id,
            amount,
            days,
        } => {
            let engine = db::engine(&config).await?;
            ledger::stake(&engine, &out, user_id, amount, days).await?;
        }

        Commands::Unstake { user_id } => {
            let engine = db::engine(&config).await?;
            ledger::unstake(&engine, &out, user_id).await?;
        }

        Commands::Transfer { from, to, amount } => {
            let engine = db::engine(&config).await?;
            ledger::transfer(&engine, &out, from, to, amount).await?;
        }

        Commands::Balance { user_id } => {
            let engine = db::engine(&config).await?;
            query::balance(&engine, &out, user_id).await?;
        }

        Commands::History {
            user_id,
            limit,
            offset,
        } => {
            let engine = db::engine(&config).await?;
            query::history(&engine, &out, user_id, limit, offset).await?;
        }

        Commands::Tx { id } => {
            let engine = db::engine(&config).await?;
            query::transaction(&engine, &out, id).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_stake_defaults() {
        let cli = Cli::parse_from(["stakeledger", "stake", "1", "40.5"]);
        match cli.command {
            Commands::Stake {
                user_id,
                amount,
                days,
            } => {
                assert_eq!(user_id, 1);
                assert_eq!(amount.to_string(), "40.5");
                assert_eq!(days, 30);
            }
            _ => panic!("expected stake"),
        }
    }

    #[test]
    fn test_db_flag_overrides_config() {
        let cli = Cli::parse_from(["stakeledger", "--db", "/tmp/x.db", "--json", "status"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/x.db"));
        assert!(cli.json);
    }

    #[test]
    fn test_history_pagination_flags() {
        let cli = Cli::parse_from(["stakeledger", "history", "7", "--limit", "5", "--offset", "10"]);
        match cli.command {
            Commands::History {
                user_id,
                limit,
                offset,
            } => {
                assert_eq!((user_id, limit, offset), (7, 5, 10));
            }
            _ => panic!("expected history"),
        }
    }
}
