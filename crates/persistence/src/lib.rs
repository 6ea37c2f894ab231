//! # Stakeledger Persistence
//!
//! Persistence layer cho Stakeledger - SQLite.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Database                             │
//! │  ┌─────────────┐    ┌──────────────────┐    ┌────────────┐ │
//! │  │   users     │    │  token_accounts  │    │  token_    │ │
//! │  │  (points)   │    │ (balance/stake)  │    │transactions│ │
//! │  └─────────────┘    └──────────────────┘    └────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stakeledger_persistence::{Database, DatabaseOptions, AccountRepo};
//!
//! let db = Database::open(&DatabaseOptions::default()).await?;
//! let row = AccountRepo::get(db.pool(), 42).await?;
//! ```

pub mod error;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::{
    create_memory_pool, create_pool, init_schema, AccountRepo, NewTransaction, PointsRepo,
    TokenAccountRow, TransactionRepo, TransactionRow,
};

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::PathBuf;

/// Tham số kết nối database (section `[database]` trong file config)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    /// Đường dẫn file SQLite
    pub path: PathBuf,
    /// Số connection tối đa trong pool
    pub max_connections: u32,
    /// Thời gian chờ write lock (ms)
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/stakeledger.db"),
            max_connections: 5,
            busy_timeout_ms: 5_000,
        }
    }
}

impl DatabaseOptions {
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// SQLite URL (e.g., "sqlite:data/stakeledger.db")
    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

/// Số lượng bản ghi trong database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub users: i64,
    pub accounts: i64,
    pub transactions: i64,
}

/// Database facade - sở hữu SQLite connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Mở (hoặc tạo) database file và khởi tạo schema
    pub async fn open(options: &DatabaseOptions) -> PersistenceResult<Self> {
        if let Some(parent) = options.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PersistenceError::Configuration(format!(
                        "cannot create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let pool = create_pool(options).await?;
        init_schema(&pool).await?;
        tracing::info!(path = %options.path.display(), "Database opened");

        Ok(Self { pool })
    }

    /// In-memory database, dùng cho test và demo
    pub async fn in_memory() -> PersistenceResult<Self> {
        let pool = create_memory_pool().await?;
        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Get SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn stats(&self) -> PersistenceResult<DatabaseStats> {
        Ok(DatabaseStats {
            users: PointsRepo::count(&self.pool).await?,
            accounts: AccountRepo::count(&self.pool).await?,
            transactions: TransactionRepo::count(&self.pool).await?,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
