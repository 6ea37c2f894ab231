//! Shared context for ledger services
//!
//! Holds the database pool, the ledger configuration and the clock. Every
//! mutating service opens its atomic unit through [`LedgerContext::begin`].

use crate::error::EngineResult;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use stakeledger_core::{Clock, LedgerConfig, SystemClock};
use stakeledger_persistence::Database;
use std::sync::Arc;

/// Context for ledger operations - contains database access, config and clock
#[derive(Clone)]
pub struct LedgerContext {
    pool: SqlitePool,
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
}

impl LedgerContext {
    /// Create new context from database; the config is validated here
    pub fn new(db: &Database, config: LedgerConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            pool: db.pool().clone(),
            config,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock (tests drive stake lock periods with a manual clock)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Open an atomic unit. Dropping it without `commit` rolls everything back.
    pub async fn begin(&self) -> EngineResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }
}
