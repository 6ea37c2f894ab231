//! # Stakeledger Engine
//!
//! Ledger operations: points conversion, staking, transfer and queries.
//!
//! Every mutation runs inside one SQLite transaction whose first statement is
//! a guarded write, so concurrent callers serialize on the write lock and a
//! failed precondition leaves no trace.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stakeledger_engine::LedgerEngine;
//! use stakeledger_core::LedgerConfig;
//! use stakeledger_persistence::Database;
//! use rust_decimal_macros::dec;
//!
//! let db = Database::in_memory().await?;
//! let engine = LedgerEngine::new(&db, LedgerConfig::default())?;
//!
//! engine.grant_points(1, 1000).await?;
//! engine.convert_points(1, 1000).await?;   // +100 tokens
//! engine.stake(1, dec!(40), 30).await?;
//! engine.transfer(1, 2, dec!(10)).await?;
//! ```

pub mod context;
pub mod conversion;
pub mod error;
pub mod query;
pub mod staking;
pub mod transfer;

pub use context::LedgerContext;
pub use conversion::ConversionService;
pub use error::{EngineError, EngineResult};
pub use query::{QueryService, DEFAULT_PAGE_LIMIT};
pub use staking::StakingService;
pub use transfer::TransferService;

use rust_decimal::Decimal;
use stakeledger_core::{Clock, LedgerConfig, TokenAccount, Transaction, UserId};
use stakeledger_persistence::Database;
use std::sync::Arc;

/// Ledger facade - one entry point per operation
#[derive(Clone)]
pub struct LedgerEngine {
    ctx: LedgerContext,
}

impl LedgerEngine {
    /// Create engine over an opened database; fails on invalid config
    pub fn new(db: &Database, config: LedgerConfig) -> EngineResult<Self> {
        Ok(Self {
            ctx: LedgerContext::new(db, config)?,
        })
    }

    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            ctx: self.ctx.with_clock(clock),
        }
    }

    pub fn context(&self) -> &LedgerContext {
        &self.ctx
    }

    pub fn config(&self) -> &LedgerConfig {
        self.ctx.config()
    }

    // === Points ===

    pub async fn grant_points(&self, user_id: UserId, points: i64) -> EngineResult<i64> {
        ConversionService::new(&self.ctx)
            .grant_points(user_id, points)
            .await
    }

    pub async fn get_points(&self, user_id: UserId) -> EngineResult<i64> {
        ConversionService::new(&self.ctx).get_points(user_id).await
    }

    pub async fn convert_points(&self, user_id: UserId, points: i64) -> EngineResult<Transaction> {
        ConversionService::new(&self.ctx)
            .convert_points(user_id, points)
            .await
    }

    // === Staking ===

    pub async fn stake(
        &self,
        user_id: UserId,
        amount: Decimal,
        duration_days: u32,
    ) -> EngineResult<Transaction> {
        StakingService::new(&self.ctx)
            .stake(user_id, amount, duration_days)
            .await
    }

    pub async fn unstake(&self, user_id: UserId) -> EngineResult<Transaction> {
        StakingService::new(&self.ctx).unstake(user_id).await
    }

    // === Transfer ===

    pub async fn transfer(
        &self,
        from_user: UserId,
        to_user: UserId,
        amount: Decimal,
    ) -> EngineResult<Transaction> {
        TransferService::new(&self.ctx)
            .transfer(from_user, to_user, amount)
            .await
    }

    // === Queries ===

    pub async fn get_balance(&self, user_id: UserId) -> EngineResult<TokenAccount> {
        QueryService::new(&self.ctx).get_balance(user_id).await
    }

    pub async fn list_transactions(
        &self,
        user_id: UserId,
        limit: u32,
        offset: u32,
    ) -> EngineResult<Vec<Transaction>> {
        QueryService::new(&self.ctx)
            .list_transactions(user_id, limit, offset)
            .await
    }

    pub async fn count_transactions(&self, user_id: UserId) -> EngineResult<i64> {
        QueryService::new(&self.ctx).count_transactions(user_id).await
    }

    pub async fn get_transaction(&self, id: i64) -> EngineResult<Transaction> {
        QueryService::new(&self.ctx).get_transaction(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_engine_rejects_invalid_config() {
        let db = Database::in_memory().await.unwrap();
        let config = LedgerConfig {
            conversion_rate: dec!(0),
            ..LedgerConfig::default()
        };

        let err = LedgerEngine::new(&db, config).err().unwrap();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }

    #[tokio::test]
    async fn test_engine_facade_roundtrip() {
        let db = Database::in_memory().await.unwrap();
        let engine = LedgerEngine::new(&db, LedgerConfig::default()).unwrap();

        engine.grant_points(1, 1000).await.unwrap();
        engine.convert_points(1, 1000).await.unwrap();
        engine.transfer(1, 2, dec!(25)).await.unwrap();

        assert_eq!(engine.get_balance(1).await.unwrap().balance, dec!(75));
        assert_eq!(engine.get_balance(2).await.unwrap().balance, dec!(25));
        assert_eq!(engine.count_transactions(1).await.unwrap(), 2);
        assert_eq!(engine.get_points(1).await.unwrap(), 0);
    }
}
