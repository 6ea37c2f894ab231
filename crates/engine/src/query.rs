//! Read-side queries - balance, history, single transaction
//!
//! Reads never create rows: an unknown user has a zero-valued account.

use crate::context::LedgerContext;
use crate::error::{EngineError, EngineResult};
use stakeledger_core::{TokenAccount, Transaction, UserId};
use stakeledger_persistence::{AccountRepo, PointsRepo, TransactionRepo};

/// Default page size for history listing
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Query Service - read-only access to accounts and the audit trail
pub struct QueryService<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> QueryService<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    /// Account snapshot with points; zero-valued if never materialized
    pub async fn get_balance(&self, user_id: UserId) -> EngineResult<TokenAccount> {
        let pool = self.ctx.pool();
        let points = PointsRepo::get_points(pool, user_id).await?.unwrap_or(0);

        match AccountRepo::get(pool, user_id).await? {
            Some(row) => Ok(row.into_account(points)?),
            None => Ok(TokenAccount::empty(user_id).with_points(points)),
        }
    }

    /// History, newest first
    pub async fn list_transactions(
        &self,
        user_id: UserId,
        limit: u32,
        offset: u32,
    ) -> EngineResult<Vec<Transaction>> {
        let rows = TransactionRepo::list_by_user(self.ctx.pool(), user_id, limit, offset).await?;

        let mut transactions = Vec::with_capacity(rows.len());
        for row in rows {
            transactions.push(Transaction::try_from(row)?);
        }
        Ok(transactions)
    }

    pub async fn count_transactions(&self, user_id: UserId) -> EngineResult<i64> {
        Ok(TransactionRepo::count_by_user(self.ctx.pool(), user_id).await?)
    }

    pub async fn get_transaction(&self, id: i64) -> EngineResult<Transaction> {
        let row = TransactionRepo::get_by_id(self.ctx.pool(), id)
            .await?
            .ok_or_else(|| EngineError::not_found("Transaction", id))?;
        Ok(Transaction::try_from(row)?)
    }
}
