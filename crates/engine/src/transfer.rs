//! Token transfer between accounts
//!
//! The receiver's account is created on first credit. Only the sender's
//! audit trail records the transfer, with the receiver as counterparty.

use crate::context::LedgerContext;
use crate::error::{EngineError, EngineResult};
use rust_decimal::Decimal;
use stakeledger_core::{from_units, to_units, Transaction, TransactionType, UserId};
use stakeledger_persistence::{AccountRepo, NewTransaction, TransactionRepo};

/// Transfer Service - moves liquid balance between users
pub struct TransferService<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> TransferService<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    /// Transfer `amount` from `from_user` balance to `to_user` balance
    pub async fn transfer(
        &self,
        from_user: UserId,
        to_user: UserId,
        amount: Decimal,
    ) -> EngineResult<Transaction> {
        // Validate amount
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(format!(
                "Transfer amount must be positive: {}",
                amount
            )));
        }

        if from_user == to_user {
            return Err(EngineError::SelfTransfer(from_user));
        }

        let units = to_units(amount)?;
        let now = self.ctx.now();

        let mut tx = self.ctx.begin().await?;

        // Debit sender (guarded)
        let debited = AccountRepo::debit_if_sufficient(&mut tx, from_user, units, now).await?;
        if debited == 0 {
            let available = AccountRepo::get(&mut *tx, from_user)
                .await?
                .map(|row| from_units(row.balance))
                .unwrap_or(Decimal::ZERO);
            tracing::debug!(from_user, to_user, amount = %amount, "Transfer rejected");
            return Err(EngineError::insufficient_balance(amount, available));
        }

        // Credit receiver; the debit rolls back with the tx on overflow
        let credited = AccountRepo::credit_or_create(&mut tx, to_user, units, now).await?;
        if credited == 0 {
            tracing::debug!(from_user, to_user, amount = %amount, "Receiver balance would overflow");
            return Err(EngineError::InvalidAmount(format!(
                "Transfer of {} would overflow the balance of user {}",
                amount, to_user
            )));
        }

        let record = NewTransaction::new(from_user, TransactionType::Transfer, units, now)
            .with_counterparty(to_user);
        let tx_id = TransactionRepo::insert(&mut tx, &record).await?;

        tx.commit().await?;

        tracing::info!(
            user_id = from_user,
            to_user,
            tx_id,
            amount = %amount,
            "Tokens transferred"
        );
        Ok(record.into_transaction(tx_id))
    }
}
