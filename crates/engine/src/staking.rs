//! Staking operations - lock tokens for a fixed period, release with reward
//!
//! One active stake per account. The reward is a flat fraction of the staked
//! amount, paid in full on unstake regardless of how long past the end date.

use crate::context::LedgerContext;
use crate::error::{EngineError, EngineResult};
use chrono::Duration;
use rust_decimal::Decimal;
use stakeledger_core::{from_units, to_units, Transaction, TransactionType, UserId};
use stakeledger_persistence::{AccountRepo, NewTransaction, PersistenceError, TransactionRepo};

/// Staking Service - handles stake and unstake operations
pub struct StakingService<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> StakingService<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    /// Move `amount` from balance into a stake locked for `duration_days`
    pub async fn stake(
        &self,
        user_id: UserId,
        amount: Decimal,
        duration_days: u32,
    ) -> EngineResult<Transaction> {
        // Validate amount
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(format!(
                "Stake amount must be positive: {}",
                amount
            )));
        }

        // Validate period
        let min_days = self.ctx.config().min_stake_days;
        if duration_days < min_days {
            return Err(EngineError::InvalidStakePeriod {
                days: duration_days,
                min_days,
            });
        }

        let units = to_units(amount)?;
        let start = self.ctx.now();
        let end = start
            .checked_add_signed(Duration::days(i64::from(duration_days)))
            .ok_or(EngineError::InvalidStakePeriod {
                days: duration_days,
                min_days,
            })?;

        let mut tx = self.ctx.begin().await?;

        // Single guarded update: no active stake AND enough balance
        let updated =
            AccountRepo::begin_stake(&mut tx, user_id, units, duration_days, start, end).await?;
        if updated == 0 {
            let row = AccountRepo::get(&mut *tx, user_id).await?;
            tracing::debug!(user_id, amount = %amount, "Stake rejected");
            return Err(match row {
                Some(row) if row.staked_amount > 0 => EngineError::AlreadyStaked(user_id),
                Some(row) => EngineError::insufficient_balance(amount, from_units(row.balance)),
                None => EngineError::insufficient_balance(amount, Decimal::ZERO),
            });
        }

        let record = NewTransaction::new(user_id, TransactionType::Stake, units, start);
        let tx_id = TransactionRepo::insert(&mut tx, &record).await?;

        tx.commit().await?;

        tracing::info!(
            user_id,
            tx_id,
            amount = %amount,
            duration_days,
            ends_at = %end,
            "Tokens staked"
        );
        Ok(record.into_transaction(tx_id))
    }

    /// Release the matured stake plus reward back into balance
    pub async fn unstake(&self, user_id: UserId) -> EngineResult<Transaction> {
        let now = self.ctx.now();
        let mut tx = self.ctx.begin().await?;

        // Lock the account row before reading it
        let locked = AccountRepo::lock_for_update(&mut tx, user_id, now).await?;
        if locked == 0 {
            tracing::debug!(user_id, "Unstake rejected: no account");
            return Err(EngineError::NoStakedTokens(user_id));
        }

        let row = AccountRepo::get(&mut *tx, user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("TokenAccount", user_id))?;

        if row.staked_amount == 0 {
            tracing::debug!(user_id, "Unstake rejected: nothing staked");
            return Err(EngineError::NoStakedTokens(user_id));
        }

        let ends_at = row
            .stake_end_date
            .ok_or_else(|| PersistenceError::invalid_value("stake_end_date", "NULL"))?;
        if now < ends_at {
            tracing::debug!(user_id, ends_at = %ends_at, "Unstake rejected: stake still locked");
            return Err(EngineError::StakePeriodActive { ends_at });
        }

        let staked = from_units(row.staked_amount);
        let reward = self.ctx.config().reward_for(staked)?;
        let payout_units = row
            .staked_amount
            .checked_add(to_units(reward)?)
            .ok_or_else(|| EngineError::InvalidAmount(format!("payout for {} overflows", staked)))?;
        if row.balance.checked_add(payout_units).is_none() {
            tracing::debug!(user_id, staked = %staked, "Unstake rejected: balance would overflow");
            return Err(EngineError::InvalidAmount(format!(
                "payout for {} would overflow the balance of user {}",
                staked, user_id
            )));
        }

        // Guard on the stake we observed
        let released =
            AccountRepo::release_stake(&mut tx, user_id, row.staked_amount, payout_units, now)
                .await?;
        if released == 0 {
            tracing::warn!(user_id, "Stake changed between read and release");
            return Err(EngineError::Conflict(format!(
                "stake for user {} changed during unstake",
                user_id
            )));
        }

        let record = NewTransaction::new(user_id, TransactionType::Unstake, payout_units, now);
        let tx_id = TransactionRepo::insert(&mut tx, &record).await?;

        tx.commit().await?;

        tracing::info!(
            user_id,
            tx_id,
            staked = %staked,
            reward = %reward,
            "Tokens unstaked"
        );
        Ok(record.into_transaction(tx_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::ConversionService;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use stakeledger_core::{LedgerConfig, ManualClock};
    use stakeledger_persistence::Database;
    use std::sync::Arc;

    async fn setup() -> (Database, LedgerContext, Arc<ManualClock>) {
        let db = Database::in_memory().await.unwrap();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        ));
        let ctx = LedgerContext::new(&db, LedgerConfig::default())
            .unwrap()
            .with_clock(clock.clone());

        // User 1 starts with 100 tokens
        let conversion = ConversionService::new(&ctx);
        conversion.grant_points(1, 1000).await.unwrap();
        conversion.convert_points(1, 1000).await.unwrap();

        (db, ctx, clock)
    }

    #[tokio::test]
    async fn test_stake_moves_balance() {
        let (db, ctx, _clock) = setup().await;
        let service = StakingService::new(&ctx);

        let tx = service.stake(1, dec!(40), 30).await.unwrap();
        assert_eq!(tx.tx_type, TransactionType::Stake);
        assert_eq!(tx.amount, dec!(40));
        assert_eq!(tx.description, "Token staking");

        let row = AccountRepo::get(db.pool(), 1).await.unwrap().unwrap();
        assert_eq!(from_units(row.balance), dec!(60));
        assert_eq!(from_units(row.staked_amount), dec!(40));
        assert_eq!(row.stake_duration_days, Some(30));
        assert_eq!(
            row.stake_end_date.unwrap() - row.stake_start_date.unwrap(),
            Duration::days(30)
        );
    }

    #[tokio::test]
    async fn test_stake_validation() {
        let (_db, ctx, _clock) = setup().await;
        let service = StakingService::new(&ctx);

        let err = service.stake(1, dec!(0), 30).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_AMOUNT");

        let err = service.stake(1, dec!(10), 29).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidStakePeriod {
                days: 29,
                min_days: 30
            }
        ));

        let err = service.stake(1, dec!(1000), 30).await.unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_BALANCE");

        // Unknown account has zero balance
        let err = service.stake(2, dec!(1), 30).await.unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
    }

    #[tokio::test]
    async fn test_second_stake_rejected() {
        let (db, ctx, _clock) = setup().await;
        let service = StakingService::new(&ctx);

        service.stake(1, dec!(10), 30).await.unwrap();
        let err = service.stake(1, dec!(10), 60).await.unwrap_err();
        assert!(matches!(err, EngineError::AlreadyStaked(1)));

        let row = AccountRepo::get(db.pool(), 1).await.unwrap().unwrap();
        assert_eq!(from_units(row.staked_amount), dec!(10));
        assert_eq!(from_units(row.balance), dec!(90));
    }

    #[tokio::test]
    async fn test_unstake_before_end_rejected() {
        let (_db, ctx, clock) = setup().await;
        let service = StakingService::new(&ctx);
        service.stake(1, dec!(40), 30).await.unwrap();

        clock.advance(Duration::days(29));
        let err = service.unstake(1).await.unwrap_err();
        assert!(matches!(err, EngineError::StakePeriodActive { .. }));
    }

    #[tokio::test]
    async fn test_unstake_pays_reward() {
        let (db, ctx, clock) = setup().await;
        let service = StakingService::new(&ctx);
        service.stake(1, dec!(40), 30).await.unwrap();

        clock.advance(Duration::days(30));
        let tx = service.unstake(1).await.unwrap();
        assert_eq!(tx.tx_type, TransactionType::Unstake);
        assert_eq!(tx.amount, dec!(42));
        assert_eq!(tx.description, "Token unstaking with reward");

        let row = AccountRepo::get(db.pool(), 1).await.unwrap().unwrap();
        assert_eq!(from_units(row.balance), dec!(102));
        assert_eq!(row.staked_amount, 0);
        assert!(row.stake_start_date.is_none());
        assert!(row.stake_duration_days.is_none());
        assert!(row.stake_end_date.is_none());
    }

    #[tokio::test]
    async fn test_unstake_without_stake() {
        let (_db, ctx, _clock) = setup().await;
        let service = StakingService::new(&ctx);

        let err = service.unstake(1).await.unwrap_err();
        assert!(matches!(err, EngineError::NoStakedTokens(1)));

        // No account at all
        let err = service.unstake(77).await.unwrap_err();
        assert!(matches!(err, EngineError::NoStakedTokens(77)));
    }

    #[tokio::test]
    async fn test_unstake_into_full_balance_keeps_stake() {
        let (db, ctx, clock) = setup().await;
        let service = StakingService::new(&ctx);
        service.stake(1, dec!(40), 30).await.unwrap();

        let near_max = i64::MAX - 1_000;
        sqlx::query("UPDATE token_accounts SET balance = ? WHERE user_id = 1")
            .bind(near_max)
            .execute(db.pool())
            .await
            .unwrap();

        clock.advance(Duration::days(30));
        let err = service.unstake(1).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_AMOUNT");

        let row = AccountRepo::get(db.pool(), 1).await.unwrap().unwrap();
        assert_eq!(row.balance, near_max);
        assert_eq!(from_units(row.staked_amount), dec!(40));
        assert!(row.stake_end_date.is_some());
    }

    #[tokio::test]
    async fn test_unstake_with_huge_reward_rate_is_rejected() {
        let db = Database::in_memory().await.unwrap();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        ));
        let config = LedgerConfig {
            reward_rate: Decimal::MAX,
            ..LedgerConfig::default()
        };
        let ctx = LedgerContext::new(&db, config)
            .unwrap()
            .with_clock(clock.clone());
        let conversion = ConversionService::new(&ctx);
        conversion.grant_points(1, 1000).await.unwrap();
        conversion.convert_points(1, 1000).await.unwrap();

        let service = StakingService::new(&ctx);
        service.stake(1, dec!(40), 30).await.unwrap();
        clock.advance(Duration::days(30));

        let err = service.unstake(1).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_AMOUNT");
        let row = AccountRepo::get(db.pool(), 1).await.unwrap().unwrap();
        assert_eq!(from_units(row.staked_amount), dec!(40));
    }

    #[tokio::test]
    async fn test_restake_after_unstake() {
        let (_db, ctx, clock) = setup().await;
        let service = StakingService::new(&ctx);

        service.stake(1, dec!(40), 30).await.unwrap();
        clock.advance(Duration::days(45));
        service.unstake(1).await.unwrap();

        let tx = service.stake(1, dec!(100), 30).await.unwrap();
        assert_eq!(tx.amount, dec!(100));
    }
}
