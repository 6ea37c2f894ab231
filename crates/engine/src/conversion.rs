//! Points conversion - turn loyalty points into tokens
//!
//! ConversionService deducts points from the user profile and credits the
//! token account in one atomic unit, writing an EARN row to the audit trail.

use crate::context::LedgerContext;
use crate::error::{EngineError, EngineResult};
use rust_decimal::Decimal;
use stakeledger_core::{to_units, Transaction, TransactionType, UserId};
use stakeledger_persistence::{AccountRepo, NewTransaction, PointsRepo, TransactionRepo};

/// Conversion Service - handles points grant and points-to-token conversion
pub struct ConversionService<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> ConversionService<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    /// Convert points at the configured rate (0.1 token per point by default)
    pub async fn convert_points(&self, user_id: UserId, points: i64) -> EngineResult<Transaction> {
        // Validate amount
        if points <= 0 {
            return Err(EngineError::InvalidAmount(format!(
                "Points to convert must be positive: {}",
                points
            )));
        }

        let tokens = self.ctx.config().tokens_for_points(points)?;
        if tokens <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(format!(
                "{} points convert to zero tokens",
                points
            )));
        }
        let units = to_units(tokens)?;
        let now = self.ctx.now();

        let mut tx = self.ctx.begin().await?;

        // Guarded deduct first: takes the write lock before any read
        let deducted = PointsRepo::deduct_if_sufficient(&mut tx, user_id, points, now).await?;
        if deducted == 0 {
            let available = PointsRepo::get_points(&mut *tx, user_id).await?;
            tracing::debug!(user_id, points, ?available, "Conversion rejected");
            return Err(match available {
                None => EngineError::not_found("User", user_id),
                Some(available) => EngineError::InsufficientPoints {
                    required: points,
                    available,
                },
            });
        }

        let credited = AccountRepo::credit_or_create(&mut tx, user_id, units, now).await?;
        if credited == 0 {
            return Err(EngineError::InvalidAmount(format!(
                "Crediting {} tokens would overflow the balance of user {}",
                tokens, user_id
            )));
        }

        let record = NewTransaction::new(user_id, TransactionType::Earn, units, now)
            .with_points_converted(points);
        let tx_id = TransactionRepo::insert(&mut tx, &record).await?;

        tx.commit().await?;

        tracing::info!(user_id, tx_id, points, tokens = %tokens, "Points converted");
        Ok(record.into_transaction(tx_id))
    }

    /// Credit points to a user profile, creating it on first grant.
    ///
    /// Points are owned by the user-profile side; this is its entry point.
    pub async fn grant_points(&self, user_id: UserId, points: i64) -> EngineResult<i64> {
        if points <= 0 {
            return Err(EngineError::InvalidAmount(format!(
                "Points to grant must be positive: {}",
                points
            )));
        }

        let balance = PointsRepo::grant(self.ctx.pool(), user_id, points, self.ctx.now())
            .await?
            .ok_or_else(|| {
                EngineError::InvalidAmount(format!(
                    "Granting {} points would overflow the points of user {}",
                    points, user_id
                ))
            })?;
        tracing::info!(user_id, points, balance, "Points granted");
        Ok(balance)
    }

    /// Points balance; zero for unknown users
    pub async fn get_points(&self, user_id: UserId) -> EngineResult<i64> {
        Ok(PointsRepo::get_points(self.ctx.pool(), user_id)
            .await?
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stakeledger_core::LedgerConfig;
    use stakeledger_persistence::Database;

    async fn setup() -> (Database, LedgerContext) {
        let db = Database::in_memory().await.unwrap();
        let ctx = LedgerContext::new(&db, LedgerConfig::default()).unwrap();
        (db, ctx)
    }

    #[tokio::test]
    async fn test_convert_points() {
        let (db, ctx) = setup().await;
        let service = ConversionService::new(&ctx);
        service.grant_points(1, 1000).await.unwrap();

        let tx = service.convert_points(1, 100).await.unwrap();
        assert_eq!(tx.tx_type, TransactionType::Earn);
        assert_eq!(tx.amount, dec!(10));
        assert_eq!(tx.points_converted, Some(100));
        assert_eq!(tx.description, "Points conversion");

        assert_eq!(service.get_points(1).await.unwrap(), 900);
        let row = AccountRepo::get(db.pool(), 1).await.unwrap().unwrap();
        assert_eq!(row.balance, to_units(dec!(10)).unwrap());
    }

    #[tokio::test]
    async fn test_convert_insufficient_points() {
        let (db, ctx) = setup().await;
        let service = ConversionService::new(&ctx);
        service.grant_points(1, 50).await.unwrap();

        let err = service.convert_points(1, 100).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientPoints {
                required: 100,
                available: 50
            }
        ));

        // Nothing changed
        assert_eq!(service.get_points(1).await.unwrap(), 50);
        assert!(AccountRepo::get(db.pool(), 1).await.unwrap().is_none());
        assert_eq!(TransactionRepo::count(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_convert_unknown_user() {
        let (_db, ctx) = setup().await;
        let service = ConversionService::new(&ctx);

        let err = service.convert_points(404, 10).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_convert_invalid_amounts() {
        let (_db, ctx) = setup().await;
        let service = ConversionService::new(&ctx);
        service.grant_points(1, 100).await.unwrap();

        for points in [0, -5] {
            let err = service.convert_points(1, points).await.unwrap_err();
            assert_eq!(err.code(), "INVALID_AMOUNT");
        }
        assert_eq!(service.get_points(1).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_convert_rounding_to_zero_rejected() {
        let db = Database::in_memory().await.unwrap();
        let config = LedgerConfig {
            conversion_rate: dec!(0.000000001),
            ..LedgerConfig::default()
        };
        let ctx = LedgerContext::new(&db, config).unwrap();
        let service = ConversionService::new(&ctx);
        service.grant_points(1, 5).await.unwrap();

        let err = service.convert_points(1, 5).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_AMOUNT");
        assert_eq!(service.get_points(1).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_convert_with_huge_rate_is_rejected() {
        let db = Database::in_memory().await.unwrap();
        let config = LedgerConfig {
            conversion_rate: dec!(100000000000000000000),
            ..LedgerConfig::default()
        };
        let ctx = LedgerContext::new(&db, config).unwrap();
        let service = ConversionService::new(&ctx);
        service.grant_points(1, 10_000_000_000).await.unwrap();

        let err = service.convert_points(1, 10_000_000_000).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_AMOUNT");
        assert_eq!(service.get_points(1).await.unwrap(), 10_000_000_000);
        assert!(AccountRepo::get(db.pool(), 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_convert_into_full_balance_rolls_back() {
        let (db, ctx) = setup().await;
        let service = ConversionService::new(&ctx);
        service.grant_points(1, 1000).await.unwrap();
        service.convert_points(1, 10).await.unwrap();

        let near_max = i64::MAX - 1_000;
        sqlx::query("UPDATE token_accounts SET balance = ? WHERE user_id = 1")
            .bind(near_max)
            .execute(db.pool())
            .await
            .unwrap();

        let err = service.convert_points(1, 100).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_AMOUNT");

        // Points deduct rolled back, balance still an exact integer
        assert_eq!(service.get_points(1).await.unwrap(), 990);
        let row = AccountRepo::get(db.pool(), 1).await.unwrap().unwrap();
        assert_eq!(row.balance, near_max);
        assert_eq!(TransactionRepo::count(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_grant_points_overflow_rejected() {
        let (_db, ctx) = setup().await;
        let service = ConversionService::new(&ctx);

        service.grant_points(5, i64::MAX - 1).await.unwrap();
        let err = service.grant_points(5, 2).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_AMOUNT");
        assert_eq!(service.get_points(5).await.unwrap(), i64::MAX - 1);
    }

    #[tokio::test]
    async fn test_grant_points_accumulates() {
        let (_db, ctx) = setup().await;
        let service = ConversionService::new(&ctx);

        assert_eq!(service.grant_points(3, 40).await.unwrap(), 40);
        assert_eq!(service.grant_points(3, 60).await.unwrap(), 100);
        assert!(service.grant_points(3, 0).await.is_err());
        assert_eq!(service.get_points(99).await.unwrap(), 0);
    }
}
