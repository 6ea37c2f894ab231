//! # Config Module
//!
//! Tham số của ledger, truyền tường minh vào engine (không có global state).

use crate::error::{CoreError, CoreResult};
use crate::money::truncate_to_token_precision;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 1 point = 0.1 token
pub const DEFAULT_CONVERSION_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);
/// Stake tối thiểu 30 ngày
pub const DEFAULT_MIN_STAKE_DAYS: u32 = 30;
/// Reward cố định 5% trên số token stake
pub const DEFAULT_REWARD_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Cấu hình ledger.
///
/// Reward là flat rate, **không** prorate theo thời gian stake: stake 30 ngày
/// và 365 ngày nhận cùng một tỉ lệ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Số token nhận được cho mỗi point
    pub conversion_rate: Decimal,
    /// Thời gian stake tối thiểu (ngày)
    pub min_stake_days: u32,
    /// Tỉ lệ reward trả khi unstake
    pub reward_rate: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            conversion_rate: DEFAULT_CONVERSION_RATE,
            min_stake_days: DEFAULT_MIN_STAKE_DAYS,
            reward_rate: DEFAULT_REWARD_RATE,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.conversion_rate <= Decimal::ZERO {
            return Err(CoreError::InvalidConfig(format!(
                "conversion_rate must be positive, got {}",
                self.conversion_rate
            )));
        }
        if self.min_stake_days == 0 {
            return Err(CoreError::InvalidConfig(
                "min_stake_days must be at least 1".to_string(),
            ));
        }
        if self.reward_rate < Decimal::ZERO {
            return Err(CoreError::InvalidConfig(format!(
                "reward_rate must not be negative, got {}",
                self.reward_rate
            )));
        }
        Ok(())
    }

    /// Số token nhận được khi đổi `points`.
    ///
    /// Lỗi `AmountOverflow` nếu tích vượt quá phạm vi Decimal.
    pub fn tokens_for_points(&self, points: i64) -> CoreResult<Decimal> {
        Decimal::from(points)
            .checked_mul(self.conversion_rate)
            .map(truncate_to_token_precision)
            .ok_or_else(|| {
                CoreError::AmountOverflow(format!("{} points x {}", points, self.conversion_rate))
            })
    }

    /// Reward khi unstake `staked` token
    pub fn reward_for(&self, staked: Decimal) -> CoreResult<Decimal> {
        staked
            .checked_mul(self.reward_rate)
            .map(truncate_to_token_precision)
            .ok_or_else(|| {
                CoreError::AmountOverflow(format!("{} staked x {}", staked, self.reward_rate))
            })
    }
}
