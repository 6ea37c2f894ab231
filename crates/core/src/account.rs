//! # Account Module
//!
//! Định nghĩa TokenAccount - số dư token và vị thế staking của một user.
//! Mỗi user có tối đa một TokenAccount, được tạo lazily ở lần ghi đầu tiên.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ID của user, do user-profile collaborator cấp
pub type UserId = i64;

/// Trạng thái staking của account tại một thời điểm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakeState {
    /// Không có token nào đang stake
    Idle,
    /// Đang stake, chưa hết thời gian khóa
    Staked,
    /// Đang stake, đã hết thời gian khóa - có thể unstake
    Unlockable,
}

impl StakeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StakeState::Idle => "idle",
            StakeState::Staked => "staked",
            StakeState::Unlockable => "unlockable",
        }
    }
}

impl fmt::Display for StakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Số dư token của một user.
///
/// Invariants:
/// - `balance >= 0`, `staked_amount >= 0`, `points_balance >= 0`
/// - `staked_amount > 0` khi và chỉ khi các trường stake được set,
///   và `stake_end_date = stake_start_date + stake_duration_days`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAccount {
    pub user_id: UserId,
    /// Token có thể chi tiêu
    pub balance: Decimal,
    /// Points do user-profile collaborator quản lý
    pub points_balance: i64,
    /// Token đang bị khóa trong stake (0 = không stake)
    pub staked_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stake_start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stake_duration_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stake_end_date: Option<DateTime<Utc>>,
    /// None nếu account chưa được materialize
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TokenAccount {
    /// Account rỗng cho user chưa có hoạt động nào
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: Decimal::ZERO,
            points_balance: 0,
            staked_amount: Decimal::ZERO,
            stake_start_date: None,
            stake_duration_days: None,
            stake_end_date: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_points(mut self, points: i64) -> Self {
        self.points_balance = points;
        self
    }

    /// Account đã được ghi vào storage chưa
    pub fn is_materialized(&self) -> bool {
        self.created_at.is_some()
    }

    pub fn is_staked(&self) -> bool {
        self.staked_amount > Decimal::ZERO
    }

    /// Trạng thái staking tại thời điểm `now`
    pub fn stake_state(&self, now: DateTime<Utc>) -> StakeState {
        match self.stake_end_date {
            Some(end) if self.is_staked() && now >= end => StakeState::Unlockable,
            Some(_) if self.is_staked() => StakeState::Staked,
            _ => StakeState::Idle,
        }
    }

    /// Tổng token (spendable + staked)
    pub fn total_tokens(&self) -> Decimal {
        self.balance + self.staked_amount
    }
}

impl fmt::Display for TokenAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User {} (balance: {}, staked: {}, points: {})",
            self.user_id, self.balance, self.staked_amount, self.points_balance
        )
    }
}
