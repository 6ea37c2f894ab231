//! # Money Module
//!
//! Ledger token là đơn vị duy nhất của engine. Amount được lưu dưới dạng
//! fixed-point units (8 chữ số thập phân) để các guard predicate trong SQL
//! (`balance >= ?`) so sánh chính xác tuyệt đối.
//!
//! # Examples
//! ```
//! use stakeledger_core::money::{from_units, to_units};
//! use rust_decimal_macros::dec;
//!
//! let units = to_units(dec!(10.5)).unwrap();
//! assert_eq!(units, 1_050_000_000);
//! assert_eq!(from_units(units), dec!(10.5));
//! ```

use crate::error::{CoreError, CoreResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Số chữ số thập phân của ledger token
pub const TOKEN_DECIMALS: u32 = 8;

/// Số units trong 1 token (10^TOKEN_DECIMALS)
pub const UNITS_PER_TOKEN: i64 = 100_000_000;

/// Chuyển Decimal sang fixed-point units.
///
/// Lỗi nếu amount có nhiều hơn [`TOKEN_DECIMALS`] chữ số thập phân
/// hoặc vượt quá phạm vi i64.
pub fn to_units(amount: Decimal) -> CoreResult<i64> {
    let normalized = amount.normalize();
    if normalized.scale() > TOKEN_DECIMALS {
        return Err(CoreError::InvalidAmount(format!(
            "{} has more than {} decimal places",
            amount, TOKEN_DECIMALS
        )));
    }

    normalized
        .checked_mul(Decimal::from(UNITS_PER_TOKEN))
        .and_then(|scaled| scaled.to_i64())
        .ok_or_else(|| CoreError::AmountOverflow(amount.to_string()))
}

/// Chuyển fixed-point units về Decimal (đã normalize)
pub fn from_units(units: i64) -> Decimal {
    Decimal::new(units, TOKEN_DECIMALS).normalize()
}

/// Cắt bớt (về phía 0) amount xuống độ chính xác của token.
///
/// Dùng cho các giá trị được tính toán (conversion credit, staking reward).
pub fn truncate_to_token_precision(amount: Decimal) -> Decimal {
    amount
        .round_dp_with_strategy(TOKEN_DECIMALS, RoundingStrategy::ToZero)
        .normalize()
}
