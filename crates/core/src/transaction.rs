//! # Transaction Module
//!
//! Transaction là bản ghi immutable, append-only của mọi thao tác làm thay
//! đổi số dư. Mỗi mutation đã commit có đúng một Transaction tương ứng.

use crate::account::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Loại transaction trong ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Đổi points sang token
    Earn,
    /// Khóa token vào stake
    Stake,
    /// Rút stake kèm reward
    Unstake,
    /// Chuyển token cho user khác
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Earn => "EARN",
            TransactionType::Stake => "STAKE",
            TransactionType::Unstake => "UNSTAKE",
            TransactionType::Transfer => "TRANSFER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EARN" => Some(TransactionType::Earn),
            "STAKE" => Some(TransactionType::Stake),
            "UNSTAKE" => Some(TransactionType::Unstake),
            "TRANSFER" => Some(TransactionType::Transfer),
            _ => None,
        }
    }

    /// Mô tả mặc định ghi vào log
    pub fn default_description(&self) -> &'static str {
        match self {
            TransactionType::Earn => "Points conversion",
            TransactionType::Stake => "Token staking",
            TransactionType::Unstake => "Token unstaking with reward",
            TransactionType::Transfer => "Token transfer",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Một dòng trong transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// ID tăng dần, do storage cấp
    pub id: i64,
    pub user_id: UserId,
    pub tx_type: TransactionType,
    /// Lượng token đã di chuyển (luôn dương)
    pub amount: Decimal,
    /// Chỉ có với EARN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_converted: Option<i64>,
    /// Chỉ có với TRANSFER
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_user_id: Option<UserId>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} {} ({})", self.id, self.tx_type, self.amount, self.description)?;
        if let Some(to) = self.counterparty_user_id {
            write!(f, " -> user {}", to)?;
        }
        Ok(())
    }
}
