//! Database schema definitions
//!
//! DDL và row types cho sqlx mapping từ SQLite tables.
//! Token amount được lưu dưới dạng INTEGER units (xem `stakeledger_core::money`).

use crate::error::{PersistenceError, PersistenceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stakeledger_core::{from_units, TokenAccount, Transaction, TransactionType, UserId};

/// DDL statements, chạy theo thứ tự khi khởi tạo database.
///
/// Tất cả đều idempotent.
pub const SCHEMA: &[&str] = &[
    // Points do user-profile collaborator sở hữu
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS token_accounts (
        user_id INTEGER PRIMARY KEY,
        balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
        staked_amount INTEGER NOT NULL DEFAULT 0 CHECK (staked_amount >= 0),
        stake_start_date TEXT,
        stake_duration_days INTEGER,
        stake_end_date TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK (
            (staked_amount > 0) = (
                stake_start_date IS NOT NULL
                AND stake_duration_days IS NOT NULL
                AND stake_end_date IS NOT NULL
            )
        )
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS token_transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        tx_type TEXT NOT NULL CHECK (tx_type IN ('EARN', 'STAKE', 'UNSTAKE', 'TRANSFER')),
        amount INTEGER NOT NULL CHECK (amount > 0),
        points_converted INTEGER,
        counterparty_user_id INTEGER,
        description TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_token_transactions_user
    ON token_transactions (user_id, created_at DESC, id DESC)
    "#,
    // Audit trail: không cho sửa/xóa
    r#"
    CREATE TRIGGER IF NOT EXISTS token_transactions_no_update
    BEFORE UPDATE ON token_transactions
    BEGIN
        SELECT RAISE(ABORT, 'token_transactions is append-only');
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS token_transactions_no_delete
    BEFORE DELETE ON token_transactions
    BEGIN
        SELECT RAISE(ABORT, 'token_transactions is append-only');
    END
    "#,
];

/// Row type cho bảng `token_accounts`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TokenAccountRow {
    pub user_id: i64,
    pub balance: i64,       // units
    pub staked_amount: i64, // units
    pub stake_start_date: Option<DateTime<Utc>>,
    pub stake_duration_days: Option<i64>,
    pub stake_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row type cho bảng `token_transactions`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: i64,
    pub user_id: i64,
    pub tx_type: String,
    pub amount: i64, // units
    pub points_converted: Option<i64>,
    pub counterparty_user_id: Option<i64>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Transaction chưa được ghi (chưa có id)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub tx_type: TransactionType,
    pub amount_units: i64,
    pub points_converted: Option<i64>,
    pub counterparty_user_id: Option<UserId>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn new(
        user_id: UserId,
        tx_type: TransactionType,
        amount_units: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            tx_type,
            amount_units,
            points_converted: None,
            counterparty_user_id: None,
            description: tx_type.default_description().to_string(),
            created_at,
        }
    }

    pub fn with_points_converted(mut self, points: i64) -> Self {
        self.points_converted = Some(points);
        self
    }

    pub fn with_counterparty(mut self, user_id: UserId) -> Self {
        self.counterparty_user_id = Some(user_id);
        self
    }

    /// Transaction hoàn chỉnh sau khi storage cấp id
    pub fn into_transaction(self, id: i64) -> Transaction {
        Transaction {
            id,
            user_id: self.user_id,
            tx_type: self.tx_type,
            amount: from_units(self.amount_units),
            points_converted: self.points_converted,
            counterparty_user_id: self.counterparty_user_id,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

// === Conversion implementations ===

impl TokenAccountRow {
    /// Chuyển sang domain type, kèm points balance từ bảng `users`
    pub fn into_account(self, points_balance: i64) -> PersistenceResult<TokenAccount> {
        let stake_duration_days = self
            .stake_duration_days
            .map(|days| {
                u32::try_from(days)
                    .map_err(|_| PersistenceError::invalid_value("stake_duration_days", days))
            })
            .transpose()?;

        Ok(TokenAccount {
            user_id: self.user_id,
            balance: from_units(self.balance),
            points_balance,
            staked_amount: from_units(self.staked_amount),
            stake_start_date: self.stake_start_date,
            stake_duration_days,
            stake_end_date: self.stake_end_date,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = PersistenceError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let tx_type = TransactionType::from_str(&row.tx_type)
            .ok_or_else(|| PersistenceError::invalid_value("tx_type", &row.tx_type))?;

        Ok(Transaction {
            id: row.id,
            user_id: row.user_id,
            tx_type,
            amount: from_units(row.amount),
            points_converted: row.points_converted,
            counterparty_user_id: row.counterparty_user_id,
            description: row.description,
            created_at: row.created_at,
        })
    }
}
