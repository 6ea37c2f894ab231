//! Engine errors
//!
//! Every variant maps to a stable code via [`EngineError::code`], which the
//! HTTP layer (outside this crate) turns into a status code.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use stakeledger_core::{CoreError, UserId};
use stakeledger_persistence::PersistenceError;
use thiserror::Error;

/// Ledger operation errors
#[derive(Debug, Error)]
pub enum EngineError {
    // === Funds errors ===
    #[error("Insufficient points: required {required}, available {available}")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    // === Input errors ===
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid stake period: {days} days (minimum {min_days})")]
    InvalidStakePeriod { days: u32, min_days: u32 },

    #[error("Cannot transfer tokens to the same account: {0}")]
    SelfTransfer(UserId),

    // === Staking state errors ===
    #[error("Tokens already staked for user {0}")]
    AlreadyStaked(UserId),

    #[error("No staked tokens for user {0}")]
    NoStakedTokens(UserId),

    #[error("Stake period still active until {ends_at}")]
    StakePeriodActive { ends_at: DateTime<Utc> },

    // === Lookup errors ===
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    // === Concurrency errors ===
    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    // === Configuration errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Wrapped errors ===
    #[error("Storage error: {0}")]
    Storage(#[from] PersistenceError),
}

/// Result type alias for ledger operations
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Create not found error
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Create insufficient balance error
    pub fn insufficient_balance(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalance {
            required,
            available,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidStakePeriod { .. } => "INVALID_STAKE_PERIOD",
            Self::SelfTransfer(_) => "SELF_TRANSFER",
            Self::AlreadyStaked(_) => "ALREADY_STAKED",
            Self::NoStakedTokens(_) => "NO_STAKED_TOKENS",
            Self::StakePeriodActive { .. } => "STAKE_PERIOD_ACTIVE",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Storage(_) => "STORAGE",
        }
    }

    /// Caused by the caller's input or the account's state
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Storage(_) | Self::Conflict(_) | Self::InvalidConfig(_)
        )
    }

    /// Infrastructure failure or lost race; safe to retry the whole call
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Conflict(_))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(PersistenceError::Database(err))
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidAmount(msg) => Self::InvalidAmount(msg),
            CoreError::AmountOverflow(value) => {
                Self::InvalidAmount(format!("{} is out of range", value))
            }
            CoreError::InvalidConfig(msg) => Self::InvalidConfig(msg),
            CoreError::UnknownTransactionType(value) => {
                Self::Storage(PersistenceError::invalid_value("tx_type", value))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_balance_error() {
        let err = EngineError::insufficient_balance(dec!(1000), dec!(60));
        assert!(err.to_string().contains("required 1000"));
        assert!(err.to_string().contains("available 60"));
        assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
        assert!(err.is_client_error());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = vec![
            EngineError::InsufficientPoints {
                required: 10,
                available: 1,
            },
            EngineError::insufficient_balance(dec!(1), dec!(0)),
            EngineError::InvalidAmount("0".into()),
            EngineError::InvalidStakePeriod {
                days: 10,
                min_days: 30,
            },
            EngineError::SelfTransfer(1),
            EngineError::AlreadyStaked(1),
            EngineError::NoStakedTokens(1),
            EngineError::StakePeriodActive {
                ends_at: Utc::now(),
            },
            EngineError::not_found("Transaction", 1),
            EngineError::Conflict("race".into()),
            EngineError::InvalidConfig("rate".into()),
            EngineError::Storage(PersistenceError::not_found("x", 1)),
        ];

        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_storage_errors_are_retryable() {
        let err: EngineError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.code(), "STORAGE");
        assert!(err.is_retryable());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_core_error_mapping() {
        let err: EngineError = CoreError::AmountOverflow("1e30".into()).into();
        assert_eq!(err.code(), "INVALID_AMOUNT");

        let err: EngineError = CoreError::InvalidConfig("bad".into()).into();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }
}
