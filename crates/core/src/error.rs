//! # Error Module
//!
//! Định nghĩa các domain errors cho Stakeledger sử dụng thiserror.

use thiserror::Error;

/// Core domain errors.
///
/// Các lỗi nghiệp vụ cốt lõi, không liên quan đến infrastructure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // === Amount errors ===
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount out of range: {0}")]
    AmountOverflow(String),

    // === Configuration errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Decoding errors ===
    #[error("Unknown transaction type: {0}")]
    UnknownTransactionType(String),
}

/// Result type alias với CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Kiểm tra có phải lỗi amount không (bao gồm overflow)
    pub fn is_amount_error(&self) -> bool {
        matches!(self, CoreError::InvalidAmount(_) | CoreError::AmountOverflow(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidAmount("-5".to_string());
        assert_eq!(err.to_string(), "Invalid amount: -5");

        let err = CoreError::UnknownTransactionType("MINT".to_string());
        assert_eq!(err.to_string(), "Unknown transaction type: MINT");
    }

    #[test]
    fn test_error_checks() {
        assert!(CoreError::InvalidAmount("0".into()).is_amount_error());
        assert!(CoreError::AmountOverflow("1e30".into()).is_amount_error());
        assert!(!CoreError::InvalidConfig("rate".into()).is_amount_error());
    }
}
