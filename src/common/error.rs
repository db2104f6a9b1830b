//! Common Error Types
//!
//! Root error for the library and the CLI.

use thiserror::Error;

use crate::deposit::DepositError;
use crate::taproot::TaprootError;

/// Root error type
#[derive(Debug, Error)]
pub enum ReserveError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] super::logging::LoggingError),

    /// Leaf building and address derivation
    #[error("taproot error: {0}")]
    Taproot(#[from] TaprootError),

    /// Coin selection and transaction building
    #[error("deposit error: {0}")]
    Deposit(#[from] DepositError),

    /// Validation errors
    #[error("validation error: {0}")]
    Validation(String),

    /// JSON input/output
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReserveError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Get error code for machine-readable output
    pub fn error_code(&self) -> &'static str {
        match self {
            ReserveError::Config(_) => "CONFIG_ERROR",
            ReserveError::Logging(_) => "LOGGING_ERROR",
            ReserveError::Taproot(e) => match e {
                TaprootError::InvalidLockValue(_) => "INVALID_LOCK_VALUE",
                TaprootError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
                TaprootError::AddressDerivationFailed(_) => "ADDRESS_DERIVATION_FAILED",
                TaprootError::InvalidKey => "INVALID_KEY",
            },
            ReserveError::Deposit(e) => match e {
                DepositError::NoUtxosAvailable => "NO_UTXOS_AVAILABLE",
                DepositError::InvalidFeeRate(_) => "INVALID_FEE_RATE",
                DepositError::NoSpendableUtxos { .. } => "NO_SPENDABLE_UTXOS",
                DepositError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
                DepositError::InsufficientBalanceForFee { .. } => "INSUFFICIENT_BALANCE_FOR_FEE",
                DepositError::InvalidChangeAddress(_) => "INVALID_CHANGE_ADDRESS",
                DepositError::InvalidDestinationAddress(_) => "INVALID_DESTINATION_ADDRESS",
                DepositError::AmountOverflow => "AMOUNT_OVERFLOW",
            },
            ReserveError::Validation(_) => "VALIDATION_ERROR",
            ReserveError::Json(_) => "JSON_ERROR",
            ReserveError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias using ReserveError
pub type Result<T> = std::result::Result<T, ReserveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err: ReserveError = DepositError::NoUtxosAvailable.into();
        assert_eq!(err.error_code(), "NO_UTXOS_AVAILABLE");
        assert!(err.to_string().contains("no UTXOs available"));

        let err: ReserveError = TaprootError::InvalidLockValue(-1).into();
        assert_eq!(err.error_code(), "INVALID_LOCK_VALUE");

        let err = ReserveError::validation("bad amount");
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
