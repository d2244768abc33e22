//! Error types for withdrawal limits

use points_ledger::StoreError;
use thiserror::Error;

/// Withdrawal limiter error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Negative reservation requested
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Store unavailable
    #[error("Withdrawal limits unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        tracing::warn!(error = %err, "Profile store failure in withdrawal limiter");
        Error::Unavailable(err.to_string())
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
