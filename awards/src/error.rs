//! Error types for awarders

use points_ledger::StoreError;
use thiserror::Error;

/// Awarder error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Ledger refused or failed the credit
    #[error(transparent)]
    Ledger(#[from] points_ledger::Error),

    /// Store unavailable while taking a claim
    #[error("Awards unavailable: {0}")]
    Unavailable(String),

    /// Question source failed
    #[error("Question source error: {0}")]
    Question(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        tracing::warn!(error = %err, "Profile store failure in awarder");
        Error::Unavailable(err.to_string())
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
