//! Error types for the ledger
//!
//! Two layers: [`StoreError`] is what a profile store can fail with, and
//! [`Error`] is the taxonomy callers see. Store failures are converted at the
//! ledger/transfer boundary and never reach command handlers as-is.

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Caller-facing ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Non-positive or otherwise unusable amount; rejected before any store access
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Conditioned decrement failed
    #[error("Insufficient funds: {account} cannot cover {required}")]
    InsufficientFunds {
        /// Account that could not cover the debit
        account: String,
        /// Points the operation needed
        required: u64,
    },

    /// Sender and receiver are the same account
    #[error("Cannot transfer points to yourself")]
    SelfTransfer,

    /// Store or transaction infrastructure failure
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the user can fix this by changing their input
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidAmount(_) | Error::InsufficientFunds { .. } | Error::SelfTransfer
        )
    }
}

/// Profile store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Backend cannot apply several account updates atomically
    #[error("Multi-account transactions are not supported by this store")]
    TransactionsUnsupported,

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        tracing::warn!(error = %err, "Profile store failure");
        Error::Unavailable(err.to_string())
    }
}
