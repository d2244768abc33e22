//! Error types for casino games

use thiserror::Error;

/// Game error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bet outside the table limits
    #[error("Invalid bet: {0}")]
    InvalidBet(String),

    /// Bet larger than the player's balance, refused before drawing
    #[error("Bet of {bet} exceeds balance of {balance}")]
    BetExceedsBalance {
        /// Requested bet
        bet: i64,
        /// Balance at validation time
        balance: i64,
    },

    /// Ledger refused or failed to apply the outcome
    #[error(transparent)]
    Ledger(#[from] points_ledger::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
