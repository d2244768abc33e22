//! Withdrawal limits for the points economy
//!
//! Rolling weekly quotas that gate point outflows, per account and per
//! deployment or server.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod types;
pub mod limits;

pub use error::{Error, Result};
pub use types::*;
pub use limits::WithdrawalLimiter;
