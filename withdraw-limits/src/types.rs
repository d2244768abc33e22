//! Types for withdrawal limits

use serde::{Deserialize, Serialize};

/// Seconds in the weekly window
pub const WEEK_SECS: i64 = 7 * 24 * 60 * 60;

/// Limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawalLimitConfig {
    /// Per-account weekly cap
    pub weekly_cap: i64,

    /// Deployment- or server-wide weekly cap
    pub global_weekly_cap: i64,

    /// Window length in seconds
    pub window_secs: i64,
}

impl Default for WithdrawalLimitConfig {
    fn default() -> Self {
        Self {
            weekly_cap: 1_000,
            global_weekly_cap: 50_000,
            window_secs: WEEK_SECS,
        }
    }
}

/// Outcome of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Whether the amount was reserved
    pub allowed: bool,

    /// Quota left in the window after this call
    pub remaining: i64,

    /// Quota used in the window after this call
    pub used: i64,

    /// When the current window expires (epoch seconds)
    pub window_resets_at: i64,
}

/// Outcome of checking both the account and the global gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualReservation {
    /// Per-account gate
    pub account: Reservation,

    /// Global gate
    pub global: Reservation,
}

impl DualReservation {
    /// Both gates reserved the amount
    pub fn allowed(&self) -> bool {
        self.account.allowed && self.global.allowed
    }
}
