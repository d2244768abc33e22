//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Integer points (no fractional balances)
//! - Epoch-second timestamps, `0` meaning unset

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Chat platform user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat platform server (guild) identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerId(String);

impl ServerId {
    /// Create new server ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one account: a user, optionally scoped to a server
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountKey {
    /// Owning user
    pub user_id: UserId,
    /// Server scope (`None` for server-agnostic accounts)
    pub server_id: Option<ServerId>,
}

impl AccountKey {
    /// Server-agnostic account
    pub fn global(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            server_id: None,
        }
    }

    /// Account scoped to a server
    pub fn scoped(server_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            server_id: Some(ServerId::new(server_id)),
        }
    }

    /// Storage key bytes.
    ///
    /// Self-delimiting: a scope tag, then each component with a big-endian
    /// `u64` length. No key is a prefix of another key's journal rows.
    pub fn storage_key(&self) -> Vec<u8> {
        let mut key = scope_key(&self.server_id);
        push_component(&mut key, self.user_id.as_str());
        key
    }
}

const SCOPE_GLOBAL: u8 = 0;
const SCOPE_SERVER: u8 = 1;

fn push_component(key: &mut Vec<u8>, component: &str) {
    let bytes = component.as_bytes();
    key.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    key.extend_from_slice(bytes);
}

fn scope_key(scope: &Option<ServerId>) -> Vec<u8> {
    match scope {
        Some(server) => {
            let mut key = vec![SCOPE_SERVER];
            push_component(&mut key, server.as_str());
            key
        }
        None => vec![SCOPE_GLOBAL],
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.server_id {
            Some(server) => write!(f, "{}:{}", server, self.user_id),
            None => write!(f, "-:{}", self.user_id),
        }
    }
}

/// Persisted per-user economy state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account key
    pub key: AccountKey,

    /// Point balance, never negative once committed
    pub balance: i64,

    /// Withdrawals reserved in the current weekly window
    pub weekly_withdraw_amount: i64,

    /// Start of the current weekly window (0 = no active window)
    pub first_withdraw_at: i64,

    /// Last daily role payout (0 = never)
    pub last_daily_role_pay_at: i64,

    /// Chat messages seen since the last trivia prompt
    pub messages_since_last_trivia: u32,

    /// Earliest time a new trivia prompt may be asked
    pub next_trivia_available_at: i64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Fresh account with zero balance and no windows open
    pub fn new(key: AccountKey) -> Self {
        Self {
            key,
            balance: 0,
            weekly_withdraw_amount: 0,
            first_withdraw_at: 0,
            last_daily_role_pay_at: 0,
            messages_since_last_trivia: 0,
            next_trivia_available_at: 0,
            created_at: Utc::now(),
        }
    }
}

/// Weekly withdrawal totals for a whole deployment or server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalWithdrawState {
    /// Server scope (`None` = deployment-wide)
    pub scope: Option<ServerId>,

    /// Points withdrawn since `week_start_at`
    pub total_withdrawn_this_week: i64,

    /// Start of the current window (0 = no active window)
    pub week_start_at: i64,
}

impl GlobalWithdrawState {
    /// Empty state for a scope
    pub fn new(scope: Option<ServerId>) -> Self {
        Self {
            scope,
            total_withdrawn_this_week: 0,
            week_start_at: 0,
        }
    }

    /// Storage key bytes, same scope encoding as account keys
    pub fn storage_key(scope: &Option<ServerId>) -> Vec<u8> {
        scope_key(scope)
    }
}

/// Why a balance moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryReason {
    /// Dice round result
    Dice,
    /// Slots round result
    Slots,
    /// Points sent to another account
    TransferOut {
        /// Receiving account
        counterparty: AccountKey,
        /// Transfer this leg belongs to
        transfer_id: Uuid,
    },
    /// Points received from another account
    TransferIn {
        /// Sending account
        counterparty: AccountKey,
        /// Transfer this leg belongs to
        transfer_id: Uuid,
    },
    /// Daily payout for held roles
    DailyRolePay,
    /// Winning claim on a point drop
    PointDrop {
        /// Claimed drop
        drop_id: Uuid,
    },
    /// Correct trivia answer
    Trivia {
        /// Answered question
        question_id: Uuid,
    },
    /// Manual operator adjustment
    Adjustment,
}

impl EntryReason {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            EntryReason::Dice => "dice",
            EntryReason::Slots => "slots",
            EntryReason::TransferOut { .. } => "transfer_out",
            EntryReason::TransferIn { .. } => "transfer_in",
            EntryReason::DailyRolePay => "daily_role_pay",
            EntryReason::PointDrop { .. } => "point_drop",
            EntryReason::Trivia { .. } => "trivia",
            EntryReason::Adjustment => "adjustment",
        }
    }
}

/// Audit journal row, written atomically with the balance change it records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry ID (UUIDv7 for time-ordering)
    pub entry_id: Uuid,

    /// Account whose balance moved
    pub account: AccountKey,

    /// Signed change applied
    pub delta: i64,

    /// Balance after the change
    pub balance_after: i64,

    /// Cause of the change
    pub reason: EntryReason,

    /// Entry timestamp (nanoseconds since Unix epoch)
    pub timestamp_nanos: i64,
}

impl LedgerEntry {
    /// Journal row for a committed change
    pub fn record(account: &Account, delta: i64, reason: EntryReason) -> Self {
        Self {
            entry_id: Uuid::now_v7(),
            account: account.key.clone(),
            delta,
            balance_after: account.balance,
            reason,
            timestamp_nanos: Utc::now().timestamp_nanos_opt().unwrap_or(0),
        }
    }

    /// Journal index key: `<account storage key><entry id>`
    pub fn index_key(&self) -> Vec<u8> {
        let mut key = self.account.storage_key();
        key.extend_from_slice(self.entry_id.as_bytes());
        key
    }
}

/// How a transfer was committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferPath {
    /// Both legs in one multi-account operation
    Atomic,
    /// Conditional debit followed by credit
    TwoStep,
}

/// Result of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Transfer identifier shared by both journal legs
    pub transfer_id: Uuid,
    /// Sender after the debit
    pub sender: Account,
    /// Receiver after the credit
    pub receiver: Account,
    /// Points moved
    pub amount: i64,
    /// Commit path taken
    pub path: TransferPath,
}
