//! Profile store contract
//!
//! The ledger, limiter and awarders only ever talk to persistence through
//! this trait. Implementations must make each call a single atomic step:
//! the precondition of an [`AccountUpdate`] is evaluated against the state
//! the write is applied to, never against an earlier read.

use crate::error::StoreError;
use crate::types::{Account, AccountKey, GlobalWithdrawState, LedgerEntry, ServerId};
use crate::update::{AccountUpdate, GlobalUpdate};
use async_trait::async_trait;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Key-value persistence for accounts and withdrawal windows
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Look up an account
    async fn find_one(&self, key: &AccountKey) -> StoreResult<Option<Account>>;

    /// Create an account with a zero balance, or return the existing one
    async fn create(&self, key: &AccountKey) -> StoreResult<Account>;

    /// Apply a conditioned update atomically.
    ///
    /// Returns `None` when the precondition failed, or when the account is
    /// absent and `upsert` is false.
    async fn find_one_and_update(
        &self,
        key: &AccountKey,
        update: AccountUpdate,
        upsert: bool,
    ) -> StoreResult<Option<Account>>;

    /// Apply several conditioned updates as one unit: all land or none do.
    ///
    /// Absent accounts are created for credits and fail the transaction for
    /// anything else. Returns `None` if any precondition failed, and
    /// `Err(StoreError::TransactionsUnsupported)` when the backend cannot
    /// provide multi-account atomicity.
    async fn transact(
        &self,
        ops: Vec<(AccountKey, AccountUpdate)>,
    ) -> StoreResult<Option<Vec<Account>>>;

    /// Current global withdrawal state for a scope
    async fn find_global(&self, scope: &Option<ServerId>) -> StoreResult<GlobalWithdrawState>;

    /// Apply a conditioned update to the global withdrawal state
    async fn update_global(
        &self,
        scope: &Option<ServerId>,
        update: GlobalUpdate,
    ) -> StoreResult<Option<GlobalWithdrawState>>;

    /// Journal rows for an account, oldest first
    async fn journal(&self, key: &AccountKey) -> StoreResult<Vec<LedgerEntry>>;
}
