//! Balance ledger
//!
//! The one primitive every point movement goes through. A debit is a single
//! conditioned update (`balance + delta >= 0` checked where the write lands),
//! so two concurrent debits can never both pass against a stale balance.
//!
//! # Example
//!
//! ```no_run
//! use points_ledger::{AccountKey, BalanceLedger, EntryReason, MemoryStore};
//! use std::sync::Arc;
//!
//! # async fn run() -> points_ledger::Result<()> {
//! let ledger = BalanceLedger::new(Arc::new(MemoryStore::new()));
//! let alice = AccountKey::global("alice");
//!
//! ledger.apply_delta(&alice, 100, EntryReason::Adjustment).await?;
//! let outcome = ledger.apply_delta(&alice, -30, EntryReason::Dice).await?;
//! assert_eq!(outcome.new_balance, 70);
//! # Ok(())
//! # }
//! ```

use crate::{
    notifier::{BalanceChanged, BalanceObserver, NoopNotifier},
    store::ProfileStore,
    types::{Account, AccountKey, EntryReason, LedgerEntry},
    update::AccountUpdate,
    Error, Metrics, Result,
};
use std::sync::Arc;
use std::time::Instant;

/// Result of a committed balance change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaOutcome {
    /// Authoritative balance after the change
    pub new_balance: i64,
    /// Full account state after the change
    pub account: Account,
}

/// Atomic balance mutation over a [`ProfileStore`]
#[derive(Clone)]
pub struct BalanceLedger {
    store: Arc<dyn ProfileStore>,
    observer: Arc<dyn BalanceObserver>,
    metrics: Metrics,
}

impl std::fmt::Debug for BalanceLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceLedger").finish_non_exhaustive()
    }
}

impl BalanceLedger {
    /// Ledger over `store` with no observer
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            observer: Arc::new(NoopNotifier),
            metrics: Metrics::default(),
        }
    }

    /// Set balance-change observer
    pub fn with_observer(mut self, observer: Arc<dyn BalanceObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Set metrics collector
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Apply a signed change to an account's balance.
    ///
    /// Credits create the account if needed. Debits succeed only if the
    /// balance at write time covers them; otherwise `InsufficientFunds`.
    /// A credit that would overflow the balance is `InvalidAmount`.
    pub async fn apply_delta(
        &self,
        key: &AccountKey,
        delta: i64,
        reason: EntryReason,
    ) -> Result<DeltaOutcome> {
        if delta == 0 {
            let account = self.account(key).await?;
            return Ok(DeltaOutcome {
                new_balance: account.balance,
                account,
            });
        }

        let started = Instant::now();
        let label = reason.label();
        let update = AccountUpdate::AdjustBalance { delta, reason };

        match self.store.find_one_and_update(key, update, delta > 0).await? {
            Some(account) => {
                self.metrics.record_delta(started.elapsed().as_secs_f64());
                tracing::debug!(
                    account = %key,
                    delta,
                    balance = account.balance,
                    reason = label,
                    "Balance updated"
                );
                self.notify(&account, delta);
                Ok(DeltaOutcome {
                    new_balance: account.balance,
                    account,
                })
            }
            // Credits upsert, so only an overflowing balance refuses them
            None if delta > 0 => {
                tracing::warn!(
                    account = %key,
                    delta,
                    reason = label,
                    "Credit would overflow balance"
                );
                Err(Error::InvalidAmount(format!(
                    "Credit of {} would overflow the balance of {}",
                    delta, key
                )))
            }
            None => {
                self.metrics.record_insufficient_funds();
                tracing::debug!(account = %key, delta, reason = label, "Debit refused");
                Err(Error::InsufficientFunds {
                    account: key.to_string(),
                    required: delta.unsigned_abs(),
                })
            }
        }
    }

    /// Account state, created on first read
    pub async fn account(&self, key: &AccountKey) -> Result<Account> {
        match self.store.find_one(key).await? {
            Some(account) => Ok(account),
            None => Ok(self.store.create(key).await?),
        }
    }

    /// Current balance
    pub async fn balance(&self, key: &AccountKey) -> Result<i64> {
        Ok(self.account(key).await?.balance)
    }

    /// Audit journal for an account
    pub async fn journal(&self, key: &AccountKey) -> Result<Vec<LedgerEntry>> {
        Ok(self.store.journal(key).await?)
    }

    /// Hand a committed change to the observer; failures are logged only
    pub fn notify(&self, account: &Account, delta: i64) {
        let event = BalanceChanged {
            account: account.clone(),
            delta,
        };
        if let Err(e) = self.observer.balance_changed(event) {
            tracing::warn!(account = %account.key, error = %e, "Balance notification failed");
        }
    }
}
