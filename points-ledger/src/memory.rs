//! In-memory profile store
//!
//! One mutex guards all state, so every call is trivially atomic. Used by
//! tests and by single-process deployments that do not need durability.
//! Multi-account transactions can be switched off to behave like a document
//! store without multi-document transactions.

use crate::error::StoreError;
use crate::store::{ProfileStore, StoreResult};
use crate::types::{Account, AccountKey, GlobalWithdrawState, LedgerEntry, ServerId};
use crate::update::{AccountUpdate, GlobalUpdate};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<AccountKey, Account>,
    globals: HashMap<Option<ServerId>, GlobalWithdrawState>,
    journal: Vec<LedgerEntry>,
}

/// Mutex-guarded in-memory store
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    transactions_enabled: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Store with multi-account transactions enabled
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            transactions_enabled: true,
        }
    }

    /// Store that refuses multi-account transactions
    pub fn without_transactions() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            transactions_enabled: false,
        }
    }

    /// Number of accounts held
    pub fn account_count(&self) -> usize {
        self.inner.lock().accounts.len()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_one(&self, key: &AccountKey) -> StoreResult<Option<Account>> {
        Ok(self.inner.lock().accounts.get(key).cloned())
    }

    async fn create(&self, key: &AccountKey) -> StoreResult<Account> {
        let mut inner = self.inner.lock();
        let account = inner
            .accounts
            .entry(key.clone())
            .or_insert_with(|| Account::new(key.clone()));
        Ok(account.clone())
    }

    async fn find_one_and_update(
        &self,
        key: &AccountKey,
        update: AccountUpdate,
        upsert: bool,
    ) -> StoreResult<Option<Account>> {
        let mut inner = self.inner.lock();

        let mut account = match inner.accounts.get(key) {
            Some(existing) => existing.clone(),
            None if upsert => Account::new(key.clone()),
            None => return Ok(None),
        };

        if !update.apply(&mut account) {
            return Ok(None);
        }

        if let Some(entry) = update.journal_entry(&account) {
            inner.journal.push(entry);
        }
        inner.accounts.insert(key.clone(), account.clone());
        Ok(Some(account))
    }

    async fn transact(
        &self,
        ops: Vec<(AccountKey, AccountUpdate)>,
    ) -> StoreResult<Option<Vec<Account>>> {
        if !self.transactions_enabled {
            return Err(StoreError::TransactionsUnsupported);
        }

        let mut inner = self.inner.lock();
        let mut working: HashMap<AccountKey, Account> = HashMap::new();
        let mut entries = Vec::with_capacity(ops.len());
        let mut order = Vec::with_capacity(ops.len());

        for (key, update) in &ops {
            let account = match working.entry(key.clone()) {
                Entry::Occupied(slot) => slot.into_mut(),
                Entry::Vacant(slot) => {
                    let base = match inner.accounts.get(key) {
                        Some(existing) => existing.clone(),
                        None if update.is_credit() => Account::new(key.clone()),
                        None => return Ok(None),
                    };
                    slot.insert(base)
                }
            };

            if !update.apply(account) {
                return Ok(None);
            }
            if let Some(entry) = update.journal_entry(account) {
                entries.push(entry);
            }
            order.push(key.clone());
        }

        let results = order
            .iter()
            .filter_map(|key| working.get(key).cloned())
            .collect();
        inner.accounts.extend(working);
        inner.journal.extend(entries);
        Ok(Some(results))
    }

    async fn find_global(&self, scope: &Option<ServerId>) -> StoreResult<GlobalWithdrawState> {
        Ok(self
            .inner
            .lock()
            .globals
            .get(scope)
            .cloned()
            .unwrap_or_else(|| GlobalWithdrawState::new(scope.clone())))
    }

    async fn update_global(
        &self,
        scope: &Option<ServerId>,
        update: GlobalUpdate,
    ) -> StoreResult<Option<GlobalWithdrawState>> {
        let mut inner = self.inner.lock();
        let mut state = inner
            .globals
            .get(scope)
            .cloned()
            .unwrap_or_else(|| GlobalWithdrawState::new(scope.clone()));

        if !update.apply(&mut state) {
            return Ok(None);
        }
        inner.globals.insert(scope.clone(), state.clone());
        Ok(Some(state))
    }

    async fn journal(&self, key: &AccountKey) -> StoreResult<Vec<LedgerEntry>> {
        Ok(self
            .inner
            .lock()
            .journal
            .iter()
            .filter(|entry| &entry.account == key)
            .cloned()
            .collect())
    }
}
