//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `accounts` - Account documents (key: `<server>:<user>`)
//! - `globals` - Global withdrawal windows (key: `global:<server>`)
//! - `journal` - Audit rows (key: `<server>:<user>/<entry_id>`)
//!
//! Each mutating method reads, checks and writes one `WriteBatch`. That is
//! only atomic with respect to other writers when every call comes from the
//! same task, which is what [`crate::actor`] guarantees.

use crate::{
    error::StoreError,
    store::StoreResult,
    types::{Account, AccountKey, GlobalWithdrawState, LedgerEntry, ServerId},
    update::{AccountUpdate, GlobalUpdate},
    Config,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, WriteBatch, WriteOptions, DB};
use std::collections::HashMap;

/// Column family names
const CF_ACCOUNTS: &str = "accounts";
const CF_GLOBALS: &str = "globals";
const CF_JOURNAL: &str = "journal";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: DB,
    sync_writes: bool,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("path", &self.db.path())
            .finish()
    }
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> StoreResult<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Self::cf_options_lz4()),
            ColumnFamilyDescriptor::new(CF_GLOBALS, Self::cf_options_lz4()),
            ColumnFamilyDescriptor::new(CF_JOURNAL, Self::cf_options_journal()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB profile store");

        Ok(Self {
            db,
            sync_writes: config.rocksdb.sync_writes,
        })
    }

    // Column family options

    fn cf_options_lz4() -> Options {
        let mut opts = Options::default();
        // Hot documents, read on every command
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_journal() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_handle(&self, name: &str) -> StoreResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Storage(format!("Column family {} not found", name)))
    }

    fn write(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        self.db.write_opt(batch, &opts)?;
        Ok(())
    }

    // Account operations

    /// Get account by key
    pub fn get_account(&self, key: &AccountKey) -> StoreResult<Option<Account>> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        match self.db.get_cf(cf, key.storage_key())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Create account if absent
    pub fn create_account(&self, key: &AccountKey) -> StoreResult<Account> {
        if let Some(existing) = self.get_account(key)? {
            return Ok(existing);
        }

        let account = Account::new(key.clone());
        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf_handle(CF_ACCOUNTS)?,
            key.storage_key(),
            bincode::serialize(&account)?,
        );
        self.write(batch)?;

        tracing::debug!(account = %key, "Account created");
        Ok(account)
    }

    /// Apply a conditioned update (account + journal row in one batch)
    pub fn apply_update(
        &self,
        key: &AccountKey,
        update: &AccountUpdate,
        upsert: bool,
    ) -> StoreResult<Option<Account>> {
        let mut account = match self.get_account(key)? {
            Some(existing) => existing,
            None if upsert => Account::new(key.clone()),
            None => return Ok(None),
        };

        if !update.apply(&mut account) {
            return Ok(None);
        }

        let mut batch = WriteBatch::default();
        self.stage_account(&mut batch, &account, update)?;
        self.write(batch)?;

        Ok(Some(account))
    }

    /// Apply several conditioned updates in one batch, or none of them
    pub fn apply_transaction(
        &self,
        ops: &[(AccountKey, AccountUpdate)],
    ) -> StoreResult<Option<Vec<Account>>> {
        let mut working: HashMap<AccountKey, Account> = HashMap::new();
        let mut batch = WriteBatch::default();
        let mut order = Vec::with_capacity(ops.len());

        for (key, update) in ops {
            let mut account = match working.remove(key) {
                Some(account) => account,
                None => match self.get_account(key)? {
                    Some(existing) => existing,
                    None if update.is_credit() => Account::new(key.clone()),
                    None => return Ok(None),
                },
            };

            if !update.apply(&mut account) {
                return Ok(None);
            }
            if let Some(entry) = update.journal_entry(&account) {
                batch.put_cf(
                    self.cf_handle(CF_JOURNAL)?,
                    entry.index_key(),
                    bincode::serialize(&entry)?,
                );
            }
            working.insert(key.clone(), account);
            order.push(key.clone());
        }

        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        for account in working.values() {
            batch.put_cf(cf_accounts, account.key.storage_key(), bincode::serialize(account)?);
        }
        self.write(batch)?;

        Ok(Some(
            order
                .iter()
                .filter_map(|key| working.get(key).cloned())
                .collect(),
        ))
    }

    fn stage_account(
        &self,
        batch: &mut WriteBatch,
        account: &Account,
        update: &AccountUpdate,
    ) -> StoreResult<()> {
        batch.put_cf(
            self.cf_handle(CF_ACCOUNTS)?,
            account.key.storage_key(),
            bincode::serialize(account)?,
        );
        if let Some(entry) = update.journal_entry(account) {
            batch.put_cf(
                self.cf_handle(CF_JOURNAL)?,
                entry.index_key(),
                bincode::serialize(&entry)?,
            );
        }
        Ok(())
    }

    // Global withdrawal window operations

    /// Get global withdrawal state (empty if never written)
    pub fn get_global(&self, scope: &Option<ServerId>) -> StoreResult<GlobalWithdrawState> {
        let cf = self.cf_handle(CF_GLOBALS)?;
        match self.db.get_cf(cf, GlobalWithdrawState::storage_key(scope))? {
            Some(value) => Ok(bincode::deserialize(&value)?),
            None => Ok(GlobalWithdrawState::new(scope.clone())),
        }
    }

    /// Apply a conditioned update to the global window
    pub fn apply_global(
        &self,
        scope: &Option<ServerId>,
        update: &GlobalUpdate,
    ) -> StoreResult<Option<GlobalWithdrawState>> {
        let mut state = self.get_global(scope)?;
        if !update.apply(&mut state) {
            return Ok(None);
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf_handle(CF_GLOBALS)?,
            GlobalWithdrawState::storage_key(scope),
            bincode::serialize(&state)?,
        );
        self.write(batch)?;

        Ok(Some(state))
    }

    // Journal

    /// Journal rows for an account, oldest first (UUIDv7 keys sort by time)
    pub fn journal(&self, key: &AccountKey) -> StoreResult<Vec<LedgerEntry>> {
        let cf = self.cf_handle(CF_JOURNAL)?;
        let prefix = key.storage_key();

        let mut entries = Vec::new();
        for item in self.db.prefix_iterator_cf(cf, &prefix) {
            let (k, value) = item?;
            if !k.starts_with(&prefix) {
                break;
            }
            entries.push(bincode::deserialize(&value)?);
        }
        Ok(entries)
    }
}
