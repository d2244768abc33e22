//! Single-writer actor in front of the RocksDB store
//!
//! RocksDB gives atomic batches but no compare-and-swap, so a conditioned
//! update is a read, a check and a batch write. Routing every call through
//! one task makes that sequence atomic: no other write can land between the
//! read and the batch.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │      Commands / timers / chat listeners (many)       │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               StoreHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              StoreActor (Single Task)                │
//! │        read → AccountUpdate::apply → WriteBatch      │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::error::StoreError;
use crate::storage::Storage;
use crate::store::{ProfileStore, StoreResult};
use crate::types::{Account, AccountKey, GlobalWithdrawState, LedgerEntry, ServerId};
use crate::update::{AccountUpdate, GlobalUpdate};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the store actor
#[derive(Debug)]
pub enum StoreMessage {
    /// Look up an account
    FindOne {
        /// Account key
        key: AccountKey,
        /// Reply channel
        response: oneshot::Sender<StoreResult<Option<Account>>>,
    },

    /// Create an account if absent
    Create {
        /// Account key
        key: AccountKey,
        /// Reply channel
        response: oneshot::Sender<StoreResult<Account>>,
    },

    /// Conditioned single-account update
    Update {
        /// Account key
        key: AccountKey,
        /// Update to apply
        update: AccountUpdate,
        /// Create the account when absent
        upsert: bool,
        /// Reply channel
        response: oneshot::Sender<StoreResult<Option<Account>>>,
    },

    /// Conditioned multi-account update
    Transact {
        /// Updates, applied in order
        ops: Vec<(AccountKey, AccountUpdate)>,
        /// Reply channel
        response: oneshot::Sender<StoreResult<Option<Vec<Account>>>>,
    },

    /// Read a global withdrawal window
    FindGlobal {
        /// Scope
        scope: Option<ServerId>,
        /// Reply channel
        response: oneshot::Sender<StoreResult<GlobalWithdrawState>>,
    },

    /// Conditioned global window update
    UpdateGlobal {
        /// Scope
        scope: Option<ServerId>,
        /// Update to apply
        update: GlobalUpdate,
        /// Reply channel
        response: oneshot::Sender<StoreResult<Option<GlobalWithdrawState>>>,
    },

    /// Read an account's journal
    Journal {
        /// Account key
        key: AccountKey,
        /// Reply channel
        response: oneshot::Sender<StoreResult<Vec<LedgerEntry>>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns the RocksDB handle
#[derive(Debug)]
pub struct StoreActor {
    /// Storage backend
    storage: Storage,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<StoreMessage>,
}

impl StoreActor {
    /// Create new actor
    pub fn new(storage: Storage, mailbox: mpsc::Receiver<StoreMessage>) -> Self {
        Self { storage, mailbox }
    }

    /// Run the actor event loop until shutdown or every handle is dropped
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let StoreMessage::Shutdown = msg {
                tracing::info!("Store actor shutting down");
                break;
            }
            self.handle_message(msg);
        }
    }

    /// Handle a single message. A dropped reply channel means the caller
    /// went away; the write already happened, so there is nothing to undo.
    fn handle_message(&mut self, msg: StoreMessage) {
        match msg {
            StoreMessage::FindOne { key, response } => {
                let _ = response.send(self.storage.get_account(&key));
            }

            StoreMessage::Create { key, response } => {
                let _ = response.send(self.storage.create_account(&key));
            }

            StoreMessage::Update {
                key,
                update,
                upsert,
                response,
            } => {
                let result = self.storage.apply_update(&key, &update, upsert);
                if let Err(e) = &result {
                    tracing::error!(account = %key, error = %e, "Store update failed");
                }
                let _ = response.send(result);
            }

            StoreMessage::Transact { ops, response } => {
                let result = self.storage.apply_transaction(&ops);
                if let Err(e) = &result {
                    tracing::error!(legs = ops.len(), error = %e, "Store transaction failed");
                }
                let _ = response.send(result);
            }

            StoreMessage::FindGlobal { scope, response } => {
                let _ = response.send(self.storage.get_global(&scope));
            }

            StoreMessage::UpdateGlobal {
                scope,
                update,
                response,
            } => {
                let _ = response.send(self.storage.apply_global(&scope, &update));
            }

            StoreMessage::Journal { key, response } => {
                let _ = response.send(self.storage.journal(&key));
            }

            StoreMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct StoreHandle {
    sender: mpsc::Sender<StoreMessage>,
}

impl StoreHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<StoreMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<StoreResult<T>>) -> StoreMessage,
    ) -> StoreResult<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| StoreError::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| StoreError::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> StoreResult<()> {
        self.sender
            .send(StoreMessage::Shutdown)
            .await
            .map_err(|_| StoreError::Concurrency("Actor mailbox closed".to_string()))
    }
}

#[async_trait]
impl ProfileStore for StoreHandle {
    async fn find_one(&self, key: &AccountKey) -> StoreResult<Option<Account>> {
        let key = key.clone();
        self.request(|response| StoreMessage::FindOne { key, response })
            .await
    }

    async fn create(&self, key: &AccountKey) -> StoreResult<Account> {
        let key = key.clone();
        self.request(|response| StoreMessage::Create { key, response })
            .await
    }

    async fn find_one_and_update(
        &self,
        key: &AccountKey,
        update: AccountUpdate,
        upsert: bool,
    ) -> StoreResult<Option<Account>> {
        let key = key.clone();
        self.request(|response| StoreMessage::Update {
            key,
            update,
            upsert,
            response,
        })
        .await
    }

    async fn transact(
        &self,
        ops: Vec<(AccountKey, AccountUpdate)>,
    ) -> StoreResult<Option<Vec<Account>>> {
        self.request(|response| StoreMessage::Transact { ops, response })
            .await
    }

    async fn find_global(&self, scope: &Option<ServerId>) -> StoreResult<GlobalWithdrawState> {
        let scope = scope.clone();
        self.request(|response| StoreMessage::FindGlobal { scope, response })
            .await
    }

    async fn update_global(
        &self,
        scope: &Option<ServerId>,
        update: GlobalUpdate,
    ) -> StoreResult<Option<GlobalWithdrawState>> {
        let scope = scope.clone();
        self.request(|response| StoreMessage::UpdateGlobal {
            scope,
            update,
            response,
        })
        .await
    }

    async fn journal(&self, key: &AccountKey) -> StoreResult<Vec<LedgerEntry>> {
        let key = key.clone();
        self.request(|response| StoreMessage::Journal { key, response })
            .await
    }
}

/// Spawn the store actor
pub fn spawn_store_actor(storage: Storage, mailbox_capacity: usize) -> StoreHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = StoreActor::new(storage, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    StoreHandle::new(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryReason;
    use crate::Config;
    use std::sync::Arc;

    fn open_handle() -> (tempfile::TempDir, StoreHandle) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        config.rocksdb.sync_writes = false;

        let storage = Storage::open(&config).unwrap();
        (temp_dir, spawn_store_actor(storage, 64))
    }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let (_dir, handle) = open_handle();
        handle.shutdown().await.unwrap();

        // Give the actor a moment to exit, then the mailbox is closed
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let result = handle.find_one(&AccountKey::global("x")).await;
        assert!(matches!(result, Err(StoreError::Concurrency(_))));
    }

    #[tokio::test]
    async fn test_actor_update_roundtrip() {
        let (_dir, handle) = open_handle();
        let key = AccountKey::global("alice");

        let account = handle
            .find_one_and_update(
                &key,
                AccountUpdate::AdjustBalance {
                    delta: 25,
                    reason: EntryReason::Adjustment,
                },
                true,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.balance, 25);

        let found = handle.find_one(&key).await.unwrap().unwrap();
        assert_eq!(found.balance, 25);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_debits_serialized() {
        let (_dir, handle) = open_handle();
        let key = AccountKey::global("alice");
        handle
            .find_one_and_update(
                &key,
                AccountUpdate::AdjustBalance {
                    delta: 100,
                    reason: EntryReason::Adjustment,
                },
                true,
            )
            .await
            .unwrap();

        let handle = Arc::new(handle);
        let mut tasks = Vec::new();
        for _ in 0..10 {
            let handle = handle.clone();
            let key = key.clone();
            tasks.push(tokio::spawn(async move {
                handle
                    .find_one_and_update(
                        &key,
                        AccountUpdate::AdjustBalance {
                            delta: -30,
                            reason: EntryReason::Adjustment,
                        },
                        false,
                    )
                    .await
                    .unwrap()
                    .is_some()
            }));
        }

        let mut wins = 0;
        for task in tasks {
            if task.await.unwrap() {
                wins += 1;
            }
        }

        assert_eq!(wins, 3);
        assert_eq!(handle.find_one(&key).await.unwrap().unwrap().balance, 10);
    }
}
