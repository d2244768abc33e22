//! Engine wiring
//!
//! Builds the store, ledger and every engine on top of it from one
//! [`NodeConfig`]. Command handlers and chat listeners talk to [`Economy`];
//! nothing here renders messages.

use crate::config::NodeConfig;
use anyhow::{Context, Result};
use awards::{DailyRolePay, PointDrops, StaticQuestions, Trivia, TriviaPrompt};
use casino_games::GameTable;
use points_ledger::config::StoreBackend;
use points_ledger::{
    spawn_store_actor, AccountKey, BalanceChanged, BalanceLedger, ChannelNotifier, Clock,
    MemoryStore, Metrics, ProfileStore, Storage, StoreHandle, SystemClock, TransferEngine,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use withdraw_limits::WithdrawalLimiter;

/// Every engine, sharing one store, ledger and clock
pub struct Economy {
    /// Balance ledger
    pub ledger: BalanceLedger,
    /// Point transfers
    pub transfers: TransferEngine,
    /// Weekly withdrawal quotas
    pub limiter: WithdrawalLimiter,
    /// Dice and slots
    pub games: GameTable,
    /// Daily role pay
    pub daily: DailyRolePay,
    /// Point drops
    pub drops: PointDrops,
    /// Chat trivia
    pub trivia: Trivia,
    clock: Arc<dyn Clock>,
    store_handle: Option<StoreHandle>,
}

impl std::fmt::Debug for Economy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Economy")
            .field("rocksdb", &self.store_handle.is_some())
            .finish_non_exhaustive()
    }
}

impl Economy {
    /// Open the configured store and build the engines on it.
    ///
    /// Returns the receiving end of the balance-change notifications.
    pub fn open(
        config: &NodeConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<BalanceChanged>)> {
        let (store, store_handle): (Arc<dyn ProfileStore>, Option<StoreHandle>) =
            match config.ledger.store.backend {
                StoreBackend::Memory => {
                    let store = if config.ledger.store.transactions_enabled {
                        MemoryStore::new()
                    } else {
                        MemoryStore::without_transactions()
                    };
                    (Arc::new(store), None)
                }
                StoreBackend::Rocksdb => {
                    let storage = Storage::open(&config.ledger).with_context(|| {
                        format!("Failed to open store at {}", config.ledger.data_dir.display())
                    })?;
                    let handle = spawn_store_actor(storage, config.ledger.store.mailbox_capacity);
                    (Arc::new(handle.clone()), Some(handle))
                }
            };

        let metrics = Metrics::new().context("Failed to register metrics")?;
        let (notifier, notifications) = ChannelNotifier::new();
        let ledger = BalanceLedger::new(store.clone())
            .with_observer(Arc::new(notifier))
            .with_metrics(metrics);

        let questions = StaticQuestions::new(config.questions.clone())?;
        let economy = Self {
            transfers: TransferEngine::new(ledger.clone()),
            limiter: WithdrawalLimiter::new(store, clock.clone(), config.limits.clone()),
            games: GameTable::new(ledger.clone(), config.games.clone())?,
            daily: DailyRolePay::new(ledger.clone(), clock.clone(), &config.awards.daily),
            drops: PointDrops::new(ledger.clone(), clock.clone(), config.awards.drops.clone()),
            trivia: Trivia::new(
                ledger.clone(),
                clock.clone(),
                config.awards.trivia.clone(),
                Arc::new(questions),
            ),
            ledger,
            clock,
            store_handle,
        };

        tracing::info!(
            backend = ?config.ledger.store.backend,
            drop_channels = config.awards.drops.channels.len(),
            "Economy opened"
        );
        Ok((economy, notifications))
    }

    /// Open with the wall clock
    pub fn open_default(
        config: &NodeConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<BalanceChanged>)> {
        Self::open(config, Arc::new(SystemClock))
    }

    /// Count a chat message; asks a trivia question when one is due and
    /// schedules its expiry
    pub async fn on_chat_message(&self, key: &AccountKey) -> Result<Option<TriviaPrompt>> {
        let prompt = self.trivia.on_message(key).await?;
        if let Some(prompt) = &prompt {
            let trivia = self.trivia.clone();
            let key = key.clone();
            let question_id = prompt.question_id;
            let window = Duration::from_secs(
                u64::try_from(prompt.expires_at - self.clock.now()).unwrap_or(0),
            );
            tokio::spawn(async move {
                tokio::time::sleep(window).await;
                trivia.expire(&key, question_id);
            });
        }
        Ok(prompt)
    }

    /// Stop the store actor, if any
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(handle) = &self.store_handle {
            handle.shutdown().await.context("Store actor shutdown failed")?;
        }
        Ok(())
    }
}
