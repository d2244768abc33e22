//! Point drops
//!
//! A drop opens in a channel and the first account to send the claim phrase
//! inside the window takes it. The drop is removed from the registry by the
//! winning claim or by its expiry timer, whichever comes first; the other one
//! finds nothing and does nothing.

use crate::{ActiveRegistry, DropConfig, Error, Result};
use points_ledger::{AccountKey, BalanceLedger, Clock, EntryReason};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// An open drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveDrop {
    /// Drop identifier
    pub drop_id: Uuid,
    /// Channel the drop was announced in
    pub channel: String,
    /// Points for the winner
    pub amount: i64,
    /// When the drop opened (epoch seconds)
    pub opened_at: i64,
    /// When the drop stops being claimable (epoch seconds)
    pub expires_at: i64,
}

/// Outcome of a claim attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropClaim {
    /// This account took the drop
    Won {
        /// Drop taken
        drop_id: Uuid,
        /// Points credited
        amount: i64,
        /// Balance after the credit
        new_balance: i64,
    },
    /// Nothing claimable: wrong phrase, no drop, or someone else won
    Missed,
}

/// Point drop awarder
#[derive(Clone)]
pub struct PointDrops {
    ledger: BalanceLedger,
    clock: Arc<dyn Clock>,
    config: DropConfig,
    active: ActiveRegistry<String, ActiveDrop>,
}

impl std::fmt::Debug for PointDrops {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointDrops")
            .field("config", &self.config)
            .field("active", &self.active.len())
            .finish_non_exhaustive()
    }
}

impl PointDrops {
    /// Create awarder from config
    pub fn new(ledger: BalanceLedger, clock: Arc<dyn Clock>, config: DropConfig) -> Self {
        Self {
            ledger,
            clock,
            config,
            active: ActiveRegistry::new(),
        }
    }

    /// Drop settings
    pub fn config(&self) -> &DropConfig {
        &self.config
    }

    /// Open a drop in `channel`. `None` if one is already open there.
    pub fn open(&self, channel: &str) -> Option<ActiveDrop> {
        let now = self.clock.now();
        let drop = ActiveDrop {
            drop_id: Uuid::now_v7(),
            channel: channel.to_string(),
            amount: self.config.amount,
            opened_at: now,
            expires_at: now + self.config.window_secs,
        };

        if !self.active.insert_if_absent(channel.to_string(), drop.clone()) {
            tracing::debug!(channel, "Drop already open, skipping");
            return None;
        }

        tracing::info!(
            channel,
            drop_id = %drop.drop_id,
            amount = drop.amount,
            expires_at = drop.expires_at,
            "Point drop opened"
        );
        Some(drop)
    }

    /// Try to claim the drop in `channel` with `message`
    pub async fn claim(&self, channel: &str, key: &AccountKey, message: &str) -> Result<DropClaim> {
        if !message.trim().eq_ignore_ascii_case(&self.config.claim_phrase) {
            return Ok(DropClaim::Missed);
        }

        let now = self.clock.now();
        let metrics = self.ledger.metrics();
        let Some(drop) = self
            .active
            .take_if(&channel.to_string(), |drop| now < drop.expires_at)
        else {
            metrics.record_claim(false);
            return Ok(DropClaim::Missed);
        };
        metrics.record_claim(true);

        let reason = EntryReason::PointDrop {
            drop_id: drop.drop_id,
        };
        match self.ledger.apply_delta(key, drop.amount, reason).await {
            Ok(outcome) => {
                tracing::info!(
                    channel,
                    account = %key,
                    drop_id = %drop.drop_id,
                    amount = drop.amount,
                    "Point drop claimed"
                );
                Ok(DropClaim::Won {
                    drop_id: drop.drop_id,
                    amount: drop.amount,
                    new_balance: outcome.new_balance,
                })
            }
            Err(e) => {
                tracing::error!(
                    target: "reconciliation",
                    channel,
                    account = %key,
                    drop_id = %drop.drop_id,
                    amount = drop.amount,
                    error = %e,
                    "Point drop claimed but credit failed"
                );
                Err(Error::Ledger(e))
            }
        }
    }

    /// Close drop `drop_id` if it is still open. Returns whether it was.
    pub fn expire(&self, channel: &str, drop_id: Uuid) -> bool {
        let expired = self
            .active
            .take_if(&channel.to_string(), |drop| drop.drop_id == drop_id)
            .is_some();
        if expired {
            tracing::info!(channel, %drop_id, "Point drop expired unclaimed");
        }
        expired
    }

    /// Open drop in `channel`, if any
    pub fn active(&self, channel: &str) -> Option<ActiveDrop> {
        self.active.get(&channel.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use points_ledger::{ManualClock, MemoryStore};

    fn create_test_drops(clock: Arc<ManualClock>) -> PointDrops {
        let ledger = BalanceLedger::new(Arc::new(MemoryStore::new()));
        PointDrops::new(
            ledger,
            clock,
            DropConfig {
                amount: 100,
                window_secs: 60,
                ..DropConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_first_claim_wins() {
        let drops = create_test_drops(Arc::new(ManualClock::new(1_000)));
        let alice = AccountKey::scoped("guild", "alice");
        let bob = AccountKey::scoped("guild", "bob");
        let drop = drops.open("general").unwrap();

        let won = drops.claim("general", &alice, " CLAIM ").await.unwrap();
        assert_eq!(
            won,
            DropClaim::Won {
                drop_id: drop.drop_id,
                amount: 100,
                new_balance: 100
            }
        );
        assert_eq!(drops.claim("general", &bob, "claim").await.unwrap(), DropClaim::Missed);
        assert!(!drops.expire("general", drop.drop_id));
    }

    #[tokio::test]
    async fn test_wrong_phrase_leaves_drop_open() {
        let drops = create_test_drops(Arc::new(ManualClock::new(1_000)));
        let alice = AccountKey::scoped("guild", "alice");
        drops.open("general").unwrap();

        assert_eq!(drops.claim("general", &alice, "hello").await.unwrap(), DropClaim::Missed);
        assert!(drops.active("general").is_some());
    }

    #[tokio::test]
    async fn test_claim_after_window_misses() {
        let clock = Arc::new(ManualClock::new(1_000));
        let drops = create_test_drops(clock.clone());
        let alice = AccountKey::scoped("guild", "alice");
        let drop = drops.open("general").unwrap();

        clock.advance(60);
        assert_eq!(drops.claim("general", &alice, "claim").await.unwrap(), DropClaim::Missed);
        assert!(drops.expire("general", drop.drop_id));
        assert_eq!(drops.ledger.balance(&alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_one_open_drop_per_channel() {
        let drops = create_test_drops(Arc::new(ManualClock::new(1_000)));
        let first = drops.open("general").unwrap();
        assert!(drops.open("general").is_none());
        assert!(drops.open("random").is_some());

        // A stale expiry timer for an older drop leaves the current one alone
        assert!(!drops.expire("general", Uuid::now_v7()));
        assert_eq!(drops.active("general"), Some(first));
    }
}
