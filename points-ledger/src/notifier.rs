//! Balance-change notifications
//!
//! The ledger tells an observer about every committed change. Observers are
//! fire-and-forget: an error is logged by the ledger and the mutation stands.
//! [`ChannelNotifier`] turns notifications into an event stream that a
//! presentation layer drains on its own schedule.

use crate::types::Account;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Emitted after a committed balance change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChanged {
    /// Account state after the change
    pub account: Account,
    /// Signed change applied
    pub delta: i64,
}

/// Delivery failure
#[derive(Debug, Error)]
#[error("Notification dropped: {0}")]
pub struct NotifyError(pub String);

/// Receives balance-change notifications
pub trait BalanceObserver: Send + Sync {
    /// Called once per committed change; must not block
    fn balance_changed(&self, event: BalanceChanged) -> Result<(), NotifyError>;
}

/// Observer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl BalanceObserver for NoopNotifier {
    fn balance_changed(&self, _event: BalanceChanged) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Observer that forwards into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<BalanceChanged>,
}

impl ChannelNotifier {
    /// Notifier plus the receiving end to drain
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BalanceChanged>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl BalanceObserver for ChannelNotifier {
    fn balance_changed(&self, event: BalanceChanged) -> Result<(), NotifyError> {
        self.sender
            .send(event)
            .map_err(|e| NotifyError(format!("receiver gone for {}", e.0.account.key)))
    }
}
