//! Points Ledger
//!
//! Atomic balance mutation for the chat economy: every command, timer, chat
//! message or button click that moves points ends up here.
//!
//! # Architecture
//!
//! - **Conditioned updates**: every check-then-mutate is one store operation
//! - **Single Writer**: the RocksDB store serializes mutations through one actor
//! - **Audit journal**: each balance change is written with its journal row
//! - **Fire-and-forget notifications**: observers never block or roll back a mutation
//!
//! # Invariants
//!
//! - Non-negative balances: no committed state has `balance < 0`
//! - Conservation on transfer: sender loses exactly what the receiver gains
//! - No raw store errors escape the ledger boundary

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod update;
pub mod store;
pub mod memory;
pub mod storage;
pub mod actor;
pub mod ledger;
pub mod transfer;
pub mod notifier;
pub mod clock;
pub mod error;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result, StoreError};
pub use types::{
    Account, AccountKey, EntryReason, GlobalWithdrawState, LedgerEntry, ServerId,
    TransferPath, TransferReceipt, UserId,
};
pub use update::{AccountUpdate, GlobalUpdate};
pub use store::ProfileStore;
pub use memory::MemoryStore;
pub use storage::Storage;
pub use actor::{spawn_store_actor, StoreHandle};
pub use ledger::{BalanceLedger, DeltaOutcome};
pub use transfer::TransferEngine;
pub use notifier::{BalanceChanged, BalanceObserver, ChannelNotifier, NoopNotifier};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use metrics::Metrics;
