//! Points economy node
//!
//! Wires the ledger, limiter, games and awarders into one [`Economy`] and
//! owns the background tasks that drive the timer-based awards.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod economy;
pub mod metrics_server;
pub mod scheduler;

pub use config::{LogConfig, NodeConfig};
pub use economy::Economy;
