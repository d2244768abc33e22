//! Timers and background drains
//!
//! Each task runs until the shutdown signal flips. Expiry timers are fire-once
//! and resolve through the awarder, so a timer firing after its event was
//! claimed is a no-op.

use awards::{ActiveDrop, PointDrops};
use points_ledger::BalanceChanged;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Open a drop in every configured channel on each tick
pub fn spawn_drop_scheduler(
    drops: PointDrops,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let config = drops.config().clone();
        if config.channels.is_empty() {
            tracing::info!("No drop channels configured, drop scheduler idle");
            return;
        }

        let period = Duration::from_secs(config.interval_secs);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for channel in &config.channels {
                        if let Some(opened) = drops.open(channel) {
                            spawn_drop_expiry(drops.clone(), opened);
                        }
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("Drop scheduler stopping");
                    break;
                }
            }
        }
    })
}

fn spawn_drop_expiry(drops: PointDrops, opened: ActiveDrop) {
    let window_secs = u64::try_from(opened.expires_at - opened.opened_at).unwrap_or(0);
    let window = Duration::from_secs(window_secs);
    tokio::spawn(async move {
        tokio::time::sleep(window).await;
        drops.expire(&opened.channel, opened.drop_id);
    });
}

/// Log every balance change until the ledger side hangs up or shutdown flips
pub fn spawn_notification_drain(
    mut notifications: mpsc::UnboundedReceiver<BalanceChanged>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = notifications.recv() => match event {
                    Some(event) => {
                        tracing::info!(
                            target: "balance",
                            account = %event.account.key,
                            delta = event.delta,
                            balance = event.account.balance,
                            "Balance changed"
                        );
                    }
                    None => break,
                },
                _ = shutdown.changed() => break,
            }
        }
        tracing::debug!("Notification drain stopped");
    })
}
