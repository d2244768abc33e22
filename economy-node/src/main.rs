//! Points economy node binary
//!
//! Opens the profile store, builds every engine on it and runs the timers:
//! scheduled point drops with their expiry, and the balance-change drain.

use anyhow::{Context, Result};
use economy_node::{metrics_server, scheduler, Economy, LogConfig, NodeConfig};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    let config = NodeConfig::load()?;
    init_tracing(&config.log);

    tracing::info!(
        service = %config.ledger.service_name,
        data_dir = %config.ledger.data_dir.display(),
        "Starting points economy node"
    );

    let (economy, notifications) = Economy::open_default(&config)?;
    let (stop, shutdown) = watch::channel(false);

    let drain = scheduler::spawn_notification_drain(notifications, shutdown.clone());
    let drops = scheduler::spawn_drop_scheduler(economy.drops.clone(), shutdown);

    let metrics_addr = config.ledger.metrics_listen_addr.trim();
    if metrics_addr.is_empty() {
        tokio::signal::ctrl_c().await?;
    } else {
        let registry = economy.ledger.metrics().registry.clone();
        let server = metrics_server::serve(metrics_addr, registry)
            .with_context(|| format!("Failed to bind metrics endpoint {}", metrics_addr))?;
        let server_handle = server.handle();
        tracing::info!(addr = metrics_addr, "Metrics endpoint listening");

        tokio::select! {
            result = server => result.context("Metrics endpoint failed")?,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                server_handle.stop(true).await;
            }
        }
    }

    tracing::info!("Shutting down points economy node");
    let _ = stop.send(true);
    let _ = tokio::join!(drops, drain);
    economy.shutdown().await?;

    Ok(())
}
