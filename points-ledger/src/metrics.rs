//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the economy.
//!
//! # Metrics
//!
//! - `economy_deltas_total` - Balance changes committed
//! - `economy_insufficient_funds_total` - Debits refused by the balance guard
//! - `economy_transfers_total` - Transfers committed, by path
//! - `economy_reconciliation_risks_total` - Two-step transfers stranded after the debit
//! - `economy_claims_total` - Award claims, by outcome
//! - `economy_apply_duration_seconds` - Histogram of ledger mutation latency

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Balance changes committed
    pub deltas_total: IntCounter,

    /// Debits refused for insufficient funds
    pub insufficient_funds: IntCounter,

    /// Transfers committed, labelled `path` = atomic | two_step
    pub transfers_total: IntCounterVec,

    /// Reconciliation-worthy partial transfers
    pub reconciliation_risks: IntCounter,

    /// Award claims, labelled `outcome` = won | lost
    pub claims_total: IntCounterVec,

    /// Mutation latency histogram
    pub apply_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let deltas_total = IntCounter::new("economy_deltas_total", "Balance changes committed")?;
        registry.register(Box::new(deltas_total.clone()))?;

        let insufficient_funds = IntCounter::new(
            "economy_insufficient_funds_total",
            "Debits refused by the balance guard",
        )?;
        registry.register(Box::new(insufficient_funds.clone()))?;

        let transfers_total = IntCounterVec::new(
            Opts::new("economy_transfers_total", "Transfers committed"),
            &["path"],
        )?;
        registry.register(Box::new(transfers_total.clone()))?;

        let reconciliation_risks = IntCounter::new(
            "economy_reconciliation_risks_total",
            "Two-step transfers stranded after the debit",
        )?;
        registry.register(Box::new(reconciliation_risks.clone()))?;

        let claims_total = IntCounterVec::new(
            Opts::new("economy_claims_total", "Award claims"),
            &["outcome"],
        )?;
        registry.register(Box::new(claims_total.clone()))?;

        let apply_duration = Histogram::with_opts(
            HistogramOpts::new(
                "economy_apply_duration_seconds",
                "Histogram of ledger mutation latency",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250]),
        )?;
        registry.register(Box::new(apply_duration.clone()))?;

        Ok(Self {
            deltas_total,
            insufficient_funds,
            transfers_total,
            reconciliation_risks,
            claims_total,
            apply_duration,
            registry,
        })
    }

    /// Record a committed balance change
    pub fn record_delta(&self, duration_seconds: f64) {
        self.deltas_total.inc();
        self.apply_duration.observe(duration_seconds);
    }

    /// Record a refused debit
    pub fn record_insufficient_funds(&self) {
        self.insufficient_funds.inc();
    }

    /// Record a committed transfer
    pub fn record_transfer(&self, path: &str) {
        self.transfers_total.with_label_values(&[path]).inc();
    }

    /// Record a stranded two-step transfer
    pub fn record_reconciliation_risk(&self) {
        self.reconciliation_risks.inc();
    }

    /// Record an award claim attempt
    pub fn record_claim(&self, won: bool) {
        let outcome = if won { "won" } else { "lost" };
        self.claims_total.with_label_values(&[outcome]).inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.deltas_total.get(), 0);
        assert_eq!(metrics.reconciliation_risks.get(), 0);
    }

    #[test]
    fn test_instances_do_not_share_registry() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_delta(0.001);
        assert_eq!(a.deltas_total.get(), 1);
        assert_eq!(b.deltas_total.get(), 0);
    }

    #[test]
    fn test_labelled_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transfer("atomic");
        metrics.record_transfer("two_step");
        metrics.record_transfer("atomic");
        metrics.record_claim(true);
        metrics.record_claim(false);

        assert_eq!(metrics.transfers_total.with_label_values(&["atomic"]).get(), 2);
        assert_eq!(metrics.transfers_total.with_label_values(&["two_step"]).get(), 1);
        assert_eq!(metrics.claims_total.with_label_values(&["lost"]).get(), 1);
    }
}
