//! Prometheus metrics for the Strata node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`]; the daemon encodes it in
//! the Prometheus text exposition format when metrics are enabled.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Transactions that arrived from clients or peers.
    pub transactions_received: IntCounter,
    /// Transactions refused at intake.
    pub transactions_rejected: IntCounter,
    /// Transactions executed successfully.
    pub transactions_executed: IntCounter,
    /// Transactions executed with a recorded failure.
    pub transactions_failed: IntCounter,
    pub blocks_finalized: IntCounter,
    /// Blocks discarded after a signing or commit failure.
    pub blocks_abandoned: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub queue_depth: IntGauge,
    pub chain_height: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time spent executing one transaction, in milliseconds.
    pub execution_time_ms: Histogram,
    /// Age of a transaction's HLC timestamp when it was selected, in milliseconds.
    pub dwell_time_ms: Histogram,
}

impl NodeMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let transactions_received = register_int_counter_with_registry!(
            Opts::new(
                "strata_transactions_received_total",
                "Transactions received from clients or peers"
            ),
            registry
        )
        .expect("failed to register transactions_received counter");

        let transactions_rejected = register_int_counter_with_registry!(
            Opts::new(
                "strata_transactions_rejected_total",
                "Transactions rejected at intake"
            ),
            registry
        )
        .expect("failed to register transactions_rejected counter");

        let transactions_executed = register_int_counter_with_registry!(
            Opts::new(
                "strata_transactions_executed_total",
                "Transactions executed successfully"
            ),
            registry
        )
        .expect("failed to register transactions_executed counter");

        let transactions_failed = register_int_counter_with_registry!(
            Opts::new(
                "strata_transactions_failed_total",
                "Transactions executed with a recorded failure"
            ),
            registry
        )
        .expect("failed to register transactions_failed counter");

        let blocks_finalized = register_int_counter_with_registry!(
            Opts::new("strata_blocks_finalized_total", "Blocks committed by this node"),
            registry
        )
        .expect("failed to register blocks_finalized counter");

        let blocks_abandoned = register_int_counter_with_registry!(
            Opts::new(
                "strata_blocks_abandoned_total",
                "Blocks discarded after a signing or commit failure"
            ),
            registry
        )
        .expect("failed to register blocks_abandoned counter");

        let queue_depth = register_int_gauge_with_registry!(
            Opts::new("strata_queue_depth", "Transactions waiting in the processing queue"),
            registry
        )
        .expect("failed to register queue_depth gauge");

        let chain_height = register_int_gauge_with_registry!(
            Opts::new("strata_chain_height", "Number of the last committed block"),
            registry
        )
        .expect("failed to register chain_height gauge");

        let execution_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "strata_execution_time_ms",
                "Time spent executing one transaction in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(0.125, 2.0, 14).unwrap()),
            registry
        )
        .expect("failed to register execution_time_ms histogram");

        let dwell_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "strata_dwell_time_ms",
                "Age of a transaction when selected for execution in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 15).unwrap()),
            registry
        )
        .expect("failed to register dwell_time_ms histogram");

        Self {
            registry,
            transactions_received,
            transactions_rejected,
            transactions_executed,
            transactions_failed,
            blocks_finalized,
            blocks_abandoned,
            queue_depth,
            chain_height,
            execution_time_ms,
            dwell_time_ms,
        }
    }

    /// Encode every metric in the Prometheus text format.
    pub fn encode_text(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        let metrics = NodeMetrics::new();
        metrics.transactions_received.inc();
        metrics.chain_height.set(7);
        metrics.dwell_time_ms.observe(1_200.0);

        let text = metrics.encode_text();
        assert!(text.contains("strata_transactions_received_total 1"));
        assert!(text.contains("strata_chain_height 7"));
        assert!(text.contains("strata_dwell_time_ms_count 1"));
    }

    #[test]
    fn independent_instances_do_not_share_state() {
        let a = NodeMetrics::new();
        let b = NodeMetrics::new();
        a.blocks_finalized.inc();
        assert_eq!(a.blocks_finalized.get(), 1);
        assert_eq!(b.blocks_finalized.get(), 0);
    }
}
