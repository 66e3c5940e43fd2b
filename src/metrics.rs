//! Prometheus metrics for liquidity transfer reconciliation
//!
//! Registered in the default registry; [`encode_text`] renders them for a
//! scrape endpoint owned by the embedding service.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, CounterVec, Encoder, GaugeVec, TextEncoder,
};

use crate::types::{ChainSelector, Direction, TransferStatus};

lazy_static! {
    // Reconciliation output
    pub static ref PENDING_TRANSFERS: GaugeVec = register_gauge_vec!(
        "liquidity_bridge_pending_transfers",
        "Pending transfers reported by the last reconciliation of a chain pair",
        &["direction", "local_selector", "remote_selector", "status"]
    ).unwrap();

    pub static ref MISSING_SENT: CounterVec = register_counter_vec!(
        "liquidity_bridge_missing_sent_total",
        "Bridge step events with no matching sent event",
        &["direction"]
    ).unwrap();

    // Events excluded by address or selector checks
    pub static ref REJECTED_EVENTS: CounterVec = register_counter_vec!(
        "liquidity_bridge_rejected_events_total",
        "Events skipped because a participant did not match the configured contracts",
        &["direction", "reason"]
    ).unwrap();

    // Error metrics
    pub static ref ERRORS: CounterVec = register_counter_vec!(
        "liquidity_bridge_errors_total",
        "Reconciliation calls aborted by an error",
        &["direction"]
    ).unwrap();
}

/// Update the pending transfer gauge for one chain pair and status
pub fn set_pending_transfers(
    direction: Direction,
    local: ChainSelector,
    remote: ChainSelector,
    status: TransferStatus,
    count: usize,
) {
    PENDING_TRANSFERS
        .with_label_values(&[
            direction.as_str(),
            &local.to_string(),
            &remote.to_string(),
            status.as_str(),
        ])
        .set(count as f64);
}

/// Record bridge step events without a sent counterpart
pub fn record_missing_sent(direction: Direction, count: usize) {
    if count > 0 {
        MISSING_SENT
            .with_label_values(&[direction.as_str()])
            .inc_by(count as f64);
    }
}

/// Record an event skipped by a participant check
pub fn record_rejected_event(direction: Direction, reason: &str) {
    REJECTED_EVENTS
        .with_label_values(&[direction.as_str(), reason])
        .inc();
}

/// Record an aborted reconciliation
pub fn record_error(direction: Direction) {
    ERRORS.with_label_values(&[direction.as_str()]).inc();
}

/// Render all registered metrics in the Prometheus text format
pub fn encode_text() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
