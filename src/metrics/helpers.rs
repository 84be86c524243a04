//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::hub::DeliveryReport;

use super::{
    MESSAGES_DELIVERED_TOTAL, MESSAGES_ENCODE_FAILED_TOTAL, MESSAGES_SENT_TOTAL,
    NOTIFICATIONS_PUBLISHED_TOTAL, SESSIONS_ACTIVE, SESSIONS_EVICTED_TOTAL,
    SESSIONS_REGISTERED_TOTAL, SESSIONS_UNREGISTERED_TOTAL, WS_CONNECTIONS_CLOSED,
    WS_CONNECTIONS_OPENED, WS_CONNECTION_DURATION, WS_MESSAGES_RECEIVED,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for hub membership and delivery metrics
pub struct HubMetrics;

impl HubMetrics {
    pub fn record_registered(active: usize) {
        SESSIONS_REGISTERED_TOTAL.inc();
        SESSIONS_ACTIVE.set(active as i64);
    }

    pub fn record_unregistered(active: usize) {
        SESSIONS_UNREGISTERED_TOTAL.inc();
        SESSIONS_ACTIVE.set(active as i64);
    }

    /// Record a shutdown drain of `closed` sessions
    pub fn record_closed_all(closed: usize, active: usize) {
        SESSIONS_UNREGISTERED_TOTAL.inc_by(closed as u64);
        SESSIONS_ACTIVE.set(active as i64);
    }

    pub fn record_evicted(active: usize) {
        SESSIONS_EVICTED_TOTAL.inc();
        SESSIONS_ACTIVE.set(active as i64);
    }

    /// Record one delivery call and how many buffers accepted it
    pub fn record_delivery(target: &str, report: &DeliveryReport) {
        MESSAGES_SENT_TOTAL.with_label_values(&[target]).inc();
        MESSAGES_DELIVERED_TOTAL.inc_by(report.delivered as u64);
    }

    pub fn record_encode_failure(target: &str) {
        MESSAGES_ENCODE_FAILED_TOTAL.with_label_values(&[target]).inc();
    }
}

/// Helper struct for notification publishing metrics
pub struct NotificationMetrics;

impl NotificationMetrics {
    pub fn record_published(kind: &str) {
        NOTIFICATIONS_PUBLISHED_TOTAL.with_label_values(&[kind]).inc();
    }
}

/// Helper struct for WebSocket connection metrics
pub struct WsMetrics;

impl WsMetrics {
    pub fn record_opened() {
        WS_CONNECTIONS_OPENED.inc();
    }

    pub fn record_closed(duration_secs: f64) {
        WS_CONNECTIONS_CLOSED.inc();
        WS_CONNECTION_DURATION.observe(duration_secs);
    }

    pub fn record_ping() {
        WS_MESSAGES_RECEIVED.with_label_values(&["ping"]).inc();
    }

    pub fn record_invalid() {
        WS_MESSAGES_RECEIVED.with_label_values(&["invalid"]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_includes_hub_gauge() {
        HubMetrics::record_registered(3);
        let text = encode_metrics().unwrap();
        assert!(text.contains("itsm_hub_sessions_active"));
    }

    #[test]
    fn test_closed_all_counts_every_session() {
        let before = SESSIONS_UNREGISTERED_TOTAL.get();
        HubMetrics::record_closed_all(4, 0);
        assert!(SESSIONS_UNREGISTERED_TOTAL.get() >= before + 4);
    }
}
