//! Prometheus metrics for the notification hub.
//!
//! - Session metrics (active sessions, registrations, evictions)
//! - Message metrics (sent by target, delivered, encode failures)
//! - WebSocket metrics (connections opened/closed, duration, inbound frames)

mod helpers;

pub use helpers::{encode_metrics, HubMetrics, NotificationMetrics, WsMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "itsm_hub";

lazy_static! {
    // ============================================================================
    // Session Metrics
    // ============================================================================

    /// Sessions currently in the hub's active set
    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_sessions_active", METRIC_PREFIX),
        "Number of sessions currently registered with the hub"
    ).unwrap();

    pub static ref SESSIONS_REGISTERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_sessions_registered_total", METRIC_PREFIX),
        "Total sessions registered"
    ).unwrap();

    pub static ref SESSIONS_UNREGISTERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_sessions_unregistered_total", METRIC_PREFIX),
        "Total sessions unregistered by the connection layer or closed at shutdown"
    ).unwrap();

    /// Sessions dropped because their outbound buffer could not accept a message
    pub static ref SESSIONS_EVICTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_sessions_evicted_total", METRIC_PREFIX),
        "Total sessions evicted for not keeping up with outbound traffic"
    ).unwrap();

    // ============================================================================
    // Message Metrics
    // ============================================================================

    /// Delivery calls by target type
    pub static ref MESSAGES_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_messages_sent_total", METRIC_PREFIX),
        "Total delivery calls",
        &["target"]
    ).unwrap();

    pub static ref MESSAGES_DELIVERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_delivered_total", METRIC_PREFIX),
        "Total messages accepted by session buffers"
    ).unwrap();

    pub static ref MESSAGES_ENCODE_FAILED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_messages_encode_failed_total", METRIC_PREFIX),
        "Total delivery calls abandoned because the message could not be encoded",
        &["target"]
    ).unwrap();

    /// Notifications published by kind
    pub static ref NOTIFICATIONS_PUBLISHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_published_total", METRIC_PREFIX),
        "Total ITSM notifications published",
        &["kind"]
    ).unwrap();

    // ============================================================================
    // WebSocket Metrics
    // ============================================================================

    pub static ref WS_CONNECTIONS_OPENED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_opened_total", METRIC_PREFIX),
        "Total WebSocket connections opened"
    ).unwrap();

    pub static ref WS_CONNECTIONS_CLOSED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_closed_total", METRIC_PREFIX),
        "Total WebSocket connections closed"
    ).unwrap();

    pub static ref WS_CONNECTION_DURATION: Histogram = register_histogram!(
        format!("{}_ws_connection_duration_seconds", METRIC_PREFIX),
        "WebSocket connection duration in seconds",
        vec![1.0, 10.0, 60.0, 300.0, 900.0, 3600.0, 14400.0, 86400.0]
    ).unwrap();

    pub static ref WS_MESSAGES_RECEIVED: IntCounterVec = register_int_counter_vec!(
        format!("{}_ws_messages_received_total", METRIC_PREFIX),
        "Total frames received from clients",
        &["type"]
    ).unwrap();
}
