//! Prometheus metrics for the tunnel-market node.
//!
//! All metrics follow the naming convention: `market_<component>_<metric>_<unit>`
//!
//! Counters are incremented by the runtime adapters as events happen.
//! Gauges under `ROUTER_EVENTS` and `SYNC_WORKER_RESTARTS` mirror the
//! subsystems' own statistics snapshots and are refreshed by the runtime.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge,
    IntGaugeVec, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // MESSAGE ROUTER METRICS (tm-01)
    // =========================================================================

    /// Router statistics snapshot (received, dropped, orders_dispatched, announcements)
    pub static ref ROUTER_EVENTS: IntGaugeVec = IntGaugeVec::new(
        Opts::new("market_router_events", "Router event counts by category"),
        &["category"]
    ).expect("metric creation failed");

    /// Diagnostic trace lookups that failed
    pub static ref GEO_TRACE_FAILURES: IntCounter = IntCounter::new(
        "market_router_geo_trace_failures_total",
        "Geo trace lookups that failed and left metadata empty"
    ).expect("metric creation failed");

    /// Peers currently known from announcements
    pub static ref PEERS_KNOWN: IntGauge = IntGauge::new(
        "market_router_peers_known",
        "Number of peers in the peer directory"
    ).expect("metric creation failed");

    // =========================================================================
    // ORDER PROCESSOR METRICS (tm-02)
    // =========================================================================

    /// Orders processed by outcome (fulfilled or an error kind)
    pub static ref ORDERS_PROCESSED: IntCounterVec = IntCounterVec::new(
        Opts::new("market_orders_processed_total", "Orders processed by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Time from order receipt to republish
    pub static ref ORDER_FULFILLMENT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "market_orders_fulfillment_duration_seconds",
            "Time spent fulfilling an order"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("bucket layout"))
    ).expect("metric creation failed");

    /// Tunnel listeners currently accepting connections
    pub static ref ACTIVE_TUNNELS: IntGauge = IntGauge::new(
        "market_tunnels_active",
        "Number of running tunnel listeners"
    ).expect("metric creation failed");

    /// Tunnel listeners that stopped with an error
    pub static ref LISTENER_FAILURES: IntCounter = IntCounter::new(
        "market_tunnels_listener_failures_total",
        "Tunnel listeners that failed after startup"
    ).expect("metric creation failed");

    // =========================================================================
    // ORDER SYNC METRICS (tm-03)
    // =========================================================================

    /// Client notifications by result (sent/failed)
    pub static ref SYNC_NOTIFICATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("market_sync_notifications_total", "Client notifications by result"),
        &["result"]
    ).expect("metric creation failed");

    /// Sync worker restarts performed by the supervisor
    pub static ref SYNC_WORKER_RESTARTS: IntGauge = IntGauge::new(
        "market_sync_worker_restarts",
        "Sync workers respawned after a failure"
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Errors by component and type
    pub static ref COMPONENT_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("market_component_errors_total", "Errors by component and type"),
        &["component", "error_type"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Registering twice returns `TelemetryError::MetricsInit`.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Router
        Box::new(ROUTER_EVENTS.clone()),
        Box::new(GEO_TRACE_FAILURES.clone()),
        Box::new(PEERS_KNOWN.clone()),
        // Orders
        Box::new(ORDERS_PROCESSED.clone()),
        Box::new(ORDER_FULFILLMENT_DURATION.clone()),
        Box::new(ACTIVE_TUNNELS.clone()),
        Box::new(LISTENER_FAILURES.clone()),
        // Sync
        Box::new(SYNC_NOTIFICATIONS.clone()),
        Box::new(SYNC_WORKER_RESTARTS.clone()),
        // Errors
        Box::new(COMPONENT_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_increment() {
        ORDERS_PROCESSED.with_label_values(&["fulfilled"]).inc();
        assert!(ORDERS_PROCESSED.with_label_values(&["fulfilled"]).get() >= 1);
    }

    #[test]
    fn test_gauge_set() {
        SYNC_WORKER_RESTARTS.set(3);
        assert_eq!(SYNC_WORKER_RESTARTS.get(), 3);
    }

    #[test]
    fn test_registered_metrics_are_encoded() {
        // Another test in this binary may have registered first.
        let _ = register_metrics();
        LISTENER_FAILURES.inc();

        let text = encode_metrics().unwrap();
        assert!(text.contains("market_tunnels_listener_failures_total"));
    }

    #[test]
    fn test_histogram_timer() {
        let before = ORDER_FULFILLMENT_DURATION.get_sample_count();
        {
            let _timer = HistogramTimer::new(&ORDER_FULFILLMENT_DURATION);
        }
        assert_eq!(ORDER_FULFILLMENT_DURATION.get_sample_count(), before + 1);
    }
}
