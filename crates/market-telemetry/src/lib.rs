//! # Market Telemetry
//!
//! Logging and metrics for the tunnel-market node.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an env filter, pretty or JSON output
//! - **Metrics**: Prometheus counters and gauges in a process-wide registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use market_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MARKET_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `MARKET_JSON_LOGS` | `false` (`true` in containers) | JSON log output |
//! | `MARKET_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `MARKET_SERVICE_NAME` | `tunnel-market` | Service name in logs |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, ACTIVE_TUNNELS, COMPONENT_ERRORS,
    GEO_TRACE_FAILURES, LISTENER_FAILURES, ORDERS_PROCESSED, ORDER_FULFILLMENT_DURATION,
    PEERS_KNOWN, REGISTRY, ROUTER_EVENTS, SYNC_NOTIFICATIONS, SYNC_WORKER_RESTARTS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logger: {0}")]
    LoggerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    // Metrics first, so nothing logged during startup misses a counter
    register_metrics()?;
    init_logging(config)?;
    Ok(())
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_inc_macro() {
        let before = COMPONENT_ERRORS.with_label_values(&["router", "wire"]).get();
        metric_inc!(COMPONENT_ERRORS, &["router", "wire"]);
        assert_eq!(
            COMPONENT_ERRORS.with_label_values(&["router", "wire"]).get(),
            before + 1
        );
    }
}
