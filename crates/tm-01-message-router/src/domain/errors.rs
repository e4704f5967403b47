//! # Domain Errors

use shared_bus::TransportError;
use shared_types::WireError;
use thiserror::Error;

/// Failure reported by the order handler for one order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{label}: {message}")]
pub struct HandlerError {
    /// Short stable category, e.g. `unauthorized`.
    pub label: String,
    pub message: String,
}

impl HandlerError {
    pub fn new(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced while routing.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Message could not be parsed or decoded.
    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    /// Order handler rejected the order.
    #[error("Order handler failed: {0}")]
    Handler(#[from] HandlerError),

    /// Outbound sink refused a message.
    #[error("Publish failed: {0}")]
    Publish(#[from] TransportError),
}

impl RouterError {
    /// Short stable label for logs and metrics.
    pub fn label(&self) -> &str {
        match self {
            RouterError::Wire(_) => "wire",
            RouterError::Handler(e) => &e.label,
            RouterError::Publish(_) => "publish",
        }
    }
}

/// Diagnostic trace lookup failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeoTraceError {
    #[error("Trace request failed: {0}")]
    Request(String),

    #[error("Trace endpoint returned HTTP {0}")]
    Status(u16),
}
