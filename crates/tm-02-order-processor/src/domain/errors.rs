//! # Domain Errors
//!
//! Every failure is terminal for the message that caused it. The variant
//! determines the last [`FulfillmentStage`] that was reached and the broad
//! [`ErrorClass`] used for logging and metrics.

use std::fmt;
use std::time::Duration;

use shared_types::WalletAddress;
use thiserror::Error;

use crate::ports::outbound::{ContentStoreError, LaunchError, PortError};

/// Progress of one order through the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FulfillmentStage {
    Received,
    Authorized,
    DescriptorFetched,
    PortAssigned,
    Published,
}

impl fmt::Display for FulfillmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FulfillmentStage::Received => "received",
            FulfillmentStage::Authorized => "authorized",
            FulfillmentStage::DescriptorFetched => "descriptor_fetched",
            FulfillmentStage::PortAssigned => "port_assigned",
            FulfillmentStage::Published => "published",
        };
        f.write_str(name)
    }
}

/// Error taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or unauthorized input.
    Validation,
    /// Content store slow or unreachable.
    TransientFetch,
    /// Port or listener problems on this host.
    Resource,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Validation => "validation",
            ErrorClass::TransientFetch => "transient_fetch",
            ErrorClass::Resource => "resource",
        }
    }
}

/// Order fulfillment failures.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order is addressed to another provider.
    #[error("Order {uuid} is addressed to {requested}, not this provider")]
    Unauthorized {
        uuid: String,
        requested: WalletAddress,
    },

    /// Content store returned an error.
    #[error("Descriptor fetch for {cid} failed: {source}")]
    Fetch {
        cid: String,
        #[source]
        source: ContentStoreError,
    },

    /// Content store did not answer in time.
    #[error("Descriptor fetch for {cid} timed out after {timeout:?}")]
    FetchTimeout { cid: String, timeout: Duration },

    /// Fetched bytes are not a usable descriptor.
    #[error("Invalid descriptor {cid}: {reason}")]
    InvalidDescriptor { cid: String, reason: String },

    /// `base_port + 1` does not fit in a port number.
    #[error("No tunnel port above base port {base_port}")]
    PortOverflow { base_port: u16 },

    /// Candidate port is taken or could not be probed.
    #[error("Port {port} unavailable: {source}")]
    PortUnavailable {
        port: u16,
        #[source]
        source: PortError,
    },

    /// Tunnel listener failed to start.
    #[error("Tunnel listener on port {port} failed to start: {source}")]
    ListenerStartup {
        port: u16,
        #[source]
        source: LaunchError,
    },

    /// Republishing the fulfilled order failed.
    #[error("Publishing fulfilled order {uuid} failed: {reason}")]
    Publish { uuid: String, reason: String },

    /// Shutdown interrupted the order.
    #[error("Order processing cancelled after stage {stage}")]
    Cancelled { stage: FulfillmentStage },
}

impl OrderError {
    /// Last stage completed before the failure.
    pub fn stage(&self) -> FulfillmentStage {
        match self {
            OrderError::Unauthorized { .. } => FulfillmentStage::Received,
            OrderError::Fetch { .. }
            | OrderError::FetchTimeout { .. }
            | OrderError::InvalidDescriptor { .. } => FulfillmentStage::Authorized,
            OrderError::PortOverflow { .. } | OrderError::PortUnavailable { .. } => {
                FulfillmentStage::DescriptorFetched
            }
            OrderError::ListenerStartup { .. } | OrderError::Publish { .. } => {
                FulfillmentStage::PortAssigned
            }
            OrderError::Cancelled { stage } => *stage,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            OrderError::Unauthorized { .. } | OrderError::InvalidDescriptor { .. } => {
                ErrorClass::Validation
            }
            OrderError::Fetch { .. } | OrderError::FetchTimeout { .. } => {
                ErrorClass::TransientFetch
            }
            OrderError::PortOverflow { .. }
            | OrderError::PortUnavailable { .. }
            | OrderError::ListenerStartup { .. }
            | OrderError::Publish { .. }
            | OrderError::Cancelled { .. } => ErrorClass::Resource,
        }
    }

    /// Short stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            OrderError::Unauthorized { .. } => "unauthorized",
            OrderError::Fetch { .. } => "fetch_failed",
            OrderError::FetchTimeout { .. } => "fetch_timeout",
            OrderError::InvalidDescriptor { .. } => "invalid_descriptor",
            OrderError::PortOverflow { .. } => "port_overflow",
            OrderError::PortUnavailable { .. } => "port_unavailable",
            OrderError::ListenerStartup { .. } => "listener_startup",
            OrderError::Publish { .. } => "publish_failed",
            OrderError::Cancelled { .. } => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_class_per_variant() {
        let unauthorized = OrderError::Unauthorized {
            uuid: "u".into(),
            requested: "0x2".into(),
        };
        assert_eq!(unauthorized.stage(), FulfillmentStage::Received);
        assert_eq!(unauthorized.class(), ErrorClass::Validation);

        let timeout = OrderError::FetchTimeout {
            cid: "c".into(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(timeout.stage(), FulfillmentStage::Authorized);
        assert_eq!(timeout.class(), ErrorClass::TransientFetch);

        let overflow = OrderError::PortOverflow { base_port: 65535 };
        assert_eq!(overflow.stage(), FulfillmentStage::DescriptorFetched);
        assert_eq!(overflow.class(), ErrorClass::Resource);

        let cancelled = OrderError::Cancelled {
            stage: FulfillmentStage::Authorized,
        };
        assert_eq!(cancelled.stage(), FulfillmentStage::Authorized);
    }

    #[test]
    fn test_stages_are_ordered() {
        assert!(FulfillmentStage::Received < FulfillmentStage::Authorized);
        assert!(FulfillmentStage::PortAssigned < FulfillmentStage::Published);
        assert_eq!(FulfillmentStage::DescriptorFetched.to_string(), "descriptor_fetched");
    }
}
