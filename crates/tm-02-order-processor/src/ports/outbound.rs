//! # Driven Ports (Outbound SPI)
//!
//! Capabilities the host provides to the processor: a content-addressed
//! store, a port prober and a tunnel launcher.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::{TunnelHandle, TunnelSpec};

/// Content-addressed descriptor store.
///
/// No deadline is applied here; the processor bounds every call.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the raw bytes stored under `cid`.
    async fn fetch(&self, cid: &str) -> Result<Vec<u8>, ContentStoreError>;
}

/// Errors from the content store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentStoreError {
    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Store returned HTTP {status}")]
    Http { status: u16 },

    #[error("Store unreachable: {0}")]
    Unavailable(String),
}

/// Checks whether a local port can be used for a tunnel.
#[async_trait]
pub trait PortAllocator: Send + Sync {
    /// Succeeds if `port` is free right now. The port is not held afterwards.
    async fn probe(&self, port: u16) -> Result<(), PortError>;
}

/// Errors from port probing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("Port {0} is already in use")]
    InUse(u16),

    #[error("Port probe failed: {0}")]
    Io(String),
}

/// Starts tunnel listeners.
#[async_trait]
pub trait TunnelLauncher: Send + Sync {
    /// Bind a listener for `spec` and start serving it in the background.
    ///
    /// Returns only after the bind succeeded or failed. The listener stops
    /// when `cancel` (or a token derived from it) is cancelled.
    async fn launch(
        &self,
        spec: TunnelSpec,
        cancel: CancellationToken,
    ) -> Result<TunnelHandle, LaunchError>;
}

/// Errors from starting a listener.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Bind failed: {0}")]
    Bind(String),

    #[error("Descriptor not supported: {0}")]
    Unsupported(String),
}
