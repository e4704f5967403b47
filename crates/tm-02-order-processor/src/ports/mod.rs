//! # Ports Layer

pub mod inbound;
pub mod outbound;

pub use inbound::OrderFulfillment;
pub use outbound::{
    ContentStore, ContentStoreError, LaunchError, PortAllocator, PortError, TunnelLauncher,
};
