//! # Adapters Layer
//!
//! - `IpfsGatewayStore`: `ContentStore` over an IPFS HTTP gateway
//! - `TcpPortProbe`: `PortAllocator` by bind-and-release
//! - `TcpTunnelLauncher`: `TunnelLauncher` relaying TCP connections

pub mod ipfs_gateway;
pub mod port_probe;
pub mod tunnel_launcher;

pub use ipfs_gateway::{IpfsGatewayStore, DEFAULT_GATEWAY};
pub use port_probe::TcpPortProbe;
pub use tunnel_launcher::TcpTunnelLauncher;
