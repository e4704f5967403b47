//! # TM-02 Order Processor
//!
//! Provider-side fulfillment of tunnel orders.
//!
//! ## Pipeline
//!
//! 1. **Authorization**: the order's wallet must equal the configured
//!    wallet, compared as exact strings.
//! 2. **Descriptor fetch**: `ContentStore::fetch(server_cid)`, bounded by
//!    `fetch_timeout` (10s) and by the caller's cancellation token.
//! 3. **Port assignment**: `base_port + 1`, probed once. No fallback port.
//! 4. **Listener startup**: `TunnelLauncher::launch` returns once the bind
//!    result is known. Later listener failures arrive as `ListenerReport`s.
//! 5. **Republish**: the order with its port set, as an `order` envelope.
//!
//! ## Architecture
//!
//! - **Domain** (`domain/`): `ProcessorConfig`, `FulfillmentStage`,
//!   `OrderError`, tunnel values
//! - **Ports** (`ports/`): `OrderFulfillment` (driving); `ContentStore`,
//!   `PortAllocator`, `TunnelLauncher` (driven)
//! - **Service** (`service.rs`): `OrderProcessor`
//! - **Adapters** (`adapters/`): IPFS gateway, TCP port probe, TCP launcher

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    ErrorClass, FulfilledOrder, FulfillmentStage, ListenerOutcome, ListenerReport, OrderError,
    ProcessorConfig, TunnelHandle, TunnelSpec, DEFAULT_FETCH_TIMEOUT,
};
pub use ports::{
    ContentStore, ContentStoreError, LaunchError, OrderFulfillment, PortAllocator, PortError,
    TunnelLauncher,
};
pub use service::OrderProcessor;
