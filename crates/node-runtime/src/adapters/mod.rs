//! # Adapter Implementations
//!
//! Glue between the subsystems' ports and the rest of the node.
//!
//! ```text
//! MessageRouter ──OrderHandler──▶ FulfillmentBridge ──▶ OrderProcessor
//!                                        │
//!                                        ├──▶ TunnelRegistry ◀── ListenerMonitor ◀── ListenerReport
//!                                        └──▶ InMemoryOrderRepository ◀── SyncWorker
//!                                                                          │
//!                                                        MeteredNotifier ◀─┘
//! ```

pub mod collaborators;
pub mod listener_monitor;
pub mod metrics_sampler;
pub mod notifier;
pub mod order_bridge;
pub mod tunnels;

pub use collaborators::Collaborators;
pub use listener_monitor::ListenerMonitor;
pub use metrics_sampler::MetricsSampler;
pub use notifier::MeteredNotifier;
pub use order_bridge::FulfillmentBridge;
pub use tunnels::TunnelRegistry;
