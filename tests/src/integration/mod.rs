//! Cross-subsystem choreography.
//!
//! Every test drives real subsystem code over `InMemoryPubSub`; only the
//! external collaborators (content gateway, diagnostics endpoint, client
//! callback) are replaced by the mocks in [`support`].

pub mod flows;
pub mod market;
pub mod support;
