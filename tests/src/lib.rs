//! # Tunnel-Market Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── wire_benchmarks.rs   # Envelope and trace parsing hot paths
//! └── src/integration/
//!     ├── support.rs           # Shared collaborator mocks
//!     ├── flows.rs             # Router → processor → real TCP tunnel
//!     └── market.rs            # Two full nodes on one in-memory topic
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p tm-tests
//!
//! # By category
//! cargo test -p tm-tests integration::flows
//! cargo test -p tm-tests integration::market
//!
//! # Benchmarks
//! cargo bench -p tm-tests
//! ```

#![allow(dead_code)]

pub mod integration;
