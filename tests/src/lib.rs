//! # Bus Gateway Test Suite
//!
//! Cross-crate scenarios driven entirely through the message bus.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── bus_flows.rs    # CRUD round trips, routing, worker pool
//!     └── auth_flows.rs   # token validation over the bus
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gateway-tests
//! cargo test -p gateway-tests integration::auth_flows
//! ```

pub mod integration;
