//! # Gateway Core
//!
//! Request-processing core of the bus CRUD gateway.
//!
//! ## Purpose
//!
//! Receives envelope-wrapped read/write requests, authenticates and
//! authorizes the caller, dispatches to a per-entity operation handler and
//! turns every outcome into exactly one `ResponseEnvelope`.
//!
//! ## Pipeline
//!
//! ```text
//! transport ─→ DispatchListener ─→ [input validation]
//!                    │
//!                    ▼
//!             OperationHandler ─→ TokenValidator ─→ KeyResolver ─→ trust authority
//!                    │          ─→ AccessEvaluator
//!                    │          ─→ DataAccessPort (one atomic statement)
//!                    ▼
//!             ResponseBuilder ─→ inline | large-payload reference ─→ transport
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Input shape checked before authentication | `listener/dispatch.rs` - `handle()` |
//! | Authorization decided before any data access | `handler/pipeline.rs` - `read()` / `write()` |
//! | Missing `exp` claim is treated as expired | `auth/token_validator.rs` - `check_expiry()` |
//! | Untrusted issuer realm is `JWT_INVALID` | `auth/token_validator.rs` - `trusted_realm()` |
//! | One fetch in flight per uncached realm | `auth/key_resolver.rs` - `resolve()` |
//! | Listener never fails past its boundary | `listener/dispatch.rs` - `classify()` |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - in-memory store, trust authority client,           │
//! │              payload store, tracing audit observer              │
//! │  listener/ - dispatch listener, input validators                │
//! │  response/ - size-aware outbound message construction           │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - OperationHandler                           │
//! │  ports/outbound.rs - DataAccessPort, TrustAuthority,            │
//! │                      AccessEvaluator, AuditObserver, ...        │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/ - errors, claims, rows, conditions, system columns     │
//! │  auth/   - key resolver, token validator, role access policy    │
//! │  handler/ - entity schemas and the generic CRUD pipeline        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod auth;
pub mod domain;
pub mod handler;
pub mod listener;
pub mod ports;
pub mod response;

pub use adapters::{InMemoryDataStore, InMemoryPayloadStore, KeycloakClient, TracingAuditObserver};
pub use auth::{KeyCache, KeyResolver, RealmPublicKey, RoleAccessEvaluator, TokenValidator};
pub use domain::*;
pub use handler::{CommandHandler, EntityPipeline, EntitySchema, HandlerContext, ReadHandler};
pub use listener::{DispatchListener, RequestProcessor};
pub use ports::*;
pub use response::{OutboundMessage, Representation, ResponseBuilder, PAYLOAD_REF_HEADER};
