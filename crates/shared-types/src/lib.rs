//! # Shared Types Crate
//!
//! Wire model for every message that crosses the bus.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: request and response envelopes are defined
//!   here and nowhere else.
//! - **Read-only metadata**: `RequestContext` and `SecurityContext` travel
//!   with the payload unchanged; handlers never rewrite them.
//! - **Stable statuses**: `Status` values are wire constants. New values are
//!   appended, existing ones are never renamed or reordered.

pub mod envelope;
pub mod response;
pub mod status;

pub use envelope::{Envelope, FileRef, RequestContext, SecurityContext};
pub use response::{EntityId, ResponseEnvelope};
pub use status::Status;
