//! Outbound message construction.

pub mod builder;

pub use builder::{OutboundMessage, Representation, ResponseBuilder, PAYLOAD_REF_HEADER};
