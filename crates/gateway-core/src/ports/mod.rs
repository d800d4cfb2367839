//! Ports: the traits the pipeline is written against.

pub mod inbound;
pub mod outbound;

pub use inbound::{HandlerOutcome, OperationHandler};
pub use outbound::{
    AccessEvaluator, AuditObserver, DataAccessPort, FixedTimeSource, InputValidator,
    LargePayloadStore, ReadQuery, SystemTimeSource, TimeSource, TrustAuthority,
    ValidationVerdict, WriteResult, WriteStatement,
};
