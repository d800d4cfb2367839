//! # Inbound Port - OperationHandler
//!
//! One handler per entity and operation kind. The dispatch listener drives
//! it and classifies whatever it returns.

use crate::domain::{Operation, RequestError};
use async_trait::async_trait;
use shared_types::Envelope;

/// Normal outcomes of a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome<O> {
    /// Read hit
    Found(O),
    /// Read miss. Not an error.
    NotFound,
    /// Write completed, optionally echoing a payload (the new id on create)
    Written(Option<O>),
}

/// A per-entity CRUD operation.
///
/// # Example
///
/// ```rust,ignore
/// use gateway_core::ports::OperationHandler;
///
/// async fn example(handler: &impl OperationHandler) {
///     match handler.handle(&envelope).await {
///         Ok(HandlerOutcome::Found(record)) => { /* ... */ }
///         Ok(HandlerOutcome::NotFound) => { /* ... */ }
///         Ok(HandlerOutcome::Written(_)) => { /* ... */ }
///         Err(err) => eprintln!("{}: {}", err.status(), err.details()),
///     }
/// }
/// ```
#[async_trait]
pub trait OperationHandler: Send + Sync {
    type Input: Send + Sync;
    type Output: Send + Sync;

    fn operation(&self) -> Operation;

    fn table_name(&self) -> &str;

    async fn handle(
        &self,
        envelope: &Envelope<Self::Input>,
    ) -> Result<HandlerOutcome<Self::Output>, RequestError>;
}
