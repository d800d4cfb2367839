//! # Dispatch Listener
//!
//! Drives one operation handler for one inbound envelope and always answers
//! with exactly one classified response.
//!
//! ```text
//! body ─→ decode ─→ validate input ─→ handler ─→ classify ─→ ResponseBuilder
//!           │             │                          │
//!           └─ VALIDATION_ERROR                      └─ typed error → its status
//!                         └─ verdict status             other       → OPERATION_FAILED
//! ```

use crate::domain::{Operation, RequestError};
use crate::ports::{HandlerOutcome, InputValidator, OperationHandler};
use crate::response::{OutboundMessage, ResponseBuilder};
use async_trait::async_trait;
use gateway_telemetry::log_request;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{Envelope, ResponseEnvelope, Status};
use std::sync::Arc;

pub struct DispatchListener<H: OperationHandler> {
    handler: H,
    validator: Arc<dyn InputValidator<H::Input>>,
    responses: Arc<ResponseBuilder>,
}

impl<H: OperationHandler> DispatchListener<H> {
    pub fn new(
        handler: H,
        validator: Arc<dyn InputValidator<H::Input>>,
        responses: Arc<ResponseBuilder>,
    ) -> Self {
        Self {
            handler,
            validator,
            responses,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Runs validation and the handler, classifying every outcome.
    pub async fn handle(
        &self,
        key: &str,
        envelope: &Envelope<H::Input>,
    ) -> ResponseEnvelope<H::Output> {
        let table = self.handler.table_name();
        let operation = self.handler.operation();

        let verdict = self.validator.validate(key, envelope);
        if !verdict.valid {
            log_request!(
                info,
                table,
                operation,
                key,
                "Request rejected by input validation",
                status = %verdict.status
            );
            return ResponseEnvelope::failure(verdict.status, verdict.details);
        }

        let response = match self.handler.handle(envelope).await {
            Ok(HandlerOutcome::Found(record)) => ResponseEnvelope::success(record),
            Ok(HandlerOutcome::NotFound) => ResponseEnvelope::not_found(),
            Ok(HandlerOutcome::Written(Some(payload))) => ResponseEnvelope::success(payload),
            Ok(HandlerOutcome::Written(None)) => ResponseEnvelope::completed(),
            Err(err) => classify(table, operation, key, err),
        };

        log_request!(
            debug,
            table,
            operation,
            key,
            "Request handled",
            status = %response.status
        );
        response
    }

    /// Handles an already decoded envelope and builds the outbound message.
    pub async fn dispatch(&self, key: &str, envelope: &Envelope<H::Input>) -> OutboundMessage
    where
        H::Output: Serialize,
    {
        let response = self.handle(key, envelope).await;
        self.responses.build(key, &response).await
    }
}

fn classify<O>(
    table: &str,
    operation: Operation,
    key: &str,
    err: RequestError,
) -> ResponseEnvelope<O> {
    let status = err.status();
    match &err {
        RequestError::Unclassified(source) => {
            let chain = format!("{:#}", source);
            log_request!(
                error,
                table,
                operation,
                key,
                "Unexpected failure while handling request",
                error = %chain
            );
            ResponseEnvelope::failure(
                status,
                Some(format!(
                    "Unexpected error while processing {} request: {}",
                    operation, source
                )),
            )
        }
        RequestError::DataAccess(_) | RequestError::TrustAuthorityUnavailable(_) => {
            log_request!(
                error,
                table,
                operation,
                key,
                "Request failed",
                error = %err,
                status = %status
            );
            ResponseEnvelope::failure(status, Some(err.details()))
        }
        _ => {
            log_request!(
                info,
                table,
                operation,
                key,
                "Request refused",
                error = %err,
                status = %status
            );
            ResponseEnvelope::failure(status, Some(err.details()))
        }
    }
}

/// Type-erased entry point used by the transport: raw body in, reply out.
#[async_trait]
pub trait RequestProcessor: Send + Sync {
    fn operation(&self) -> Operation;

    fn table_name(&self) -> &str;

    async fn process(&self, key: &str, body: &[u8]) -> OutboundMessage;

    /// Reply used when processing itself could not finish.
    fn fallback(&self, key: &str, details: &str) -> OutboundMessage;
}

#[async_trait]
impl<H> RequestProcessor for DispatchListener<H>
where
    H: OperationHandler,
    H::Input: DeserializeOwned,
    H::Output: Serialize,
{
    fn operation(&self) -> Operation {
        self.handler.operation()
    }

    fn table_name(&self) -> &str {
        self.handler.table_name()
    }

    async fn process(&self, key: &str, body: &[u8]) -> OutboundMessage {
        let envelope: Envelope<H::Input> = match serde_json::from_slice(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                log_request!(
                    info,
                    self.handler.table_name(),
                    self.handler.operation(),
                    key,
                    "Undecodable request body",
                    error = %e
                );
                return self.responses.failure(
                    key,
                    Status::ValidationError,
                    Some(format!("Request body could not be decoded: {}", e)),
                );
            }
        };
        self.dispatch(key, &envelope).await
    }

    fn fallback(&self, key: &str, details: &str) -> OutboundMessage {
        self.responses.failure(
            key,
            Status::OperationFailed,
            Some(format!(
                "Unexpected error while processing {} request: {}",
                self.handler.operation(),
                details
            )),
        )
    }
}
