//! Size-aware outbound message construction.
//!
//! Payloads up to `max_inline_payload_bytes` travel inside the message body.
//! Larger ones are put into the `LargePayloadStore` and the body carries the
//! envelope without payload plus a `x-payload-ref` header.

use crate::domain::{PayloadSizeCriterion, ResponseConfig};
use crate::ports::LargePayloadStore;
use serde::Serialize;
use shared_types::{ResponseEnvelope, Status};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Header naming the stored payload of an out-of-band response.
pub const PAYLOAD_REF_HEADER: &str = "x-payload-ref";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    Inline,
    OutOfBand { reference: String },
}

/// A finished reply, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub key: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub representation: Representation,
}

impl OutboundMessage {
    fn inline(key: &str, body: Vec<u8>) -> Self {
        Self {
            key: key.to_string(),
            headers: BTreeMap::new(),
            body,
            representation: Representation::Inline,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.representation, Representation::Inline)
    }

    /// Decodes the body back into an envelope.
    pub fn envelope<O: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<ResponseEnvelope<O>, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

pub struct ResponseBuilder {
    max_inline_payload_bytes: usize,
    criterion: PayloadSizeCriterion,
    store: Arc<dyn LargePayloadStore>,
}

impl ResponseBuilder {
    pub fn new(config: &ResponseConfig, store: Arc<dyn LargePayloadStore>) -> Self {
        Self {
            max_inline_payload_bytes: config.max_inline_payload_bytes,
            criterion: config.criterion,
            store,
        }
    }

    pub fn max_inline_payload_bytes(&self) -> usize {
        self.max_inline_payload_bytes
    }

    pub async fn build<O: Serialize>(
        &self,
        key: &str,
        envelope: &ResponseEnvelope<O>,
    ) -> OutboundMessage {
        let body = match serde_json::to_vec(envelope) {
            Ok(body) => body,
            Err(e) => {
                error!(key, error = %e, "Response envelope could not be serialized");
                return self.failure(
                    key,
                    Status::OperationFailed,
                    Some(format!("Response could not be serialized: {}", e)),
                );
            }
        };

        let Some(payload) = envelope.payload.as_ref() else {
            return OutboundMessage::inline(key, body);
        };
        let payload = match serde_json::to_vec(payload) {
            Ok(payload) => payload,
            Err(e) => {
                error!(key, error = %e, "Response payload could not be serialized");
                return self.failure(
                    key,
                    Status::OperationFailed,
                    Some(format!("Response could not be serialized: {}", e)),
                );
            }
        };

        let size = match self.criterion {
            PayloadSizeCriterion::Payload => payload.len(),
            PayloadSizeCriterion::Envelope => body.len(),
        };
        if size <= self.max_inline_payload_bytes {
            return OutboundMessage::inline(key, body);
        }

        let reference = match self.store.put(payload).await {
            Ok(reference) => reference,
            Err(e) => {
                warn!(key, size, error = %e, "Large payload store failed");
                return self.failure(
                    key,
                    Status::ThirdPartyServiceUnavailable,
                    Some(format!("Large payload could not be stored: {}", e)),
                );
            }
        };
        debug!(key, size, reference = %reference, "Payload sent out of band");

        let stripped: ResponseEnvelope<O> = envelope.without_payload();
        let mut message = OutboundMessage::inline(key, serialize_plain(&stripped));
        message
            .headers
            .insert(PAYLOAD_REF_HEADER.to_string(), reference.clone());
        message.representation = Representation::OutOfBand { reference };
        message
    }

    /// Inline reply without payload. Used whenever building the real reply
    /// is impossible.
    pub fn failure(&self, key: &str, status: Status, details: Option<String>) -> OutboundMessage {
        let envelope: ResponseEnvelope<()> = ResponseEnvelope::failure(status, details);
        OutboundMessage::inline(key, serialize_plain(&envelope))
    }
}

/// Serializes an envelope that carries no payload.
fn serialize_plain<O: Serialize>(envelope: &ResponseEnvelope<O>) -> Vec<u8> {
    serde_json::to_vec(envelope).unwrap_or_else(|_| {
        format!(r#"{{"status":"{}"}}"#, envelope.status.as_str()).into_bytes()
    })
}
