//! # `ResponseEnvelope`
//!
//! Exactly one response envelope is produced per request. It carries a
//! payload only together with `Status::Success`.

use crate::status::Status;
use serde::{Deserialize, Serialize};

/// Outbound envelope returned for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<O> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<O>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<O> ResponseEnvelope<O> {
    /// Successful read or create with a value.
    pub fn success(payload: O) -> Self {
        Self {
            status: Status::Success,
            payload: Some(payload),
            details: None,
        }
    }

    /// Successful write without a value.
    pub fn completed() -> Self {
        Self {
            status: Status::Success,
            payload: None,
            details: None,
        }
    }

    /// Read miss.
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
            details: None,
        }
    }

    /// Any non-success outcome. Never carries a payload.
    pub fn failure(status: Status, details: Option<String>) -> Self {
        Self {
            status,
            payload: None,
            details,
        }
    }

    /// Drops the payload, keeping status and details.
    pub fn without_payload<P>(&self) -> ResponseEnvelope<P> {
        ResponseEnvelope {
            status: self.status,
            payload: None,
            details: self.details.clone(),
        }
    }
}

/// Identifier of a created record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityId {
    pub id: String,
}

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
