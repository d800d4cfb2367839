//! # Request `Envelope`
//!
//! The wrapper around every inbound business payload.
//!
//! ## Sections
//!
//! - **Payload**: the entity (writes) or the primary key (reads).
//! - **Request context**: correlation metadata copied into audit columns.
//! - **Security context**: bearer credential and digital signature artifacts.

use serde::{Deserialize, Serialize};

/// Correlation metadata of the business process that issued a request.
///
/// Propagated unchanged into the system columns of every write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestContext {
    /// Originating system.
    pub system: Option<String>,
    /// Originating application.
    pub application: Option<String>,
    /// Business process name.
    pub business_process: Option<String>,
    /// Business process definition id.
    pub business_process_definition_id: Option<String>,
    /// Business process instance id.
    pub business_process_instance_id: Option<String>,
    /// Business activity name.
    pub business_activity: Option<String>,
    /// Business activity instance id.
    pub business_activity_instance_id: Option<String>,
}

/// Credential and signature artifacts of the caller. Read-only.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityContext {
    /// Bearer token (JWT).
    pub access_token: Option<String>,
    /// Reference to the digital signature of the payload.
    pub digital_signature: Option<String>,
    /// Reference to the derived digital signature.
    pub digital_signature_derived: Option<String>,
}

impl SecurityContext {
    /// Security context carrying only a bearer token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Self::default()
        }
    }
}

// Tokens must never end up in logs.
impl std::fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityContext")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("digital_signature", &self.digital_signature)
            .field("digital_signature_derived", &self.digital_signature_derived)
            .finish()
    }
}

/// The envelope for all inbound requests.
///
/// Built once by the transport adapter; the dispatch listener only borrows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// The business payload.
    pub payload: T,

    /// Correlation metadata.
    #[serde(rename = "requestContext", default)]
    pub context: RequestContext,

    /// Credential metadata.
    #[serde(rename = "securityContext", default)]
    pub security: SecurityContext,
}

impl<T> Envelope<T> {
    pub fn new(payload: T, context: RequestContext, security: SecurityContext) -> Self {
        Self {
            payload,
            context,
            security,
        }
    }

    /// The bearer token, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.security.access_token.as_deref()
    }
}

/// Reference to a file kept in external object storage.
///
/// Stored as a `(id,checksum)` composite column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: String,
    pub checksum: String,
}
