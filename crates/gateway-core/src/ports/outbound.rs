//! Outbound ports consumed by the request pipeline.
//!
//! | Port | Called from | Async |
//! |------|-------------|-------|
//! | `DataAccessPort` | `EntityPipeline` after authorization | yes |
//! | `TrustAuthority` | `KeyResolver` on a cache miss | yes |
//! | `LargePayloadStore` | `ResponseBuilder` above the inline threshold | yes |
//! | `AccessEvaluator` | `EntityPipeline` before any data access | no |
//! | `AuditObserver` | `EntityPipeline` on success and failure | no |
//! | `InputValidator` | `DispatchListener` before authentication | no |
//! | `TimeSource` | `TokenValidator` expiry check | no |

use crate::domain::{
    AuditEvent, Claims, Condition, DataAccessError, FieldPermission, Operation,
    PayloadStoreError, Row, RowExpectation, SysColumns, TrustAuthorityError,
};
use async_trait::async_trait;
use serde_json::Value;
use shared_types::{Envelope, Status};
use std::sync::atomic::{AtomicI64, Ordering};

/// Primary-key read against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadQuery {
    pub table: String,
    pub pk_column: String,
    pub pk_value: Value,
    /// Entity-specific condition added to the key match
    pub condition: Condition,
}

/// One atomic write statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteStatement {
    pub table: String,
    pub operation: Operation,
    pub pk_column: String,
    pub pk_value: Value,
    /// Payload columns; ignored for deletes
    pub row: Row,
    pub sys_columns: SysColumns,
    pub expectation: RowExpectation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Applied,
    /// The statement's `RowExpectation` did not hold; nothing was written.
    PreconditionFailed,
}

/// Transactional storage behind the gateway.
///
/// Each call is one transaction scope: a failed write leaves no partial
/// state behind.
#[async_trait]
pub trait DataAccessPort: Send + Sync {
    async fn read(&self, query: &ReadQuery) -> Result<Option<Row>, DataAccessError>;

    async fn write(&self, statement: &WriteStatement) -> Result<WriteResult, DataAccessError>;
}

/// Remote source of realm verification keys.
#[async_trait]
pub trait TrustAuthority: Send + Sync {
    /// Base64 SubjectPublicKeyInfo of the realm's signing key.
    async fn fetch_realm_key(&self, realm: &str) -> Result<String, TrustAuthorityError>;
}

/// Out-of-band storage for payloads too large to send inline.
#[async_trait]
pub trait LargePayloadStore: Send + Sync {
    /// Stores `bytes` and returns the reference sent to the consumer.
    async fn put(&self, bytes: Vec<u8>) -> Result<String, PayloadStoreError>;

    async fn get(&self, reference: &str) -> Result<Vec<u8>, PayloadStoreError>;

    /// Fetches the payload and releases it. A reference resolves once.
    async fn take(&self, reference: &str) -> Result<Vec<u8>, PayloadStoreError>;
}

/// Field-level authorization decision.
pub trait AccessEvaluator: Send + Sync {
    fn has_access(&self, operation: Operation, required: &[FieldPermission], claims: &Claims)
        -> bool;
}

/// Side-effecting observer of data operations.
pub trait AuditObserver: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Pre-dispatch verdict on an inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub valid: bool,
    /// Status returned when `valid` is false
    pub status: Status,
    pub details: Option<String>,
}

impl ValidationVerdict {
    pub fn valid() -> Self {
        Self {
            valid: true,
            status: Status::Success,
            details: None,
        }
    }

    pub fn invalid(details: impl Into<String>) -> Self {
        Self::rejected(Status::ValidationError, details)
    }

    pub fn rejected(status: Status, details: impl Into<String>) -> Self {
        Self {
            valid: false,
            status,
            details: Some(details.into()),
        }
    }
}

/// Input-shape check run before authentication.
pub trait InputValidator<P>: Send + Sync {
    fn validate(&self, key: &str, envelope: &Envelope<P>) -> ValidationVerdict;
}

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> i64;
}

/// System time implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Settable clock for expiry tests and replay tooling.
#[derive(Debug, Default)]
pub struct FixedTimeSource {
    now: AtomicI64,
}

impl FixedTimeSource {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
