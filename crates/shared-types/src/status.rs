//! Response status constants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a request as seen by the caller.
///
/// Values are stable wire constants: append only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    NotFound,
    /// Input shape invalid.
    ValidationError,
    ForbiddenOperation,
    JwtInvalid,
    JwtExpired,
    ThirdPartyServiceUnavailable,
    /// Storage layer failure.
    RuntimeError,
    /// Catch-all.
    OperationFailed,
    ConstraintViolation,
}

impl Status {
    /// Every status in wire order.
    pub const ALL: [Status; 10] = [
        Status::Success,
        Status::NotFound,
        Status::ValidationError,
        Status::ForbiddenOperation,
        Status::JwtInvalid,
        Status::JwtExpired,
        Status::ThirdPartyServiceUnavailable,
        Status::RuntimeError,
        Status::OperationFailed,
        Status::ConstraintViolation,
    ];

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::NotFound => "NOT_FOUND",
            Status::ValidationError => "VALIDATION_ERROR",
            Status::ForbiddenOperation => "FORBIDDEN_OPERATION",
            Status::JwtInvalid => "JWT_INVALID",
            Status::JwtExpired => "JWT_EXPIRED",
            Status::ThirdPartyServiceUnavailable => "THIRD_PARTY_SERVICE_UNAVAILABLE",
            Status::RuntimeError => "RUNTIME_ERROR",
            Status::OperationFailed => "OPERATION_FAILED",
            Status::ConstraintViolation => "CONSTRAINT_VIOLATION",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
