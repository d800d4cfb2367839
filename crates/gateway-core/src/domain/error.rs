//! Error taxonomy of the request pipeline.
//!
//! Every layer below the dispatch listener returns one of these typed
//! failures; the listener maps each kind 1:1 onto a wire `Status`.

use shared_types::Status;
use thiserror::Error;

/// Failure of a single request, carrying its diagnostic detail.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Input validation failed: {0}")]
    InputShapeInvalid(String),

    #[error("Token could not be parsed: {0}")]
    TokenMalformed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Token issuer realm is not trusted: {0}")]
    IssuerNotTrusted(String),

    #[error("Token signature could not be verified")]
    AuthenticationFailed,

    #[error("Trust authority unavailable: {0}")]
    TrustAuthorityUnavailable(String),

    #[error("{0}")]
    ForbiddenOperation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ConstraintViolation(String),

    #[error("{0}")]
    DataAccess(String),

    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl RequestError {
    pub fn status(&self) -> Status {
        match self {
            RequestError::InputShapeInvalid(_) => Status::ValidationError,
            RequestError::TokenMalformed(_) => Status::JwtInvalid,
            RequestError::TokenExpired => Status::JwtExpired,
            RequestError::IssuerNotTrusted(_) => Status::JwtInvalid,
            RequestError::AuthenticationFailed => Status::JwtInvalid,
            RequestError::TrustAuthorityUnavailable(_) => Status::ThirdPartyServiceUnavailable,
            RequestError::ForbiddenOperation(_) => Status::ForbiddenOperation,
            RequestError::NotFound(_) => Status::NotFound,
            RequestError::ConstraintViolation(_) => Status::ConstraintViolation,
            RequestError::DataAccess(_) => Status::RuntimeError,
            RequestError::Unclassified(_) => Status::OperationFailed,
        }
    }

    /// Bounded detail string returned to the caller.
    pub fn details(&self) -> String {
        self.to_string()
    }

    pub fn is_unclassified(&self) -> bool {
        matches!(self, RequestError::Unclassified(_))
    }
}

/// The single failure kind of the data access port.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DataAccessError {
    pub message: String,
}

impl DataAccessError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Remote trust authority failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrustAuthorityError {
    #[error("trust authority unreachable: {0}")]
    Unreachable(String),

    #[error("trust authority returned malformed key data: {0}")]
    Malformed(String),
}

impl From<TrustAuthorityError> for RequestError {
    fn from(err: TrustAuthorityError) -> Self {
        RequestError::TrustAuthorityUnavailable(err.to_string())
    }
}

/// Large-payload store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadStoreError {
    #[error("payload store rejected the payload: {0}")]
    Rejected(String),

    #[error("payload reference not found: {0}")]
    UnknownReference(String),
}
