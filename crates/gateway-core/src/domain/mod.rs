//! Domain layer: the error taxonomy and the value types every handler shares.

pub mod audit;
pub mod claims;
pub mod config;
pub mod entity;
pub mod error;

pub use audit::{AuditEvent, AuditOutcome};
pub use claims::{Claims, RealmAccess};
pub use config::{
    AccessConfig, AuthConfig, ConfigError, GatewayConfig, PayloadSizeCriterion, ResponseConfig,
    RoleGrant, TopicConfig, WorkerConfig,
};
pub use entity::{
    value_key, Condition, FieldPermission, Operation, Row, RowExpectation, SysColumns,
};
pub use error::{DataAccessError, PayloadStoreError, RequestError, TrustAuthorityError};
