//! Gateway configuration with validation.
//!
//! Loaded once at process start; see `gateway-runtime` for the file and
//! environment layers.

use super::entity::Operation;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Token validation and trust authority
    pub auth: AuthConfig,
    /// Role grants consumed by the default access evaluator
    pub access: AccessConfig,
    /// Outbound message construction
    pub response: ResponseConfig,
    /// Worker pool sizing
    pub workers: WorkerConfig,
    /// Request/reply topic naming
    pub topics: TopicConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.validation_enabled && self.auth.trusted_realms.is_empty() {
            return Err(ConfigError::EmptyRealmAllowList);
        }

        if self.auth.validation_enabled && self.auth.trust_authority_url.trim().is_empty() {
            return Err(ConfigError::MissingTrustAuthority);
        }

        if self.auth.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "auth.request_timeout cannot be 0".into(),
            ));
        }

        if self.response.max_inline_payload_bytes == 0 {
            return Err(ConfigError::InvalidLimit(
                "response.max_inline_payload_bytes cannot be 0".into(),
            ));
        }

        if self.workers.max_in_flight == 0 {
            return Err(ConfigError::InvalidLimit(
                "workers.max_in_flight cannot be 0".into(),
            ));
        }

        if self.topics.inbound_suffix == self.topics.outbound_suffix {
            return Err(ConfigError::TopicCollision(self.topics.inbound_suffix.clone()));
        }

        Ok(())
    }
}

/// Token validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Master switch. When off every token is accepted.
    pub validation_enabled: bool,
    /// Realms whose issuers are trusted
    pub trusted_realms: Vec<String>,
    /// Base URL of the realm-key authority
    pub trust_authority_url: String,
    /// Timeout of a single realm key fetch
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            validation_enabled: false,
            trusted_realms: Vec::new(),
            trust_authority_url: String::new(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// One role's grant on one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: String,
    pub table: String,
    pub operations: Vec<Operation>,
    /// Granted columns; empty or `"*"` grants every column.
    #[serde(default)]
    pub fields: Vec<String>,
}

impl RoleGrant {
    pub const ALL_FIELDS: &'static str = "*";

    pub fn covers_all_fields(&self) -> bool {
        self.fields.is_empty() || self.fields.iter().any(|f| f == Self::ALL_FIELDS)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub grants: Vec<RoleGrant>,
}

/// What the inline size threshold is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSizeCriterion {
    /// Serialized payload alone
    #[default]
    Payload,
    /// Whole serialized response envelope
    Envelope,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Largest payload sent inline (bytes)
    pub max_inline_payload_bytes: usize,
    pub criterion: PayloadSizeCriterion,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            max_inline_payload_bytes: 1024 * 1024,
            criterion: PayloadSizeCriterion::Payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Concurrent requests per request topic
    pub max_in_flight: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { max_in_flight: 16 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    pub inbound_suffix: String,
    pub outbound_suffix: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            inbound_suffix: "inbound".into(),
            outbound_suffix: "outbound".into(),
        }
    }
}

impl TopicConfig {
    /// `<entity>-<op>-<inbound suffix>`
    pub fn request_topic(&self, entity: &str, op: Operation) -> String {
        format!("{}-{}-{}", entity, op, self.inbound_suffix)
    }

    /// `<entity>-<op>-<outbound suffix>`
    pub fn reply_topic(&self, entity: &str, op: Operation) -> String {
        format!("{}-{}-{}", entity, op, self.outbound_suffix)
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Token validation is enabled but no trusted realm is configured")]
    EmptyRealmAllowList,
    #[error("Token validation is enabled but no trust authority URL is configured")]
    MissingTrustAuthority,
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
    #[error("Request and reply topics share the suffix '{0}'")]
    TopicCollision(String),
}
