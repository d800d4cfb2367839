//! Keycloak-style trust authority.
//!
//! `GET {base_url}/realms/{realm}` answers with the realm descriptor, whose
//! `public_key` is the base64 SubjectPublicKeyInfo of the realm signing key.

use crate::domain::{AuthConfig, TrustAuthorityError};
use crate::ports::TrustAuthority;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RealmDescriptor {
    #[serde(default)]
    public_key: Option<String>,
}

/// Extracts the `public_key` of a realm descriptor body.
pub fn parse_realm_key(body: &str) -> Result<String, TrustAuthorityError> {
    let descriptor: RealmDescriptor = serde_json::from_str(body)
        .map_err(|e| TrustAuthorityError::Malformed(format!("realm descriptor: {}", e)))?;
    descriptor
        .public_key
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| TrustAuthorityError::Malformed("realm descriptor has no public_key".into()))
}

pub struct KeycloakClient {
    http: reqwest::Client,
    base_url: String,
}

impl KeycloakClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TrustAuthorityError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrustAuthorityError::Unreachable(format!("http client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, TrustAuthorityError> {
        Self::new(config.trust_authority_url.clone(), config.request_timeout)
    }

    pub fn realm_url(&self, realm: &str) -> String {
        format!("{}/realms/{}", self.base_url, realm)
    }
}

#[async_trait]
impl TrustAuthority for KeycloakClient {
    async fn fetch_realm_key(&self, realm: &str) -> Result<String, TrustAuthorityError> {
        let url = self.realm_url(realm);
        debug!(realm, url = %url, "Requesting realm descriptor");

        let body = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TrustAuthorityError::Unreachable(format!("{}: {}", url, e)))?
            .error_for_status()
            .map_err(|e| TrustAuthorityError::Unreachable(format!("{}: {}", url, e)))?
            .text()
            .await
            .map_err(|e| TrustAuthorityError::Unreachable(format!("{}: {}", url, e)))?;

        parse_realm_key(&body)
    }
}
