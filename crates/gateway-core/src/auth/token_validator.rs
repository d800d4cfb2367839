//! Bearer token validation.
//!
//! ## Steps (validation enabled)
//!
//! | Step | Failure | Kind |
//! |------|---------|------|
//! | Parse claims (empty token included) | `TokenMalformed` | hard |
//! | Expiry against injected clock, missing `exp` = expired | `TokenExpired` | hard |
//! | Issuer realm in allow-list | `IssuerNotTrusted` | hard |
//! | Resolve realm key | `TrustAuthorityUnavailable` | hard |
//! | Verify signature | `Ok(false)` | soft |
//!
//! With validation disabled every security context is accepted.

use super::key_resolver::{KeyResolver, RealmPublicKey};
use crate::domain::{AuthConfig, Claims, RequestError};
use crate::ports::TimeSource;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use shared_types::SecurityContext;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

enum Verdict {
    Bypassed,
    Verified(Claims),
    SignatureInvalid,
}

pub struct TokenValidator {
    enabled: bool,
    trusted_realms: HashSet<String>,
    resolver: Arc<KeyResolver>,
    clock: Arc<dyn TimeSource>,
}

impl TokenValidator {
    pub fn new<I, S>(
        enabled: bool,
        trusted_realms: I,
        resolver: Arc<KeyResolver>,
        clock: Arc<dyn TimeSource>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled,
            trusted_realms: trusted_realms.into_iter().map(Into::into).collect(),
            resolver,
            clock,
        }
    }

    pub fn from_config(
        config: &AuthConfig,
        resolver: Arc<KeyResolver>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self::new(
            config.validation_enabled,
            config.trusted_realms.iter().cloned(),
            resolver,
            clock,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// `Ok(false)` only when the signature is provably invalid.
    pub async fn validate(&self, security: &SecurityContext) -> Result<bool, RequestError> {
        Ok(!matches!(self.check(security).await?, Verdict::SignatureInvalid))
    }

    /// Validates the token and returns the caller's claims.
    ///
    /// With validation disabled the claims are read without verification,
    /// and an unreadable token yields anonymous claims.
    pub async fn authenticate(&self, security: &SecurityContext) -> Result<Claims, RequestError> {
        match self.check(security).await? {
            Verdict::Verified(claims) => Ok(claims),
            Verdict::SignatureInvalid => Err(RequestError::AuthenticationFailed),
            Verdict::Bypassed => Ok(security
                .access_token
                .as_deref()
                .and_then(|token| parse_unverified(token).ok())
                .unwrap_or_default()),
        }
    }

    async fn check(&self, security: &SecurityContext) -> Result<Verdict, RequestError> {
        if !self.enabled {
            return Ok(Verdict::Bypassed);
        }

        let token = security.access_token.as_deref().unwrap_or_default();
        let claims = parse_unverified(token)?;
        self.check_expiry(&claims)?;
        let realm = self.trusted_realm(&claims)?;
        let key = self.resolver.resolve(realm).await?;

        if verify_signature(token, &key) {
            debug!(realm, "Token verified");
            Ok(Verdict::Verified(claims))
        } else {
            Ok(Verdict::SignatureInvalid)
        }
    }

    fn check_expiry(&self, claims: &Claims) -> Result<(), RequestError> {
        match claims.exp {
            Some(exp) if exp > self.clock.now() => Ok(()),
            _ => Err(RequestError::TokenExpired),
        }
    }

    fn trusted_realm<'c>(&self, claims: &'c Claims) -> Result<&'c str, RequestError> {
        let realm = claims
            .realm()
            .ok_or_else(|| RequestError::IssuerNotTrusted("token has no issuer".into()))?;
        if self.trusted_realms.contains(realm) {
            Ok(realm)
        } else {
            warn!(realm, "Rejected token from untrusted realm");
            Err(RequestError::IssuerNotTrusted(realm.to_string()))
        }
    }
}

/// Reads claims without checking the signature or any registered claim.
fn parse_unverified(token: &str) -> Result<Claims, RequestError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| RequestError::TokenMalformed(e.to_string()))
}

fn is_rsa(alg: Algorithm) -> bool {
    matches!(
        alg,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

fn verify_signature(token: &str, key: &RealmPublicKey) -> bool {
    let header = match decode_header(token) {
        Ok(header) => header,
        Err(e) => {
            warn!(realm = %key.realm, error = %e, "Token header unreadable");
            return false;
        }
    };
    if !is_rsa(header.alg) {
        warn!(realm = %key.realm, alg = ?header.alg, "Token not signed with an RSA algorithm");
        return false;
    }

    let mut validation = Validation::new(header.alg);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match decode::<serde_json::Value>(token, key.decoding_key(), &validation) {
        Ok(_) => true,
        Err(e) => {
            warn!(realm = %key.realm, error = %e, "Token signature verification failed");
            false
        }
    }
}
