//! Realm verification keys, fetched lazily and cached per realm.
//!
//! The cache has no expiry. Rotation is handled by `KeyCache::evict`, after
//! which the next request for the realm fetches again.

use crate::domain::TrustAuthorityError;
use crate::ports::TrustAuthority;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dashmap::DashMap;
use jsonwebtoken::DecodingKey;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// A realm's signing key in both raw and verification-ready form.
#[derive(Clone)]
pub struct RealmPublicKey {
    pub realm: String,
    /// SubjectPublicKeyInfo DER
    pub der: Vec<u8>,
    decoding_key: DecodingKey,
}

impl RealmPublicKey {
    /// Parses the base64 SubjectPublicKeyInfo a trust authority publishes.
    pub fn from_base64_spki(realm: &str, encoded: &str) -> Result<Self, TrustAuthorityError> {
        let der = STANDARD
            .decode(encoded.trim())
            .map_err(|e| TrustAuthorityError::Malformed(format!("realm {}: {}", realm, e)))?;
        if der.is_empty() {
            return Err(TrustAuthorityError::Malformed(format!(
                "realm {}: empty key",
                realm
            )));
        }

        let pem = spki_pem(&der);
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| TrustAuthorityError::Malformed(format!("realm {}: {}", realm, e)))?;

        Ok(Self {
            realm: realm.to_string(),
            der,
            decoding_key,
        })
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for RealmPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealmPublicKey")
            .field("realm", &self.realm)
            .field("der_len", &self.der.len())
            .finish()
    }
}

fn spki_pem(der: &[u8]) -> String {
    let body = STANDARD.encode(der);
    let mut pem = String::with_capacity(body.len() + body.len() / 64 + 64);
    pem.push_str("-----BEGIN PUBLIC KEY-----\n");
    let mut start = 0;
    while start < body.len() {
        let end = (start + 64).min(body.len());
        pem.push_str(&body[start..end]);
        pem.push('\n');
        start = end;
    }
    pem.push_str("-----END PUBLIC KEY-----\n");
    pem
}

type Slot = Arc<OnceCell<Arc<RealmPublicKey>>>;

/// Process-wide realm → key cache.
///
/// Each realm owns its own once-cell, so a slow fetch for one realm never
/// blocks lookups of another, and concurrent misses on the same realm share
/// one fetch. A failed fetch leaves the slot empty.
#[derive(Default)]
pub struct KeyCache {
    entries: DashMap<String, Slot>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached key, if one has been resolved.
    pub fn get(&self, realm: &str) -> Option<Arc<RealmPublicKey>> {
        self.entries
            .get(realm)
            .and_then(|slot| slot.get().cloned())
    }

    /// Drops the realm's key. Returns whether a key was cached.
    pub fn evict(&self, realm: &str) -> bool {
        self.entries
            .remove(realm)
            .map(|(_, slot)| slot.initialized())
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of realms with a resolved key.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, realm: &str) -> Slot {
        // Clone out so the shard lock is released before any await.
        self.entries
            .entry(realm.to_string())
            .or_default()
            .value()
            .clone()
    }
}

/// Resolves realm keys through the cache, falling back to the authority.
pub struct KeyResolver {
    authority: Arc<dyn TrustAuthority>,
    cache: Arc<KeyCache>,
}

impl KeyResolver {
    pub fn new(authority: Arc<dyn TrustAuthority>, cache: Arc<KeyCache>) -> Self {
        Self { authority, cache }
    }

    pub fn cache(&self) -> &Arc<KeyCache> {
        &self.cache
    }

    pub async fn resolve(&self, realm: &str) -> Result<Arc<RealmPublicKey>, TrustAuthorityError> {
        if let Some(key) = self.cache.get(realm) {
            return Ok(key);
        }

        let slot = self.cache.slot(realm);
        let key = slot
            .get_or_try_init(|| async {
                debug!(realm, "Fetching realm public key");
                let encoded = self.authority.fetch_realm_key(realm).await.map_err(|e| {
                    warn!(realm, error = %e, "Realm public key fetch failed");
                    e
                })?;
                let key = RealmPublicKey::from_base64_spki(realm, &encoded)?;
                info!(realm, "Cached realm public key");
                Ok::<_, TrustAuthorityError>(Arc::new(key))
            })
            .await?;

        Ok(Arc::clone(key))
    }
}
