//! Identity assertions decoded from a bearer token.

use serde::{Deserialize, Serialize};

/// Realm role block as issued by the trust authority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims of one request. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub realm_access: RealmAccess,
}

impl Claims {
    /// Caller identity recorded in audit columns: the username when the
    /// authority issues one, the subject otherwise.
    pub fn subject(&self) -> Option<&str> {
        self.preferred_username
            .as_deref()
            .or(self.sub.as_deref())
    }

    /// Last path segment of the issuer URL.
    pub fn realm(&self) -> Option<&str> {
        self.iss.as_deref().and_then(realm_of_issuer)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.realm_access.roles.iter().any(|r| r == role)
    }
}

pub(crate) fn realm_of_issuer(issuer: &str) -> Option<&str> {
    issuer
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}
