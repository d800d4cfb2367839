//! # Auth Flows
//!
//! Bus requests against a gateway with token validation enabled. The realm
//! key comes from a scripted trust authority so fetches can be counted and
//! the authority can be taken down mid-test.
//!
//! ## Flows Tested
//!
//! 1. A correctly signed token creates and reads
//! 2. Expired, forged and untrusted tokens are rejected before storage
//! 3. An unreachable authority maps to `THIRD_PARTY_SERVICE_UNAVAILABLE`
//! 4. Realm keys are fetched once and refetched after eviction

#[cfg(test)]
mod tests {
    use super::super::support::*;
    use async_trait::async_trait;
    use gateway_core::{
        FixedTimeSource, HandlerContext, InMemoryDataStore, InMemoryPayloadStore, KeyCache,
        KeyResolver, LargePayloadStore, Operation, RoleAccessEvaluator,
        TokenValidator, TracingAuditObserver, TrustAuthority, TrustAuthorityError,
    };
    use gateway_runtime::entities::{
        consent_read_validator, consent_write_validator, Consent, ConsentSchema,
    };
    use gateway_runtime::GatewayRuntime;
    use serde_json::Value;
    use shared_bus::{BusMessage, InMemoryMessageBus};
    use shared_types::{EntityId, Status};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    const NOW: i64 = 1_700_000_000;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    #[derive(Default)]
    struct ScriptedAuthority {
        fetches: AtomicUsize,
        down: AtomicBool,
    }

    #[async_trait]
    impl TrustAuthority for ScriptedAuthority {
        async fn fetch_realm_key(&self, realm: &str) -> Result<String, TrustAuthorityError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                return Err(TrustAuthorityError::Unreachable(format!(
                    "connection refused for realm {}",
                    realm
                )));
            }
            Ok(REALM_KEY.trim().to_string())
        }
    }

    struct SecuredGateway {
        runtime: GatewayRuntime,
        bus: Arc<InMemoryMessageBus>,
        store: Arc<InMemoryDataStore>,
        authority: Arc<ScriptedAuthority>,
    }

    impl SecuredGateway {
        fn start() -> Self {
            let mut config = config_with_grants();
            config.auth.validation_enabled = true;
            config.auth.trusted_realms = vec!["partners".into()];
            config.auth.trust_authority_url = "http://authority.invalid".into();

            let bus = Arc::new(InMemoryMessageBus::new());
            let store = Arc::new(InMemoryDataStore::new());
            let authority = Arc::new(ScriptedAuthority::default());
            let keys = Arc::new(KeyCache::new());
            let resolver = Arc::new(KeyResolver::new(authority.clone(), Arc::clone(&keys)));

            let ctx = HandlerContext {
                validator: Arc::new(TokenValidator::new(
                    true,
                    ["partners"],
                    resolver,
                    Arc::new(FixedTimeSource::new(NOW)),
                )),
                access: Arc::new(RoleAccessEvaluator::new(consent_grants())),
                port: store.clone(),
                audit: Arc::new(TracingAuditObserver),
            };
            let payloads: Arc<dyn LargePayloadStore> = Arc::new(InMemoryPayloadStore::new());

            let mut runtime = GatewayRuntime::new(config, Arc::clone(&bus), ctx, payloads, keys);
            runtime.register_entity(
                ConsentSchema::ENTITY,
                Arc::new(ConsentSchema),
                consent_read_validator(),
                consent_write_validator(),
            );
            runtime.start();

            Self {
                runtime,
                bus,
                store,
                authority,
            }
        }

        async fn call(&self, op: Operation, key: &str, body: Vec<u8>) -> BusMessage {
            request(
                &self.bus,
                &self.runtime.request_topic("consent", op),
                &self.runtime.reply_topic("consent", op),
                key,
                body,
            )
            .await
        }

        fn fetches(&self) -> usize {
            self.authority.fetches.load(Ordering::SeqCst)
        }
    }

    fn consent(id: &str) -> Consent {
        Consent {
            id: Some(id.into()),
            subject_id: "s-9".into(),
            purpose: "research".into(),
            status: "active".into(),
            granted_at: None,
            evidence: None,
            archived: false,
        }
    }

    fn signed(roles: &[&str], exp: i64) -> Option<String> {
        Some(rsa_token(&claims(roles, exp), SIGNING_KEY))
    }

    // =========================================================================
    // ACCEPTED TOKENS
    // =========================================================================

    #[tokio::test]
    async fn test_signed_token_creates_and_reads() {
        let gw = SecuredGateway::start();
        let token = signed(WRITER, NOW + 3600);

        let created = gw
            .call(Operation::Create, "k-1", body(consent("c-1"), token.clone()))
            .await;
        assert_eq!(reply::<EntityId>(&created).status, Status::Success);

        let read = gw
            .call(Operation::Read, "k-2", body(EntityId::new("c-1"), token))
            .await;
        let read = reply::<Consent>(&read);
        assert_eq!(read.status, Status::Success);
        assert_eq!(read.payload, Some(consent("c-1")));

        // One realm, one fetch.
        assert_eq!(gw.fetches(), 1);
    }

    // =========================================================================
    // REJECTED TOKENS
    // =========================================================================

    #[tokio::test]
    async fn test_expired_token_never_reaches_storage() {
        let gw = SecuredGateway::start();
        let answer = gw
            .call(
                Operation::Create,
                "k-1",
                body(consent("c-1"), signed(WRITER, NOW - 1)),
            )
            .await;
        assert_eq!(reply::<EntityId>(&answer).status, Status::JwtExpired);
        assert_eq!(gw.store.calls(), 0);
    }

    #[tokio::test]
    async fn test_forged_token_is_invalid() {
        let gw = SecuredGateway::start();
        let forged = Some(rsa_token(&claims(WRITER, NOW + 3600), OTHER_KEY));
        let answer = gw
            .call(Operation::Create, "k-1", body(consent("c-1"), forged))
            .await;
        assert_eq!(reply::<EntityId>(&answer).status, Status::JwtInvalid);
        assert_eq!(gw.store.calls(), 0);
    }

    #[tokio::test]
    async fn test_untrusted_realm_is_rejected_without_fetch() {
        let gw = SecuredGateway::start();
        let mut foreign = claims(WRITER, NOW + 3600);
        foreign["iss"] = Value::from("https://auth.example.org/realms/elsewhere");
        let token = Some(rsa_token(&foreign, SIGNING_KEY));

        let answer = gw
            .call(Operation::Read, "k-1", body(EntityId::new("c-1"), token))
            .await;
        assert_eq!(reply::<Consent>(&answer).status, Status::JwtInvalid);
        assert_eq!(gw.fetches(), 0);
        assert_eq!(gw.store.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_token_is_invalid() {
        let gw = SecuredGateway::start();
        let answer = gw
            .call(Operation::Read, "k-1", body(EntityId::new("c-1"), None))
            .await;
        assert_eq!(reply::<Consent>(&answer).status, Status::JwtInvalid);
    }

    // =========================================================================
    // TRUST AUTHORITY
    // =========================================================================

    #[tokio::test]
    async fn test_authority_down_is_third_party_failure() {
        let gw = SecuredGateway::start();
        gw.authority.down.store(true, Ordering::SeqCst);

        let answer = gw
            .call(
                Operation::Read,
                "k-1",
                body(EntityId::new("c-1"), signed(READER, NOW + 3600)),
            )
            .await;
        let answer = reply::<Consent>(&answer);
        assert_eq!(answer.status, Status::ThirdPartyServiceUnavailable);
        assert!(answer.details.unwrap().contains("connection refused"));
        assert_eq!(gw.store.calls(), 0);
    }

    #[tokio::test]
    async fn test_eviction_forces_refetch() {
        let gw = SecuredGateway::start();
        let token = signed(READER, NOW + 3600);

        gw.call(Operation::Read, "k-1", body(EntityId::new("c-1"), token.clone()))
            .await;
        gw.call(Operation::Read, "k-2", body(EntityId::new("c-1"), token.clone()))
            .await;
        assert_eq!(gw.fetches(), 1);

        assert!(gw.runtime.key_cache().evict("partners"));
        let answer = gw
            .call(Operation::Read, "k-3", body(EntityId::new("c-1"), token))
            .await;
        assert_eq!(reply::<Consent>(&answer).status, Status::NotFound);
        assert_eq!(gw.fetches(), 2);
    }
}
