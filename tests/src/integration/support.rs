//! Helpers shared by the bus scenarios.

use gateway_core::{GatewayConfig, Operation, RoleGrant};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use shared_bus::{BusMessage, InMemoryMessageBus, MessagePublisher, TopicFilter};
use shared_types::{Envelope, RequestContext, ResponseEnvelope, SecurityContext};
use std::time::Duration;
use tokio::time::timeout;

pub const SIGNING_KEY: &[u8] =
    include_bytes!("../../../crates/gateway-core/tests/fixtures/test_rsa_private.pem");
pub const OTHER_KEY: &[u8] =
    include_bytes!("../../../crates/gateway-core/tests/fixtures/other_rsa_private.pem");
pub const REALM_KEY: &str =
    include_str!("../../../crates/gateway-core/tests/fixtures/test_realm_public_key.b64");

pub const READER: &[&str] = &["consent-reader"];
pub const WRITER: &[&str] = &["consent-reader", "consent-writer"];

/// Grants matching `READER` and `WRITER`.
pub fn consent_grants() -> Vec<RoleGrant> {
    vec![
        RoleGrant {
            role: "consent-reader".into(),
            table: "consent".into(),
            operations: vec![Operation::Read],
            fields: vec![],
        },
        RoleGrant {
            role: "consent-writer".into(),
            table: "consent".into(),
            operations: vec![Operation::Create, Operation::Update, Operation::Delete],
            fields: vec!["*".into()],
        },
    ]
}

pub fn config_with_grants() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.access.grants = consent_grants();
    config
}

pub fn claims(roles: &[&str], exp: i64) -> Value {
    json!({
        "sub": "7d1e",
        "preferred_username": "clerk",
        "iss": "https://auth.example.org/realms/partners",
        "exp": exp,
        "realm_access": { "roles": roles }
    })
}

pub fn rsa_token(claims: &Value, pem: &[u8]) -> String {
    encode(
        &Header::new(Algorithm::RS256),
        claims,
        &EncodingKey::from_rsa_pem(pem).unwrap(),
    )
    .unwrap()
}

/// Token for gateways running with validation disabled: only its claims
/// matter.
pub fn unverified_token(roles: &[&str]) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &claims(roles, 4_102_444_800),
        &EncodingKey::from_secret(b"unused"),
    )
    .unwrap()
}

pub fn body<T: Serialize>(payload: T, token: Option<String>) -> Vec<u8> {
    let security = token.map(SecurityContext::with_token).unwrap_or_default();
    let context = RequestContext {
        system: Some("crm".into()),
        ..Default::default()
    };
    serde_json::to_vec(&Envelope::new(payload, context, security)).unwrap()
}

/// Publishes a request and waits for the reply carrying the same key.
pub async fn request(
    bus: &InMemoryMessageBus,
    request_topic: &str,
    reply_topic: &str,
    key: &str,
    body: Vec<u8>,
) -> BusMessage {
    let mut replies = bus.subscribe(TopicFilter::topics([reply_topic]));
    bus.publish(BusMessage::new(request_topic, key, body)).await;

    timeout(Duration::from_secs(5), async {
        loop {
            match replies.recv().await {
                Some(message) if message.key == key => return message,
                Some(_) => continue,
                None => panic!("bus closed before reply"),
            }
        }
    })
    .await
    .expect("reply within 5s")
}

pub fn reply<O: DeserializeOwned>(message: &BusMessage) -> ResponseEnvelope<O> {
    serde_json::from_slice(&message.body).unwrap()
}
