//! # Bus Flows
//!
//! Requests published on `<entity>-<op>-inbound` are answered on
//! `<entity>-<op>-outbound`, with token validation disabled.
//!
//! ## Flows Tested
//!
//! 1. Create → read round trip
//! 2. Update → read reflects the new value
//! 3. Undecodable bodies and missing fields are answered, never dropped
//! 4. Oversize replies use the large-payload reference
//! 5. A panicking processor still answers `OPERATION_FAILED`
//! 6. The bounded worker pool answers every request under load

#[cfg(test)]
mod tests {
    use super::super::support::*;
    use async_trait::async_trait;
    use gateway_core::{
        InMemoryDataStore, LargePayloadStore, Operation, OutboundMessage, RequestProcessor,
        PAYLOAD_REF_HEADER,
    };
    use gateway_runtime::entities::{
        consent_read_validator, consent_write_validator, Consent, ConsentSchema,
    };
    use gateway_runtime::GatewayRuntime;
    use shared_bus::InMemoryMessageBus;
    use shared_types::{EntityId, Status};
    use std::sync::Arc;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct Harness {
        runtime: GatewayRuntime,
        bus: Arc<InMemoryMessageBus>,
        store: Arc<InMemoryDataStore>,
    }

    impl Harness {
        fn start(configure: impl FnOnce(&mut gateway_core::GatewayConfig)) -> Self {
            let mut config = config_with_grants();
            configure(&mut config);

            let bus = Arc::new(InMemoryMessageBus::new());
            let store = Arc::new(InMemoryDataStore::new());
            let mut runtime =
                GatewayRuntime::from_config(config, Arc::clone(&bus), store.clone()).unwrap();
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
            }
        }

        async fn call(&self, op: Operation, key: &str, body: Vec<u8>) -> shared_bus::BusMessage {
            request(
                &self.bus,
                &self.runtime.request_topic("consent", op),
                &self.runtime.reply_topic("consent", op),
                key,
                body,
            )
            .await
        }
    }

    fn consent(id: Option<&str>, status: &str) -> Consent {
        Consent {
            id: id.map(str::to_owned),
            subject_id: "s-42".into(),
            purpose: "analytics".into(),
            status: status.into(),
            granted_at: Some("2024-05-01".into()),
            evidence: None,
            archived: false,
        }
    }

    // =========================================================================
    // CRUD ROUND TRIPS
    // =========================================================================

    #[tokio::test]
    async fn test_create_then_read_over_bus() {
        let h = Harness::start(|_| {});
        let token = Some(unverified_token(WRITER));

        let created = h
            .call(Operation::Create, "k-1", body(consent(None, "active"), token.clone()))
            .await;
        let created = reply::<EntityId>(&created);
        assert_eq!(created.status, Status::Success);
        let id = created.payload.unwrap().id;

        let read = h
            .call(Operation::Read, "k-2", body(EntityId::new(&id), token))
            .await;
        let read = reply::<Consent>(&read);
        assert_eq!(read.status, Status::Success);
        assert_eq!(read.payload, Some(consent(Some(&id), "active")));

        let sys = h.store.sys_columns("consent", &id).unwrap();
        assert_eq!(sys.curr_user.as_deref(), Some("clerk"));
        assert_eq!(sys.source_system.as_deref(), Some("crm"));
    }

    #[tokio::test]
    async fn test_update_then_read_over_bus() {
        let h = Harness::start(|_| {});
        let token = Some(unverified_token(WRITER));
        h.call(Operation::Create, "k-1", body(consent(Some("c-7"), "active"), token.clone()))
            .await;

        let updated = h
            .call(Operation::Update, "k-2", body(consent(Some("c-7"), "revoked"), token.clone()))
            .await;
        assert_eq!(reply::<EntityId>(&updated).status, Status::Success);

        let read = h
            .call(Operation::Read, "k-3", body(EntityId::new("c-7"), token))
            .await;
        assert_eq!(reply::<Consent>(&read).payload.unwrap().status, "revoked");
    }

    #[tokio::test]
    async fn test_reader_cannot_write() {
        let h = Harness::start(|_| {});
        let denied = h
            .call(
                Operation::Create,
                "k-1",
                body(consent(None, "active"), Some(unverified_token(READER))),
            )
            .await;
        assert_eq!(reply::<EntityId>(&denied).status, Status::ForbiddenOperation);
        assert_eq!(h.store.calls(), 0);
    }

    #[tokio::test]
    async fn test_read_miss_over_bus() {
        let h = Harness::start(|_| {});
        let read = h
            .call(
                Operation::Read,
                "k-1",
                body(EntityId::new("missing"), Some(unverified_token(READER))),
            )
            .await;
        let read = reply::<Consent>(&read);
        assert_eq!(read.status, Status::NotFound);
        assert!(read.payload.is_none());
    }

    // =========================================================================
    // MALFORMED INPUT
    // =========================================================================

    #[tokio::test]
    async fn test_undecodable_body_is_answered() {
        let h = Harness::start(|_| {});
        let answer = h.call(Operation::Create, "k-1", b"\x00\x01garbage".to_vec()).await;
        assert_eq!(reply::<EntityId>(&answer).status, Status::ValidationError);
        assert_eq!(h.store.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_required_field_is_validation_error() {
        let h = Harness::start(|_| {});
        let payload = serde_json::json!({ "subjectId": "s-42", "status": "active" });
        let answer = h
            .call(Operation::Create, "k-1", body(payload, Some(unverified_token(WRITER))))
            .await;
        let answer = reply::<EntityId>(&answer);
        assert_eq!(answer.status, Status::ValidationError);
        assert!(answer.details.unwrap().contains("purpose"));
        assert_eq!(h.store.calls(), 0);
    }

    // =========================================================================
    // LARGE PAYLOADS
    // =========================================================================

    #[tokio::test]
    async fn test_oversize_reply_carries_reference() {
        let h = Harness::start(|config| config.response.max_inline_payload_bytes = 24);
        let token = Some(unverified_token(WRITER));
        h.call(Operation::Create, "k-1", body(consent(Some("c-1"), "active"), token.clone()))
            .await;

        let read = h
            .call(Operation::Read, "k-2", body(EntityId::new("c-1"), token))
            .await;
        let reference = read.header(PAYLOAD_REF_HEADER).unwrap().to_string();
        let envelope = reply::<Consent>(&read);
        assert_eq!(envelope.status, Status::Success);
        assert!(envelope.payload.is_none());

        let store = h.runtime.payload_store();
        let bytes = store.take(&reference).await.unwrap();
        let record: Consent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(record, consent(Some("c-1"), "active"));
        assert!(store.take(&reference).await.is_err());
    }

    // =========================================================================
    // FAILURE ISOLATION AND LOAD
    // =========================================================================

    struct PanickingProcessor;

    #[async_trait]
    impl RequestProcessor for PanickingProcessor {
        fn operation(&self) -> Operation {
            Operation::Read
        }

        fn table_name(&self) -> &str {
            "ledger"
        }

        async fn process(&self, _key: &str, _body: &[u8]) -> OutboundMessage {
            panic!("ledger mapping exploded");
        }

        fn fallback(&self, key: &str, details: &str) -> OutboundMessage {
            OutboundMessage {
                key: key.to_string(),
                headers: Default::default(),
                body: serde_json::to_vec(&shared_types::ResponseEnvelope::<()>::failure(
                    Status::OperationFailed,
                    Some(details.to_string()),
                ))
                .unwrap(),
                representation: gateway_core::Representation::Inline,
            }
        }
    }

    #[tokio::test]
    async fn test_panicking_processor_still_answers() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let mut runtime = GatewayRuntime::from_config(
            config_with_grants(),
            Arc::clone(&bus),
            Arc::new(InMemoryDataStore::new()),
        )
        .unwrap();
        runtime.route("ledger", Arc::new(PanickingProcessor));
        runtime.start();

        let answer = request(
            &bus,
            "ledger-read-inbound",
            "ledger-read-outbound",
            "k-1",
            b"{}".to_vec(),
        )
        .await;
        let answer = reply::<serde_json::Value>(&answer);
        assert_eq!(answer.status, Status::OperationFailed);
        assert!(answer.details.unwrap().contains("panic"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_bounded_pool_answers_every_request() {
        let h = Harness::start(|config| config.workers.max_in_flight = 2);
        let token = unverified_token(WRITER);
        let reply_topic = h.runtime.reply_topic("consent", Operation::Create);
        let request_topic = h.runtime.request_topic("consent", Operation::Create);

        let mut replies = h.bus.subscribe(shared_bus::TopicFilter::topics([reply_topic]));
        for i in 0..40 {
            let record = consent(Some(&format!("c-{}", i)), "active");
            shared_bus::MessagePublisher::publish(
                h.bus.as_ref(),
                shared_bus::BusMessage::new(
                    request_topic.clone(),
                    format!("k-{}", i),
                    body(record, Some(token.clone())),
                ),
            )
            .await;
        }

        let mut answered = 0;
        while answered < 40 {
            let message = tokio::time::timeout(std::time::Duration::from_secs(5), replies.recv())
                .await
                .expect("reply within 5s")
                .expect("bus open");
            assert_eq!(reply::<EntityId>(&message).status, Status::Success);
            answered += 1;
        }
        assert_eq!(h.store.row_count("consent"), 40);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_burst_beyond_queue_capacity_is_fully_answered() {
        const BURST: usize = shared_bus::DEFAULT_CHANNEL_CAPACITY + 500;

        let h = Harness::start(|config| config.workers.max_in_flight = 4);
        let token = unverified_token(WRITER);
        let request_topic = h.runtime.request_topic("consent", Operation::Create);
        let mut replies = h.bus.subscribe(shared_bus::TopicFilter::topics([
            h.runtime.reply_topic("consent", Operation::Create),
        ]));

        let producer = {
            let bus = Arc::clone(&h.bus);
            tokio::spawn(async move {
                for i in 0..BURST {
                    let record = consent(Some(&format!("b-{}", i)), "active");
                    let message = shared_bus::BusMessage::new(
                        request_topic.clone(),
                        format!("k-{}", i),
                        body(record, Some(token.clone())),
                    );
                    shared_bus::MessagePublisher::publish(bus.as_ref(), message).await;
                }
            })
        };

        let mut keys = std::collections::HashSet::new();
        while keys.len() < BURST {
            let message = tokio::time::timeout(std::time::Duration::from_secs(10), replies.recv())
                .await
                .expect("reply within 10s")
                .expect("bus open");
            assert_eq!(reply::<EntityId>(&message).status, Status::Success);
            keys.insert(message.key);
        }
        producer.await.unwrap();
        assert_eq!(h.store.row_count("consent"), BURST);
    }
}
