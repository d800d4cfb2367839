//! # Bus Gateway Runtime
//!
//! Wires the gateway component graph and serves it over the message bus.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file + environment), validate
//! 2. Build shared collaborators: key cache, token validator, access
//!    evaluator, audit observer, response builder
//! 3. Register entities: one dispatch listener per entity and operation
//! 4. Subscribe each listener to `<entity>-<op>-inbound`, reply on
//!    `<entity>-<op>-outbound`
//!
//! ## Collaborator Graph
//!
//! ```text
//! KeycloakClient ─→ KeyResolver(KeyCache) ─→ TokenValidator ─┐
//! RoleAccessEvaluator ──────────────────────────────────────├─→ HandlerContext ─→ handlers
//! DataAccessPort ───────────────────────────────────────────┤
//! TracingAuditObserver ─────────────────────────────────────┘
//! LargePayloadStore ─→ ResponseBuilder ─→ DispatchListener (all routes)
//! ```

pub mod config;
pub mod entities;
pub mod router;

use anyhow::{Context, Result};
use gateway_core::{
    CommandHandler, DataAccessPort, DispatchListener, EntitySchema, GatewayConfig,
    HandlerContext, InMemoryPayloadStore, InputValidator, KeyCache, KeyResolver, KeycloakClient,
    LargePayloadStore, Operation, ReadHandler, RequestProcessor, ResponseBuilder,
    RoleAccessEvaluator, SystemTimeSource, TokenValidator, TracingAuditObserver,
};
use router::{spawn_route, Route};
use shared_bus::InMemoryMessageBus;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The running gateway: its routes, shared collaborators and bus.
pub struct GatewayRuntime {
    config: GatewayConfig,
    bus: Arc<InMemoryMessageBus>,
    ctx: HandlerContext,
    responses: Arc<ResponseBuilder>,
    payloads: Arc<dyn LargePayloadStore>,
    keys: Arc<KeyCache>,
    routes: Vec<Route>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewayRuntime {
    /// Builds the default component graph around a data access port.
    pub fn from_config(
        config: GatewayConfig,
        bus: Arc<InMemoryMessageBus>,
        port: Arc<dyn DataAccessPort>,
    ) -> Result<Self> {
        config.validate().context("Invalid gateway configuration")?;

        if config.auth.validation_enabled {
            info!(
                realms = ?config.auth.trusted_realms,
                authority = %config.auth.trust_authority_url,
                "Token validation enabled"
            );
        } else {
            warn!("Token validation is DISABLED: every request is accepted without a verified token");
        }

        let authority = KeycloakClient::from_config(&config.auth)
            .context("Failed to build trust authority client")?;
        let keys = Arc::new(KeyCache::new());
        let resolver = Arc::new(KeyResolver::new(Arc::new(authority), Arc::clone(&keys)));
        let validator = Arc::new(TokenValidator::from_config(
            &config.auth,
            resolver,
            Arc::new(SystemTimeSource),
        ));

        let ctx = HandlerContext {
            validator,
            access: Arc::new(RoleAccessEvaluator::new(config.access.grants.clone())),
            port,
            audit: Arc::new(TracingAuditObserver),
        };
        let payloads: Arc<dyn LargePayloadStore> = Arc::new(InMemoryPayloadStore::new());

        Ok(Self::new(config, bus, ctx, payloads, keys))
    }

    /// Builds a runtime from explicit collaborators.
    pub fn new(
        config: GatewayConfig,
        bus: Arc<InMemoryMessageBus>,
        ctx: HandlerContext,
        payloads: Arc<dyn LargePayloadStore>,
        keys: Arc<KeyCache>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let responses = Arc::new(ResponseBuilder::new(
            &config.response,
            Arc::clone(&payloads),
        ));
        Self {
            config,
            bus,
            ctx,
            responses,
            payloads,
            keys,
            routes: Vec::new(),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Registers read, create, update and delete listeners for an entity.
    pub fn register_entity<E: EntitySchema>(
        &mut self,
        entity: &str,
        schema: Arc<E>,
        read_validator: Arc<dyn InputValidator<E::Id>>,
        write_validator: Arc<dyn InputValidator<E::Record>>,
    ) {
        let read = DispatchListener::new(
            ReadHandler::new(Arc::clone(&schema), self.ctx.clone()),
            read_validator,
            Arc::clone(&self.responses),
        );
        self.route(entity, Arc::new(read));

        for handler in [
            CommandHandler::create(Arc::clone(&schema), self.ctx.clone()),
            CommandHandler::update(Arc::clone(&schema), self.ctx.clone()),
            CommandHandler::delete(Arc::clone(&schema), self.ctx.clone()),
        ] {
            let listener = DispatchListener::new(
                handler,
                Arc::clone(&write_validator),
                Arc::clone(&self.responses),
            );
            self.route(entity, Arc::new(listener));
        }
    }

    /// Binds a processor to `<entity>-<op>` request and reply topics.
    pub fn route(&mut self, entity: &str, processor: Arc<dyn RequestProcessor>) {
        let op = processor.operation();
        self.routes.push(Route {
            request_topic: self.config.topics.request_topic(entity, op),
            reply_topic: self.config.topics.reply_topic(entity, op),
            processor,
        });
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn request_topic(&self, entity: &str, op: Operation) -> String {
        self.config.topics.request_topic(entity, op)
    }

    pub fn reply_topic(&self, entity: &str, op: Operation) -> String {
        self.config.topics.reply_topic(entity, op)
    }

    pub fn bus(&self) -> Arc<InMemoryMessageBus> {
        Arc::clone(&self.bus)
    }

    /// Store holding out-of-band reply payloads. Consumers resolve the
    /// `x-payload-ref` header of a reply with `take`.
    pub fn payload_store(&self) -> Arc<dyn LargePayloadStore> {
        Arc::clone(&self.payloads)
    }

    /// Realm key cache, exposed for explicit eviction on key rotation.
    pub fn key_cache(&self) -> Arc<KeyCache> {
        Arc::clone(&self.keys)
    }

    /// Starts serving every registered route.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let handles: Vec<_> = self
            .routes
            .iter()
            .map(|route| {
                spawn_route(
                    route.clone(),
                    Arc::clone(&self.bus),
                    self.config.workers.max_in_flight,
                    self.shutdown_rx.clone(),
                )
            })
            .collect();
        info!(routes = handles.len(), "Gateway routes started");
        handles
    }

    /// Signals every route loop to stop taking new requests.
    pub fn shutdown(&self) {
        if self.shutdown_tx.send(true).is_err() {
            warn!("No route was listening for shutdown");
        }
    }
}
