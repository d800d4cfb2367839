//! Request-topic routing and the bounded worker pool.
//!
//! Every route owns one subscription on its request topic. Each message is
//! processed on its own task, at most `max_in_flight` at a time per route,
//! and answered on the route's reply topic. While all permits are taken the
//! route stops draining its queue; once the queue is full, request
//! publishers wait instead of losing requests.

use gateway_core::{OutboundMessage, RequestProcessor};
use shared_bus::{BusMessage, InMemoryMessageBus, MessagePublisher, Subscription, TopicFilter};
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// One request topic bound to one processor.
#[derive(Clone)]
pub struct Route {
    pub request_topic: String,
    pub reply_topic: String,
    pub processor: Arc<dyn RequestProcessor>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("request_topic", &self.request_topic)
            .field("reply_topic", &self.reply_topic)
            .field("operation", &self.processor.operation())
            .finish()
    }
}

/// Converts a finished reply into a bus message on `topic`.
pub fn reply_message(topic: &str, reply: OutboundMessage) -> BusMessage {
    let mut message = BusMessage::new(topic, reply.key, reply.body);
    message.headers = reply.headers;
    message
}

/// Subscribes to the route's request topic and spawns its serving loop.
///
/// The subscription is taken before returning, so no request published
/// after this call is missed.
pub fn spawn_route(
    route: Route,
    bus: Arc<InMemoryMessageBus>,
    max_in_flight: usize,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let subscription = bus.subscribe(TopicFilter::topics([route.request_topic.clone()]));
    tokio::spawn(serve(route, bus, subscription, max_in_flight, shutdown))
}

async fn serve(
    route: Route,
    bus: Arc<InMemoryMessageBus>,
    mut subscription: Subscription,
    max_in_flight: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    let permits = Arc::new(Semaphore::new(max_in_flight.max(1)));
    info!(topic = %route.request_topic, max_in_flight, "Route listening");

    loop {
        let message = tokio::select! {
            message = subscription.recv() => message,
            _ = shutdown.changed() => {
                info!(topic = %route.request_topic, "Route shutting down");
                break;
            }
        };
        let Some(message) = message else {
            warn!(topic = %route.request_topic, "Request topic closed");
            break;
        };

        let permit = match Arc::clone(&permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let route = route.clone();
        let bus = Arc::clone(&bus);
        tokio::spawn(async move {
            let _permit = permit;
            let reply = process_isolated(&route, message).await;
            let delivered = bus.publish(reply_message(&route.reply_topic, reply)).await;
            debug!(topic = %route.reply_topic, delivered, "Reply published");
        });
    }
}

/// Runs the processor on its own task so a panic still yields a reply.
async fn process_isolated(route: &Route, message: BusMessage) -> OutboundMessage {
    let processor = Arc::clone(&route.processor);
    let key = message.key.clone();
    let task = tokio::spawn(async move { processor.process(&message.key, &message.body).await });

    match task.await {
        Ok(reply) => reply,
        Err(e) => {
            error!(
                topic = %route.request_topic,
                key = %key,
                error = %e,
                "Request processing aborted"
            );
            route.processor.fallback(&key, &e.to_string())
        }
    }
}
