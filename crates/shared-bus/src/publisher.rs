//! # Message Publisher
//!
//! Publishing side of the bus. Every subscription owns a bounded queue;
//! `publish` routes a message to the queues whose filter matches and waits
//! while a queue is full, so a slow consumer slows its producers instead of
//! losing messages.

use crate::message::{BusMessage, TopicFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Trait for publishing messages to the bus.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish a message.
    ///
    /// Returns the number of subscriptions the message was queued for.
    async fn publish(&self, message: BusMessage) -> usize;

    /// Total number of messages published.
    fn messages_published(&self) -> u64;
}

/// Queue and filter of one live subscription.
pub(crate) struct Route {
    filter: TopicFilter,
    queue: mpsc::Sender<BusMessage>,
}

/// Live subscriptions by id.
pub(crate) type Routes = RwLock<HashMap<u64, Route>>;

/// In-memory implementation of the bus.
///
/// A partitioned broker (e.g. Kafka) replaces this in distributed deployments.
pub struct InMemoryMessageBus {
    routes: Arc<Routes>,
    next_id: AtomicU64,
    messages_published: AtomicU64,
    /// Per-subscription queue capacity.
    capacity: usize,
}

impl InMemoryMessageBus {
    /// Create a new bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new bus whose subscriptions buffer `capacity` messages.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            messages_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to messages matching a filter.
    ///
    /// Only messages published after this call are delivered.
    #[must_use]
    pub fn subscribe(&self, filter: TopicFilter) -> Subscription {
        let (queue, receiver) = mpsc::channel(self.capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.routes.write().insert(
            id,
            Route {
                filter: filter.clone(),
                queue,
            },
        );

        debug!(subscription = id, topics = ?filter.topics, "New subscription created");

        Subscription::new(id, receiver, filter, Arc::downgrade(&self.routes))
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.routes.read().len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn targets(&self, message: &BusMessage) -> Vec<(u64, mpsc::Sender<BusMessage>)> {
        self.routes
            .read()
            .iter()
            .filter(|(_, route)| route.filter.matches(message))
            .map(|(id, route)| (*id, route.queue.clone()))
            .collect()
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryMessageBus {
    async fn publish(&self, message: BusMessage) -> usize {
        self.messages_published.fetch_add(1, Ordering::Relaxed);

        let targets = self.targets(&message);
        if targets.is_empty() {
            warn!(
                topic = %message.topic,
                key = %message.key,
                "Message dropped (no subscribers)"
            );
            return 0;
        }

        let mut delivered = 0;
        for (id, queue) in targets {
            if queue.capacity() == 0 {
                debug!(subscription = id, topic = %message.topic, "Subscriber queue full, waiting");
            }
            match queue.send(message.clone()).await {
                Ok(()) => delivered += 1,
                // Receiver dropped between lookup and send.
                Err(_) => debug!(subscription = id, "Subscription closed during publish"),
            }
        }

        debug!(
            topic = %message.topic,
            key = %message.key,
            delivered,
            "Message published"
        );
        delivered
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}
