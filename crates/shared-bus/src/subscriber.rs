//! # Subscriptions
//!
//! The receiving side of the bus.

use crate::message::{BusMessage, TopicFilter};
use crate::publisher::Routes;
use std::sync::Weak;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was closed.
    #[error("Message bus closed")]
    Closed,
}

/// A subscription handle with its own bounded queue.
///
/// Dropping it unregisters the queue, so publishers stop waiting on it.
pub struct Subscription {
    id: u64,
    receiver: mpsc::Receiver<BusMessage>,
    filter: TopicFilter,
    routes: Weak<Routes>,
}

impl Subscription {
    pub(crate) fn new(
        id: u64,
        receiver: mpsc::Receiver<BusMessage>,
        filter: TopicFilter,
        routes: Weak<Routes>,
    ) -> Self {
        Self {
            id,
            receiver,
            filter,
            routes,
        }
    }

    /// Next queued message, in publish order.
    ///
    /// Returns `None` once the bus has been dropped and the queue is drained.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.receiver.recv().await
    }

    /// Receive without blocking.
    ///
    /// - `Ok(Some(message))`: a message was queued
    /// - `Ok(None)`: nothing queued
    /// - `Err(SubscriptionError::Closed)`: the bus was closed
    pub fn try_recv(&mut self) -> Result<Option<BusMessage>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SubscriptionError::Closed),
        }
    }

    /// Messages waiting in this subscription's queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    #[must_use]
    pub fn filter(&self) -> &TopicFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(routes) = self.routes.upgrade() {
            routes.write().remove(&self.id);
        }
        debug!(subscription = self.id, topics = ?self.filter.topics, "Subscription dropped");
    }
}
