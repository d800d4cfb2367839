//! # Bus Messages
//!
//! A keyed record on a topic. The body is already serialized; the bus never
//! looks inside it.

use std::collections::BTreeMap;

/// A single message travelling over the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Destination topic.
    pub topic: String,
    /// Record key. Opaque to the bus, used for partitioning and logging.
    pub key: String,
    /// Transport headers.
    pub headers: BTreeMap<String, String>,
    /// Serialized body.
    pub body: Vec<u8>,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, key: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            key: key.into(),
            headers: BTreeMap::new(),
            body,
        }
    }

    /// Adds a header, replacing an existing value.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Filter for subscribing to a subset of topics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicFilter {
    /// Topics to receive. Empty means all topics.
    pub topics: Vec<String>,
}

impl TopicFilter {
    /// Receive every topic.
    #[must_use]
    pub fn all() -> Self {
        Self { topics: Vec::new() }
    }

    /// Receive only the given topics.
    #[must_use]
    pub fn topics<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn matches(&self, message: &BusMessage) -> bool {
        self.topics.is_empty() || self.topics.iter().any(|t| *t == message.topic)
    }
}
