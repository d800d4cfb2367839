//! # Shared Bus - Keyed Message Transport
//!
//! In-memory stand-in for the partitioned event-messaging transport the
//! gateway listens on.
//!
//! ## Model
//!
//! ```text
//! ┌──────────────┐   publish(topic, key, body)   ┌──────────────┐
//! │   Producer   │ ────────────┐                 │   Listener   │
//! └──────────────┘             ▼                 └──────────────┘
//!                     ┌──────────────────┐              ↑
//!                     │ InMemoryMessageBus│ ────────────┘
//!                     └──────────────────┘  subscribe(filter)
//! ```
//!
//! - Messages are opaque byte bodies addressed by topic and key.
//! - Headers carry transport-level metadata (e.g. large payload references).
//! - Each subscription owns a bounded queue. A full queue makes publishers
//!   wait; messages are never skipped.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod message;
pub mod publisher;
pub mod subscriber;

pub use message::{BusMessage, TopicFilter};
pub use publisher::{InMemoryMessageBus, MessagePublisher};
pub use subscriber::{Subscription, SubscriptionError};

/// Messages buffered per subscription before publishers wait.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
