//! Adapters implementing the outbound ports.

pub mod audit;
pub mod keycloak;
pub mod memory_store;
pub mod payload_store;

pub use audit::TracingAuditObserver;
pub use keycloak::{parse_realm_key, KeycloakClient};
pub use memory_store::{InMemoryDataStore, StoredRecord};
pub use payload_store::InMemoryPayloadStore;
