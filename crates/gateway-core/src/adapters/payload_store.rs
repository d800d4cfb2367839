//! In-memory large payload store.

use crate::domain::PayloadStoreError;
use crate::ports::LargePayloadStore;
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryPayloadStore {
    entries: DashMap<String, Vec<u8>>,
    /// Largest accepted payload; unlimited when `None`
    max_bytes: Option<usize>,
}

impl InMemoryPayloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_bytes: Some(max_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remove(&self, reference: &str) -> bool {
        self.entries.remove(reference).is_some()
    }
}

#[async_trait]
impl LargePayloadStore for InMemoryPayloadStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<String, PayloadStoreError> {
        if let Some(max) = self.max_bytes {
            if bytes.len() > max {
                return Err(PayloadStoreError::Rejected(format!(
                    "{} bytes exceeds the {} byte limit",
                    bytes.len(),
                    max
                )));
            }
        }
        let reference = Uuid::new_v4().to_string();
        self.entries.insert(reference.clone(), bytes);
        Ok(reference)
    }

    async fn get(&self, reference: &str) -> Result<Vec<u8>, PayloadStoreError> {
        self.entries
            .get(reference)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| PayloadStoreError::UnknownReference(reference.to_string()))
    }

    async fn take(&self, reference: &str) -> Result<Vec<u8>, PayloadStoreError> {
        self.entries
            .remove(reference)
            .map(|(_, bytes)| bytes)
            .ok_or_else(|| PayloadStoreError::UnknownReference(reference.to_string()))
    }
}
