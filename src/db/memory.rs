//! In-memory connection store for local development and tests.

use crate::db::{ConnectionStore, StoreError};
use crate::models::{ConnectionRecord, StoredConnection};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Connection store backed by a process-local map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<DashMap<String, ConnectionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full stored record, including `connected` and `lastUpdated`.
    pub fn record(&self, user_id: &str) -> Option<ConnectionRecord> {
        self.records.get(user_id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn save(&self, user_id: &str, url: &str, api_key: &str) -> Result<(), StoreError> {
        let mut record = self.records.entry(user_id.to_string()).or_default();
        record.url = url.to_string();
        record.api_key = api_key.to_string();
        record.connected = true;
        record.last_updated = Some(chrono::Utc::now());
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<StoredConnection, StoreError> {
        self.records
            .get(user_id)
            .map(|r| StoredConnection::from(r.clone()))
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        self.records.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_get_returns_same_pair() {
        let store = MemoryStore::new();
        store.save("u1", "https://example.com", "k").await.unwrap();

        let conn = store.get("u1").await.unwrap();
        assert_eq!(conn.url, "https://example.com");
        assert_eq!(conn.api_key, "k");

        let record = store.record("u1").unwrap();
        assert!(record.connected);
        assert!(record.last_updated.is_some());
    }

    #[tokio::test]
    async fn save_overwrites_credentials() {
        let store = MemoryStore::new();
        store.save("u1", "https://old.example.com", "old").await.unwrap();
        store.save("u1", "https://new.example.com", "").await.unwrap();

        let conn = store.get("u1").await.unwrap();
        assert_eq!(conn.url, "https://new.example.com");
        assert_eq!(conn.api_key, "");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.get("nobody").await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.save("u1", "https://example.com", "").await.unwrap();

        store.delete("u1").await.unwrap();
        store.delete("u1").await.unwrap();
        store.delete("never-existed").await.unwrap();

        assert!(store.is_empty());
        assert!(matches!(store.get("u1").await, Err(StoreError::NotFound)));
    }
}
