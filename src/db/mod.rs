//! Database layer: per-user Nightscout connection storage.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::models::StoredConnection;
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// Nightscout connection records (keyed by user ID)
    pub const USER_CONNECTIONS: &str = "userConnections";
}

/// Storage errors surfaced to handlers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("connection not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for Nightscout connection credentials, one record per user.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Upsert the user's record, marking it connected and refreshing `lastUpdated`.
    /// Fields not written here are preserved.
    async fn save(&self, user_id: &str, url: &str, api_key: &str) -> Result<(), StoreError>;

    /// Load the user's stored credentials.
    async fn get(&self, user_id: &str) -> Result<StoredConnection, StoreError>;

    /// Remove the user's record. Deleting a missing record succeeds.
    async fn delete(&self, user_id: &str) -> Result<(), StoreError>;
}
