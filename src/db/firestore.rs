// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed connection store.

use crate::db::{collections, ConnectionStore, StoreError};
use crate::models::{ConnectionRecord, StoredConnection};
use async_trait::async_trait;

/// Fields written on save; everything else on the document is left alone.
const SAVE_FIELDS: [&str; 3] = ["nightscoutUrl", "nightscoutApiKey", "connected"];
const LAST_UPDATED_FIELD: &str = "lastUpdated";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// Credentials come from `GOOGLE_APPLICATION_CREDENTIALS` or the ambient
    /// environment. For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client; every operation fails with `Unavailable`.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Full stored record, including `connected` and `lastUpdated`.
    pub async fn get_record(&self, user_id: &str) -> Result<Option<ConnectionRecord>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_CONNECTIONS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    /// Underlying Firestore client, for documents this store doesn't own.
    pub fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client.as_ref().ok_or_else(|| {
            StoreError::Unavailable("Database not connected (offline mode)".to_string())
        })
    }
}

#[async_trait]
impl ConnectionStore for FirestoreDb {
    async fn save(&self, user_id: &str, url: &str, api_key: &str) -> Result<(), StoreError> {
        let record = ConnectionRecord {
            url: url.to_string(),
            api_key: api_key.to_string(),
            connected: true,
            last_updated: None,
        };

        // Update mask limits the write to SAVE_FIELDS (merge); lastUpdated comes
        // from the server's request time, not ours.
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(SAVE_FIELDS)
            .in_col(collections::USER_CONNECTIONS)
            .document_id(user_id)
            .object(&record)
            .transforms(|t| {
                t.fields([t
                    .field(LAST_UPDATED_FIELD)
                    .server_value(firestore::FirestoreTransformServerValue::RequestTime)])
            })
            .execute()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tracing::debug!(user_id, "Saved Nightscout connection");
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<StoredConnection, StoreError> {
        self.get_record(user_id)
            .await?
            .map(StoredConnection::from)
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USER_CONNECTIONS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tracing::debug!(user_id, "Deleted Nightscout connection");
        Ok(())
    }
}
