// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use nightscout_connector::config::Config;
use nightscout_connector::db::{ConnectionStore, FirestoreDb, MemoryStore, StoreError};
use nightscout_connector::models::StoredConnection;
use nightscout_connector::routes::create_router;
use nightscout_connector::services::{JwtService, NightscoutService};
use nightscout_connector::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Memory store that counts every call, for asserting "no store access".
#[derive(Clone, Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionStore for CountingStore {
    async fn save(&self, user_id: &str, url: &str, api_key: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.save(user_id, url, api_key).await
    }

    async fn get(&self, user_id: &str) -> Result<StoredConnection, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(user_id).await
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(user_id).await
    }
}

/// Test app wired to an in-memory store and self-issued tokens.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: CountingStore,
    pub jwt: Arc<JwtService>,
}

#[allow(dead_code)]
impl TestApp {
    /// A valid bearer token for `user_id`.
    pub fn token(&self, user_id: &str) -> String {
        self.jwt
            .issue_token(user_id, "user")
            .expect("Failed to issue test token")
    }

    /// Build a request carrying a valid bearer token.
    pub fn authed(&self, method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token("u1")));

        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }
}

/// Create a test app with offline dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let config = Config::test_default();
    let store = CountingStore::default();
    let jwt = Arc::new(JwtService::new(&config.jwt_secret));

    let state = Arc::new(AppState {
        config,
        store: Arc::new(store.clone()),
        verifier: jwt.clone(),
        nightscout: NightscoutService::new().expect("Failed to build HTTP client"),
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        jwt,
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

/// A realistic Nightscout entries payload with `n` readings, newest first.
#[allow(dead_code)]
pub fn sample_entries(n: usize) -> serde_json::Value {
    let base_ms: i64 = 1_709_296_200_000;
    let entries: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            let date = base_ms - (i as i64) * 5 * 60 * 1000;
            serde_json::json!({
                "_id": format!("entry-{i}"),
                "device": "xDrip-DexcomG6",
                "dateString": chrono::DateTime::from_timestamp_millis(date)
                    .unwrap()
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                "date": date,
                "sgv": 120 + i as i32,
                "delta": 1.5,
                "direction": "Flat",
                "type": "sgv",
            })
        })
        .collect();
    serde_json::Value::Array(entries)
}
