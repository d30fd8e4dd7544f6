// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with: FIRESTORE_EMULATOR_HOST=localhost:8080 cargo test --test firestore_integration
//!
//! The emulator provides a clean state for each test run.

use nightscout_connector::db::{collections, ConnectionStore, StoreError};

mod common;
use common::test_db;

/// Generate a unique user ID for test isolation.
fn unique_user_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test-user-{nanos}")
}

#[tokio::test]
async fn test_save_get_delete_roundtrip() {
    require_emulator!();
    let db = test_db().await;
    let user_id = unique_user_id();

    db.save(&user_id, "https://ns.example.com", "k").await.unwrap();

    let conn = db.get(&user_id).await.unwrap();
    assert_eq!(conn.url, "https://ns.example.com");
    assert_eq!(conn.api_key, "k");

    db.delete(&user_id).await.unwrap();
    assert!(matches!(db.get(&user_id).await, Err(StoreError::NotFound)));

    // Deleting again is not an error
    db.delete(&user_id).await.unwrap();
}

#[tokio::test]
async fn test_save_sets_connected_and_timestamp() {
    require_emulator!();
    let db = test_db().await;
    let user_id = unique_user_id();

    db.save(&user_id, "https://ns.example.com", "k").await.unwrap();

    let record = db
        .get_record(&user_id)
        .await
        .unwrap()
        .expect("document exists");

    assert!(record.connected);
    let updated = record.last_updated.expect("lastUpdated set by server");
    assert!((chrono::Utc::now() - updated).num_seconds().abs() < 60);
}

#[tokio::test]
async fn test_save_overwrites() {
    require_emulator!();
    let db = test_db().await;
    let user_id = unique_user_id();

    db.save(&user_id, "https://a.example", "k1").await.unwrap();
    db.save(&user_id, "https://b.example", "k2").await.unwrap();

    let conn = db.get(&user_id).await.unwrap();
    assert_eq!(conn.url, "https://b.example");
    assert_eq!(conn.api_key, "k2");
}

#[tokio::test]
async fn test_save_preserves_other_fields() {
    require_emulator!();
    let db = test_db().await;
    let user_id = unique_user_id();
    let client = db.get_client().unwrap();

    // Another writer owns a field on the same document
    let _: serde_json::Value = client
        .fluent()
        .update()
        .fields(["displayName"])
        .in_col(collections::USER_CONNECTIONS)
        .document_id(&user_id)
        .object(&serde_json::json!({"displayName": "Pat"}))
        .execute()
        .await
        .unwrap();

    db.save(&user_id, "https://ns.example.com", "k").await.unwrap();
    db.save(&user_id, "https://ns2.example.com", "k2").await.unwrap();

    let doc: serde_json::Value = client
        .fluent()
        .select()
        .by_id_in(collections::USER_CONNECTIONS)
        .obj()
        .one(&user_id)
        .await
        .unwrap()
        .expect("document exists");

    assert_eq!(doc["displayName"], "Pat");
    assert_eq!(doc["nightscoutUrl"], "https://ns2.example.com");
    assert_eq!(doc["nightscoutApiKey"], "k2");
    assert_eq!(doc["connected"], true);
}
