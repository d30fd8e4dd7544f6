// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Nightscout connection record for storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection document stored in Firestore, keyed by user ID.
///
/// Field names match the documents written by earlier deployments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Base URL of the user's Nightscout instance
    #[serde(rename = "nightscoutUrl", default)]
    pub url: String,
    /// Nightscout API token; empty when the instance is public
    #[serde(rename = "nightscoutApiKey", default)]
    pub api_key: String,
    #[serde(default)]
    pub connected: bool,
    /// Set by the store on every save
    #[serde(
        rename = "lastUpdated",
        default,
        with = "firestore::serialize_as_optional_timestamp"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Credentials handed to the Nightscout client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredConnection {
    pub url: String,
    pub api_key: String,
}

impl From<ConnectionRecord> for StoredConnection {
    fn from(record: ConnectionRecord) -> Self {
        Self {
            url: record.url,
            api_key: record.api_key,
        }
    }
}
