// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nightscout API client for verifying connections and fetching entries.
//!
//! Handles:
//! - Status check to validate a URL/token pair
//! - Entries query with count and date range filters
//! - API token placement as a `token` query parameter

use crate::models::GlucoseEntry;
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub const STATUS_ENDPOINT: &str = "/api/v1/status.json";
pub const ENTRIES_ENDPOINT: &str = "/api/v1/entries.json";
pub const DEFAULT_ENTRIES_COUNT: i64 = 24;
/// Upper bound on every outbound Nightscout call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors talking to a Nightscout host.
#[derive(Debug, thiserror::Error)]
pub enum NightscoutError {
    /// Transport failure, including timeouts.
    #[error("failed to reach Nightscout: {0}")]
    Unreachable(String),

    #[error("invalid Nightscout credentials or URL: status {status}")]
    Rejected { status: u16 },

    #[error("failed to parse entries: {0}")]
    InvalidBody(String),
}

/// Process-wide Nightscout service holding the shared HTTP client.
#[derive(Clone)]
pub struct NightscoutService {
    http: reqwest::Client,
}

impl NightscoutService {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Service whose outbound calls give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Bind a client to one user's Nightscout instance.
    pub fn client<'a>(&'a self, base_url: &str, api_key: &'a str) -> NightscoutClient<'a> {
        NightscoutClient {
            http: &self.http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

/// Client for a single Nightscout instance, valid for one request.
pub struct NightscoutClient<'a> {
    http: &'a reqwest::Client,
    base_url: String,
    api_key: &'a str,
}

impl NightscoutClient<'_> {
    /// Check that the instance is reachable and accepts the token.
    pub async fn verify(&self) -> Result<(), NightscoutError> {
        let response = self.get(STATUS_ENDPOINT).await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(NightscoutError::Rejected {
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }

    /// Fetch up to `count` entries, optionally bounded by date.
    ///
    /// A missing or non-positive count falls back to [`DEFAULT_ENTRIES_COUNT`].
    pub async fn get_entries(
        &self,
        count: Option<i64>,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
    ) -> Result<Vec<GlucoseEntry>, NightscoutError> {
        let endpoint = entries_endpoint(count, date_from, date_to);
        let response = self.get(&endpoint).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NightscoutError::Rejected {
                status: status.as_u16(),
            });
        }

        let entries: Vec<GlucoseEntry> = response
            .json()
            .await
            .map_err(|e| NightscoutError::InvalidBody(e.to_string()))?;

        tracing::debug!(count = entries.len(), "Fetched Nightscout entries");
        Ok(entries)
    }

    async fn get(&self, endpoint: &str) -> Result<reqwest::Response, NightscoutError> {
        let url = self.url_for(endpoint);
        self.http
            .get(url)
            .send()
            .await
            .map_err(|e| NightscoutError::Unreachable(e.to_string()))
    }

    /// Full URL for an endpoint, with the API token appended when set.
    fn url_for(&self, endpoint: &str) -> String {
        let mut url = format!("{}{}", self.base_url, endpoint);
        if !self.api_key.is_empty() {
            let sep = if endpoint.contains('?') { '&' } else { '?' };
            url.push(sep);
            url.push_str("token=");
            url.push_str(&urlencoding::encode(self.api_key));
        }
        url
    }
}

fn entries_endpoint(
    count: Option<i64>,
    date_from: Option<DateTime<Utc>>,
    date_to: Option<DateTime<Utc>>,
) -> String {
    let count = count
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_ENTRIES_COUNT);

    let mut endpoint = format!("{}?count={}", ENTRIES_ENDPOINT, count);
    if let Some(from) = date_from {
        endpoint.push_str("&find[dateString][$gte]=");
        endpoint.push_str(&urlencoding::encode(&format_utc_rfc3339(from)));
    }
    if let Some(to) = date_to {
        endpoint.push_str("&find[dateString][$lte]=");
        endpoint.push_str(&urlencoding::encode(&format_utc_rfc3339(to)));
    }
    endpoint
}
