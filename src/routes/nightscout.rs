// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nightscout connection routes (require authentication).

use crate::db::StoreError;
use crate::error::{messages, AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{GlucoseEntry, GlucoseReading, StoredConnection};
use crate::time_utils::parse_rfc3339_lenient;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub const MSG_SUCCESS: &str = "Success";
pub const MSG_VERIFIED: &str = "Successfully connected to Nightscout";
pub const MSG_DISCONNECTED: &str = "Successfully disconnected from Nightscout";

/// Nightscout routes. The auth middleware is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/nightscout/connect", post(connect))
        .route("/api/nightscout/verify", get(verify))
        .route("/api/nightscout/entries", get(get_entries))
        .route("/api/nightscout/readings", get(get_readings))
        .route("/api/nightscout/disconnect", delete(disconnect))
}

// ─── Shared helpers ──────────────────────────────────────────

#[derive(Deserialize)]
struct UserQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// Entries query. Everything is taken as a string so malformed values can
/// fall back to defaults instead of rejecting the request.
#[derive(Deserialize)]
struct EntriesQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    count: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

fn required_user_id(user_id: Option<String>) -> Result<String> {
    user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest(messages::USER_ID_REQUIRED.to_string()))
}

/// Parse `count`, ignoring anything that isn't a positive integer.
fn parse_count(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|c| c.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
}

async fn load_connection(state: &AppState, user_id: &str) -> Result<StoredConnection> {
    state.store.get(user_id).await.map_err(|err| {
        match &err {
            StoreError::NotFound => {
                tracing::info!(user_id, "No Nightscout connection stored")
            }
            StoreError::Unavailable(detail) => {
                tracing::error!(user_id, error = %detail, "Connection lookup failed")
            }
        }
        AppError::Store {
            message: messages::GET_CONNECTION_FAILED,
            details: None,
        }
    })
}

async fn fetch_entries(state: &AppState, params: EntriesQuery) -> Result<Vec<GlucoseEntry>> {
    let user_id = required_user_id(params.user_id)?;
    let count = parse_count(params.count.as_deref());
    let date_from = parse_rfc3339_lenient(params.from.as_deref());
    let date_to = parse_rfc3339_lenient(params.to.as_deref());

    tracing::debug!(
        user_id = %user_id,
        count = ?count,
        from = ?date_from,
        to = ?date_to,
        "Fetching Nightscout entries"
    );

    let connection = load_connection(state, &user_id).await?;

    state
        .nightscout
        .client(&connection.url, &connection.api_key)
        .get_entries(count, date_from, date_to)
        .await
        .map_err(|e| {
            AppError::upstream(
                StatusCode::INTERNAL_SERVER_ERROR,
                messages::FETCH_ENTRIES_FAILED,
                e,
            )
        })
}

// ─── Connect ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ConnectRequest {
    #[serde(rename = "userId", default)]
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
    #[serde(rename = "nightscoutUrl", default)]
    #[validate(url(message = "nightscoutUrl must be a valid URL"))]
    pub nightscout_url: String,
    #[serde(rename = "apiKey", default)]
    pub api_key: String,
}

impl ConnectRequest {
    fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let url = reqwest::Url::parse(&self.nightscout_url)
            .map_err(|e| AppError::BadRequest(format!("nightscoutUrl: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::BadRequest(
                "nightscoutUrl must use http or https".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ConnectResponse {
    pub message: String,
    pub url: String,
}

/// Verify a Nightscout URL/token pair and store it for the user.
async fn connect(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    payload: std::result::Result<Json<ConnectRequest>, JsonRejection>,
) -> Result<Json<ConnectResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    request.check()?;

    state
        .nightscout
        .client(&request.nightscout_url, &request.api_key)
        .verify()
        .await
        .map_err(|e| AppError::upstream(StatusCode::BAD_REQUEST, messages::CONNECTION_FAILED, e))?;

    state
        .store
        .save(&request.user_id, &request.nightscout_url, &request.api_key)
        .await
        .map_err(|e| AppError::Store {
            message: messages::SAVE_CONNECTION_FAILED,
            details: Some(e.to_string()),
        })?;

    tracing::info!(
        user_id = %request.user_id,
        caller = %caller.user_id,
        url = %request.nightscout_url,
        "Nightscout connected"
    );

    Ok(Json(ConnectResponse {
        message: MSG_SUCCESS.to_string(),
        url: request.nightscout_url,
    }))
}

// ─── Verify / Disconnect ─────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

/// Re-check the stored connection against the Nightscout host.
async fn verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserQuery>,
) -> Result<Json<MessageResponse>> {
    let user_id = required_user_id(params.user_id)?;
    let connection = load_connection(&state, &user_id).await?;

    state
        .nightscout
        .client(&connection.url, &connection.api_key)
        .verify()
        .await
        .map_err(|e| {
            AppError::upstream(
                StatusCode::INTERNAL_SERVER_ERROR,
                messages::CONNECTION_FAILED,
                e,
            )
        })?;

    Ok(Json(MessageResponse {
        message: MSG_VERIFIED.to_string(),
    }))
}

/// Remove the user's stored connection.
async fn disconnect(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Query(params): Query<UserQuery>,
) -> Result<Json<MessageResponse>> {
    let user_id = required_user_id(params.user_id)?;

    // Must exist before delete; a missing record reports the lookup failure.
    load_connection(&state, &user_id).await?;

    state.store.delete(&user_id).await.map_err(|e| {
        tracing::error!(user_id = %user_id, error = %e, "Connection delete failed");
        AppError::Store {
            message: messages::DISCONNECT_FAILED,
            details: None,
        }
    })?;

    tracing::info!(user_id = %user_id, caller = %caller.user_id, "Nightscout disconnected");

    Ok(Json(MessageResponse {
        message: MSG_DISCONNECTED.to_string(),
    }))
}

// ─── Entries ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EntriesResponse {
    pub entries: Vec<GlucoseEntry>,
    /// Number of entries actually returned
    pub count: usize,
}

/// Proxy recent glucose entries from the user's Nightscout.
async fn get_entries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EntriesQuery>,
) -> Result<Json<EntriesResponse>> {
    let entries = fetch_entries(&state, params).await?;

    Ok(Json(EntriesResponse {
        count: entries.len(),
        entries,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReadingsResponse {
    pub readings: Vec<GlucoseReading>,
    pub count: usize,
}

/// Same as entries, converted to the app's reading format.
async fn get_readings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EntriesQuery>,
) -> Result<Json<ReadingsResponse>> {
    let readings: Vec<GlucoseReading> = fetch_entries(&state, params)
        .await?
        .into_iter()
        .map(GlucoseReading::from)
        .collect();

    Ok(Json(ReadingsResponse {
        count: readings.len(),
        readings,
    }))
}
