// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Client-facing error messages.
pub mod messages {
    pub const USER_ID_REQUIRED: &str = "userId is required";
    pub const CONNECTION_FAILED: &str = "Failed to connect to Nightscout";
    pub const SAVE_CONNECTION_FAILED: &str = "Failed to save connection";
    pub const GET_CONNECTION_FAILED: &str = "Failed to get connection details";
    pub const FETCH_ENTRIES_FAILED: &str = "Failed to fetch entries";
    pub const DISCONNECT_FAILED: &str = "Failed to disconnect from Nightscout";
    pub const AUTH_HEADER_REQUIRED: &str = "Authorization header is required";
    pub const AUTH_HEADER_FORMAT: &str = "Authorization header format must be Bearer {token}";
    pub const INVALID_TOKEN: &str = "Invalid or expired token";
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// The Nightscout host was unreachable or rejected the request. The status
    /// is chosen by the caller: connect reports 400, everything else 500.
    #[error("{message}: {details}")]
    Upstream {
        status: StatusCode,
        message: &'static str,
        details: String,
    },

    /// Connection store failure. `details` is only echoed to the client when set.
    #[error("{message}")]
    Store {
        message: &'static str,
        details: Option<String>,
    },
}

impl AppError {
    pub fn upstream(status: StatusCode, message: &'static str, err: impl ToString) -> Self {
        Self::Upstream {
            status,
            message,
            details: err.to_string(),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Upstream {
                status,
                message,
                details,
            } => {
                tracing::warn!(status = %status, error = %details, "{}", message);
                (status, message.to_string(), Some(details))
            }
            AppError::Store { message, details } => {
                tracing::error!(error = ?details, "{}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message.to_string(),
                    details,
                )
            }
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
