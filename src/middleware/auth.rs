// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token authentication middleware.

use crate::error::{messages, AppError};
use crate::AppState;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }
}

/// Bearer token verification failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("Authorization header is not of the form `Bearer <token>`")]
    MalformedHeader,

    #[error("invalid or expired token: {0}")]
    InvalidOrExpired(String),

    /// Verification could not be attempted (e.g. signing keys unreachable).
    /// Clients still see a 401; only the server log differs.
    #[error("token verification unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingHeader => AppError::Unauthorized(messages::AUTH_HEADER_REQUIRED),
            AuthError::MalformedHeader => AppError::Unauthorized(messages::AUTH_HEADER_FORMAT),
            AuthError::InvalidOrExpired(reason) => {
                tracing::warn!(reason = %reason, "Rejected bearer token");
                AppError::Unauthorized(messages::INVALID_TOKEN)
            }
            AuthError::Unavailable(reason) => {
                tracing::error!(reason = %reason, "Token verification unavailable");
                AppError::Unauthorized(messages::INVALID_TOKEN)
            }
        }
    }
}

/// A bearer token verification strategy.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a raw token (without the `Bearer ` prefix).
    async fn verify_token(&self, token: &str) -> Result<AuthUser, AuthError>;

    /// Verify the value of an `Authorization` header.
    async fn verify(&self, auth_header: Option<&HeaderValue>) -> Result<AuthUser, AuthError> {
        let token = extract_bearer_token(auth_header)?;
        self.verify_token(token).await
    }
}

/// Extract the token from an exact `Bearer <token>` header value.
pub fn extract_bearer_token(auth_header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = auth_header
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Middleware that requires a valid bearer token.
///
/// On success the resolved [`AuthUser`] is inserted into request extensions.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = state
        .verifier
        .verify(request.headers().get(header::AUTHORIZATION))
        .await?;

    tracing::debug!(user_id = %auth_user.user_id, "Authenticated request");
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
