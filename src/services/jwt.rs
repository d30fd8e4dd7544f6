// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Self-issued HS256 session tokens.

use crate::middleware::auth::{AuthError, AuthUser, TokenVerifier};
use async_trait::async_trait;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub const TOKEN_ISSUER: &str = "nightscout-connector";
/// Lifetime of issued tokens (24 hours).
pub const TOKEN_DURATION_SECS: usize = 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: String,
    pub sub: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
    pub nbf: usize,
}

/// Mints and verifies tokens signed with a server-held secret.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Create a signed token for a user.
    pub fn issue_token(&self, user_id: &str, role: &str) -> anyhow::Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

        let claims = Claims {
            user_id: user_id.to_string(),
            role: role.to_string(),
            sub: user_id.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            exp: now + TOKEN_DURATION_SECS,
            iat: now,
            nbf: now,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Validate signature, algorithm family, issuer and time claims.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::InvalidOrExpired(format!("invalid JWT header: {e}")))?;

        if !matches!(
            header.alg,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::InvalidOrExpired(format!(
                "unexpected signing method: {:?}",
                header.alg
            )));
        }

        let mut validation = Validation::new(header.alg);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidOrExpired(format!("JWT validation failed: {e}")))
    }
}

#[async_trait]
impl TokenVerifier for JwtService {
    async fn verify_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.decode_claims(token)?;

        Ok(AuthUser {
            user_id: claims.user_id,
            email: None,
            role: Some(claims.role),
        })
    }
}
