// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup; everything here is read-only afterwards.

use std::env;
use std::str::FromStr;

/// How bearer tokens on protected routes are verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Firebase Authentication ID tokens (production path).
    Firebase,
    /// HS256 tokens minted by this service with `JWT_SECRET`.
    Jwt,
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(Self::Firebase),
            "jwt" => Ok(Self::Jwt),
            _ => Err(ConfigError::Invalid("AUTH_MODE", s.to_string())),
        }
    }
}

/// Where connection records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// Process-local map; records are lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
///
/// `credentials_path` is informational: the Firestore client resolves
/// `GOOGLE_APPLICATION_CREDENTIALS` on its own, so the value is only logged
/// to show which credentials a deployment picked up.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Firebase/GCP project ID (Firestore database and ID token audience)
    pub firebase_project_id: String,
    /// `GOOGLE_APPLICATION_CREDENTIALS`, as seen at startup (logged only)
    pub credentials_path: Option<String>,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    pub auth_mode: AuthMode,
    pub store_backend: StoreBackend,
    /// HS256 secret for self-issued tokens (only required in `AuthMode::Jwt`)
    pub jwt_secret: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let auth_mode: AuthMode = env::var("AUTH_MODE")
            .unwrap_or_else(|_| "firebase".to_string())
            .parse()?;
        let store_backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .parse()?;

        let firebase_project_id = env::var("FIREBASE_PROJECT_ID")
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        let needs_project =
            auth_mode == AuthMode::Firebase || store_backend == StoreBackend::Firestore;
        if needs_project && firebase_project_id.is_empty() {
            return Err(ConfigError::Missing("FIREBASE_PROJECT_ID"));
        }

        let jwt_secret = match auth_mode {
            AuthMode::Jwt => {
                let secret =
                    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
                if secret.trim().is_empty() {
                    return Err(ConfigError::Missing("JWT_SECRET"));
                }
                secret.into_bytes()
            }
            AuthMode::Firebase => Vec::new(),
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => 8080,
        };

        Ok(Self {
            port,
            firebase_project_id,
            credentials_path: env::var("GOOGLE_APPLICATION_CREDENTIALS")
                .ok()
                .filter(|p| !p.is_empty()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            auth_mode,
            store_backend,
            jwt_secret,
        })
    }

    /// Deterministic config for tests: self-issued tokens, in-memory store.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            firebase_project_id: "test-project".to_string(),
            credentials_path: None,
            frontend_url: "http://localhost:5173".to_string(),
            auth_mode: AuthMode::Jwt,
            store_backend: StoreBackend::Memory,
            jwt_secret: b"test_jwt_secret_32_bytes_minimum!".to_vec(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
