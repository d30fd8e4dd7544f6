// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Nightscout connector: link a user's Nightscout instance and proxy reads.
//!
//! This crate provides the backend API for storing per-user Nightscout
//! credentials, verifying them, and fetching recent glucose entries.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::{AuthMode, Config, StoreBackend};
use db::{ConnectionStore, FirestoreDb, MemoryStore};
use middleware::TokenVerifier;
use services::{FirebaseTokenVerifier, JwtService, NightscoutService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ConnectionStore>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub nightscout: NightscoutService,
}

impl AppState {
    /// Build the process-wide clients selected by `config`.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn ConnectionStore> = match config.store_backend {
            StoreBackend::Firestore => {
                if let Some(path) = &config.credentials_path {
                    tracing::info!(path = %path, "Using service account credentials file");
                }
                Arc::new(FirestoreDb::new(&config.firebase_project_id).await?)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory connection store; records are not persisted");
                Arc::new(MemoryStore::new())
            }
        };

        let verifier: Arc<dyn TokenVerifier> = match config.auth_mode {
            AuthMode::Firebase => Arc::new(FirebaseTokenVerifier::new(&config.firebase_project_id)?),
            AuthMode::Jwt => {
                tracing::info!("Using self-issued HS256 bearer tokens");
                Arc::new(JwtService::new(&config.jwt_secret))
            }
        };

        Ok(Self {
            config,
            store,
            verifier,
            nightscout: NightscoutService::new()?,
        })
    }
}
