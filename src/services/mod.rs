// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module: outbound clients and token verifiers.

pub mod firebase_auth;
pub mod jwt;
pub mod nightscout;

pub use firebase_auth::FirebaseTokenVerifier;
pub use jwt::JwtService;
pub use nightscout::{NightscoutClient, NightscoutError, NightscoutService};
