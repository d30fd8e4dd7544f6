// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod connection;
pub mod entry;

pub use connection::{ConnectionRecord, StoredConnection};
pub use entry::{GlucoseEntry, GlucoseReading};
