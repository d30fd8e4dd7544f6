// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Glucose entries as returned by the Nightscout entries API.

use crate::time_utils::{format_utc_rfc3339, from_epoch_millis};
use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A single glucose reading from Nightscout.
///
/// Serialized back to clients with Nightscout's own field names. Entry types
/// other than `sgv` (calibrations, meter readings) omit some fields, so every
/// required field falls back to its zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct GlucoseEntry {
    #[serde(rename = "_id", deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub device: String,
    #[serde(rename = "dateString", deserialize_with = "null_as_default")]
    pub date_string: String,
    /// Milliseconds since the Unix epoch
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    #[serde(deserialize_with = "null_as_default")]
    pub date: i64,
    /// Sensor glucose value in mg/dL
    #[serde(deserialize_with = "null_as_default")]
    pub sgv: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub delta: f64,
    /// Trend arrow label, e.g. `Flat` or `SingleUp`
    #[serde(deserialize_with = "null_as_default")]
    pub direction: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub entry_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unfiltered: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<i32>,
    #[serde(rename = "sysTime", skip_serializing_if = "Option::is_none")]
    pub sys_time: Option<String>,
}

/// Uploaders send `null` for fields they have no value for (e.g. `delta` on
/// the first reading after a sensor start); treat it like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Entry converted to the app's reading format.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GlucoseReading {
    pub value: i32,
    /// RFC3339 UTC; `None` if `date` is out of range
    pub timestamp: Option<String>,
    pub trend: String,
    pub delta: f64,
    pub source: &'static str,
    pub raw: GlucoseEntry,
}

impl From<GlucoseEntry> for GlucoseReading {
    fn from(entry: GlucoseEntry) -> Self {
        Self {
            value: entry.sgv,
            timestamp: from_epoch_millis(entry.date).map(format_utc_rfc3339),
            trend: entry.direction.clone(),
            delta: entry.delta,
            source: "nightscout",
            raw: entry,
        }
    }
}
