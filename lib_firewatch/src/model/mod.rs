//! # Data Model
//!
//! Records shared by the store, the HTTP surface and the viewers. The JSON
//! field names are part of the wire contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Intensity reported for a hotspot whose source record carries no brightness.
pub const DEFAULT_INTENSITY: f64 = 300.0;

/// Response header of `GET /api/local-fires` carrying the number of
/// detections ever accepted. Viewers use it as their watermark.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// # View
///
/// The independently timed display surfaces that poll the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Status cards (system state and totals).
    Status,
    /// Local detections: map markers plus the detection list.
    Local,
    /// Trend chart and totals.
    Analytics,
    /// Satellite cluster layer of the map.
    Satellite,
}

impl View {
    pub const ALL: [View; 4] = [View::Status, View::Local, View::Analytics, View::Satellite];

    pub fn as_str(self) -> &'static str {
        match self {
            View::Status => "status",
            View::Local => "local",
            View::Analytics => "analytics",
            View::Satellite => "satellite",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Fire Event
///
/// One local detection reported by a field sensor (or recovered from the log).
/// `time` is always assigned by the store when the event is accepted, never
/// taken from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireEvent {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Signal quality in `[0, 1]`, supplied or synthesized.
    pub confidence: f64,
    /// Acceptance time.
    pub time: DateTime<Utc>,
}

/// # Detection
///
/// A validated, not yet stored detection. The store turns it into a
/// [`FireEvent`] by stamping the acceptance time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub lat: f64,
    pub lon: f64,
    pub confidence: f64,
}

/// # Satellite Hotspot
///
/// One satellite-derived detection. Immutable after load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatelliteHotspot {
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
}

/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub system: String,
    pub satellite_points: usize,
    pub local_points: u64,
    /// ISO-8601 server time.
    pub time: DateTime<Utc>,
}

/// Body of `GET /api/firms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmsReport {
    /// Size of the whole dataset, not of `fires`.
    pub count: usize,
    pub fires: Vec<SatelliteHotspot>,
}

/// Body of a successful `POST /api/local-fires`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestAck {
    pub status: String,
}

impl IngestAck {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Outgoing detection payload as posted by sensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionPayload {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}
