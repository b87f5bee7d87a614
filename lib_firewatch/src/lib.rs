//! # lib_firewatch
//!
//! Wildfire detection tracking core. Two detection sources feed it: a static,
//! periodically refreshed satellite hotspot dataset and a live stream of point
//! detections reported by field sensors. Several independently timed viewers
//! (status cards, map, detection list, trend chart) poll the merged view.
//!
//! ## Module Map:
//! - **`model`**: wire and in-memory records (`FireEvent`, `SatelliteHotspot`, ...).
//! - **`core`**: the event store, the per-view poll gate, confidence estimators,
//!   the trend buffer, request sequencing and the spatial cluster.
//! - **`ingestors`**: log hydration at boot, the detection journal, the satellite
//!   dataset loader and the ingestion endpoint logic.
//! - **`http`** (feature `server`): the axum API served to viewers.
//! - **`retrieve`** (feature `retrieve`): the HTTP client and the `FireFeed` seam.
//! - **`sync`** (feature `sync`): the client synchronization engine.
//! - **`loggers`** (feature `loggers`): tracing subscriber setup.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod core;
pub mod ingestors;
pub mod model;

#[cfg(feature = "server")]
pub mod http;

#[cfg(feature = "retrieve")]
pub mod retrieve;

#[cfg(feature = "sync")]
pub mod sync;

#[cfg(feature = "loggers")]
pub mod loggers;

pub use crate::core::{EventStore, PollGate, TrendBuffer};
pub use crate::ingestors::{IngestionEndpoint, LogHydrator, SatelliteDataset};
pub use crate::model::{Detection, FireEvent, SatelliteHotspot};
