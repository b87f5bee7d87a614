//! # Core Engine Module
//!
//! The synchronization core shared by the server and the viewers. Everything in
//! here is runtime agnostic and thread-safe; components are constructed once
//! and handed around as `Arc` handles, never reached through globals.
//!
//! ## Core Components:
//!
//! - **`event_store`**: the authoritative, bounded collection of local
//!   detections. Appends are serialized, reads run concurrently and never see a
//!   torn event.
//! - **`poll_gate`**: per-view throttle that drops, rather than queues,
//!   over-frequent refresh attempts.
//! - **`confidence`**: the swappable signal-quality estimator used when a
//!   detection arrives without a confidence value.
//! - **`trend_buffer`**: fixed-depth FIFO of aggregate counts for the chart.
//! - **`sequencer`**: per-view request numbering so a slow, stale response can
//!   never overwrite newer state.
//! - **`cluster`**: grid-based spatial clustering of satellite hotspots.

/// Bounded, concurrently readable store of local detections.
pub mod event_store;
/// Per-view refresh throttle.
pub mod poll_gate;
/// Confidence synthesis strategies.
pub mod confidence;
/// Fixed-depth FIFO of recent aggregate counts.
pub mod trend_buffer;
/// Monotonic request sequencing per view.
pub mod sequencer;
/// Grid clustering of satellite hotspots.
pub mod cluster;

// --- Public API Re-exports ---
pub use cluster::{ClusterSummary, SpatialCluster};
pub use confidence::{ConfidenceEstimator, FixedConfidence, UniformConfidence};
pub use event_store::EventStore;
pub use poll_gate::{GateDecision, PollGate};
pub use sequencer::RequestSequencer;
pub use trend_buffer::TrendBuffer;
