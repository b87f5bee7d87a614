//! # Client Synchronization
//!
//! Viewer-side polling: gated, sequenced refreshes per view and the reconcile
//! decisions behind each redraw. Rendering itself sits behind
//! [`DisplaySurface`].

/// Per-view scheduling, gating, sequencing and reconcile.
pub mod engine;
/// The rendering seam.
pub mod surface;

pub use engine::{
    ClientSyncEngine, MapState, RefreshOutcome, SyncConfig, LOCAL_WINDOW, SATELLITE_BATCH_SIZE,
};
pub use surface::{format_list_entry, DisplaySurface};
