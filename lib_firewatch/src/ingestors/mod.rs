//! # Data Ingestors Module
//!
//! Every path by which detections enter the core.
//!
//! ## Contained Modules:
//! - **`log_hydrator`**: replays the trailing window of the legacy fire log into
//!   the event store at startup. Best effort: malformed lines are skipped and a
//!   broken log never stops the boot sequence.
//! - **`fire_log`**: appends accepted detections to that same log, in the same
//!   grammar, so the next boot recovers them.
//! - **`satellite`**: loads the satellite hotspot dataset from its tabular
//!   source and holds it for wholesale replacement on reload.
//! - **`ingestion`**: validates live detection requests, synthesizes missing
//!   confidence and appends to the store. The only write path after startup.

/// Startup replay of the legacy fire log.
pub mod log_hydrator;
/// Append-only writer for the legacy fire log grammar.
pub mod fire_log;
/// Satellite hotspot dataset and its CSV source.
pub mod satellite;
/// Live detection validation and acceptance.
pub mod ingestion;

// --- Public API Re-exports ---
pub use fire_log::FireLog;
pub use ingestion::{IngestError, IngestionEndpoint};
pub use log_hydrator::{HydrationError, HydrationReport, LogHydrator};
pub use satellite::{CsvHotspotSource, DatasetError, HotspotSource, LoadReport, SatelliteDataset};
