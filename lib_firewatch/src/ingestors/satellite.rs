//! # Satellite Dataset
//!
//! Satellite hotspots come from an external tabular source (FIRMS-style CSV).
//! The dataset is loaded once at startup and afterwards only replaced
//! wholesale on an explicit reload; readers hold an `Arc` snapshot and are never
//! affected by a concurrent replacement.
//!
//! ## Column resolution
//! - latitude: `latitude`, else `lat`
//! - longitude: `longitude`, else `lon`
//! - intensity (optional): `brightness`, `bright_ti4`, `intensity`; defaults to
//!   [`DEFAULT_INTENSITY`] when absent or not numeric
//!
//! Rows whose coordinates are missing or non-numeric are dropped one by one;
//! loading continues.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{SatelliteHotspot, DEFAULT_INTENSITY};

const LAT_COLUMNS: [&str; 2] = ["latitude", "lat"];
const LON_COLUMNS: [&str; 2] = ["longitude", "lon"];
const INTENSITY_COLUMNS: [&str; 3] = ["brightness", "bright_ti4", "intensity"];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error reading satellite dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV header error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Satellite dataset has no {0} column")]
    MissingColumn(&'static str),
}

/// Counts from one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub dropped: usize,
}

/// A source of satellite records. The only contract the core needs from
/// dataset ingestion.
pub trait HotspotSource: Send + Sync {
    fn load(&self) -> Result<(Vec<SatelliteHotspot>, LoadReport), DatasetError>;

    fn describe(&self) -> String;
}

/// Reads hotspots from a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvHotspotSource {
    path: PathBuf,
}

impl CsvHotspotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HotspotSource for CsvHotspotSource {
    fn load(&self) -> Result<(Vec<SatelliteHotspot>, LoadReport), DatasetError> {
        let file = std::fs::File::open(&self.path).map_err(|source| DatasetError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_csv(file)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Parses hotspot rows from any CSV reader.
pub fn parse_csv<R: Read>(reader: R) -> Result<(Vec<SatelliteHotspot>, LoadReport), DatasetError> {
    let mut csv_reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let lat_idx = find_column(&headers, &LAT_COLUMNS).ok_or(DatasetError::MissingColumn("latitude"))?;
    let lon_idx = find_column(&headers, &LON_COLUMNS).ok_or(DatasetError::MissingColumn("longitude"))?;
    let intensity_idx = find_column(&headers, &INTENSITY_COLUMNS);

    let mut hotspots = Vec::new();
    let mut report = LoadReport::default();
    for row in csv_reader.records() {
        let parsed = row.ok().and_then(|record| {
            let lat = numeric(&record, Some(lat_idx))?;
            let lon = numeric(&record, Some(lon_idx))?;
            let intensity = numeric(&record, intensity_idx).unwrap_or(DEFAULT_INTENSITY);
            Some(SatelliteHotspot { lat, lon, intensity })
        });
        match parsed {
            Some(hotspot) => {
                hotspots.push(hotspot);
                report.loaded += 1;
            }
            None => report.dropped += 1,
        }
    }
    Ok((hotspots, report))
}

fn find_column(headers: &StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

fn numeric(record: &StringRecord, idx: Option<usize>) -> Option<f64> {
    record
        .get(idx?)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// # Satellite Dataset
///
/// Process-wide dataset handle, shared as `Arc<SatelliteDataset>`.
#[derive(Debug, Default)]
pub struct SatelliteDataset {
    hotspots: RwLock<Arc<Vec<SatelliteHotspot>>>,
}

impl SatelliteDataset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_hotspots(hotspots: Vec<SatelliteHotspot>) -> Self {
        Self {
            hotspots: RwLock::new(Arc::new(hotspots)),
        }
    }

    /// Loads from `source`. A failed load yields an empty dataset and is
    /// logged; it never stops startup.
    pub fn load_or_empty(source: &dyn HotspotSource) -> Self {
        let dataset = Self::empty();
        if let Err(e) = dataset.reload(source) {
            warn!(source = %source.describe(), "Failed to load satellite dataset: {}", e);
        }
        dataset
    }

    /// Replaces the whole dataset from `source`. On error the previous
    /// dataset stays in place.
    pub fn reload(&self, source: &dyn HotspotSource) -> Result<LoadReport, DatasetError> {
        let (hotspots, report) = source.load()?;
        self.replace(hotspots);
        info!(
            source = %source.describe(),
            loaded = report.loaded,
            dropped = report.dropped,
            "Loaded satellite fires"
        );
        Ok(report)
    }

    pub fn replace(&self, hotspots: Vec<SatelliteHotspot>) {
        let mut guard = self.hotspots.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(hotspots);
    }

    /// Current dataset. Stays valid across later reloads.
    pub fn snapshot(&self) -> Arc<Vec<SatelliteHotspot>> {
        Arc::clone(&self.hotspots.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_parses_firms_columns_and_drops_bad_rows() {
        let csv_text = "latitude,longitude,brightness,acq_date\n\
                        12.5,77.1,330.2,2026-02-03\n\
                        abc,77.2,310,2026-02-03\n\
                        13.0,,300,2026-02-03\n\
                        14.25,78.0,,2026-02-03\n";
        let (hotspots, report) = parse_csv(csv_text.as_bytes()).unwrap();
        assert_eq!(report, LoadReport { loaded: 2, dropped: 2 });
        assert_eq!(hotspots[0].intensity, 330.2);
        assert_eq!(hotspots[1].intensity, DEFAULT_INTENSITY);
        assert_eq!(hotspots[1].lat, 14.25);
    }

    #[test]
    fn test_short_column_names_and_viirs_brightness() {
        let csv_text = "lat,lon,bright_ti4\n1,2,345.6\n";
        let (hotspots, _) = parse_csv(csv_text.as_bytes()).unwrap();
        assert_eq!(
            hotspots,
            vec![SatelliteHotspot { lat: 1.0, lon: 2.0, intensity: 345.6 }]
        );
    }

    #[test]
    fn test_missing_coordinate_column_is_an_error() {
        let err = parse_csv("latitude,brightness\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn("longitude")));
    }

    #[test]
    fn test_failed_reload_keeps_previous_dataset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fires.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "latitude,longitude\n1,2\n3,4").unwrap();
        drop(file);

        let source = CsvHotspotSource::new(&path);
        let dataset = SatelliteDataset::load_or_empty(&source);
        assert_eq!(dataset.len(), 2);

        let held = dataset.snapshot();
        std::fs::remove_file(&path).unwrap();
        assert!(dataset.reload(&source).is_err());
        assert_eq!(dataset.len(), 2);
        assert_eq!(held.len(), 2);
    }

    #[test]
    fn test_missing_source_yields_empty_dataset() {
        let dataset = SatelliteDataset::load_or_empty(&CsvHotspotSource::new("/nonexistent/fires.csv"));
        assert!(dataset.is_empty());
    }
}
