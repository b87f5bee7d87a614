//! # Spatial Cluster
//!
//! Grid clustering for the satellite layer. Hotspots are bucketed into square
//! cells of `cell_degrees` on a side; each non-empty cell renders as one
//! cluster marker at the centroid of its members.

use std::collections::HashMap;

use crate::model::SatelliteHotspot;

/// Cell size used by the map layer.
pub const DEFAULT_CELL_DEGREES: f64 = 0.5;

/// One rendered cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterSummary {
    pub lat: f64,
    pub lon: f64,
    pub count: usize,
    pub max_intensity: f64,
}

#[derive(Debug, Clone)]
pub struct SpatialCluster {
    cell_degrees: f64,
    cells: HashMap<(i64, i64), Vec<SatelliteHotspot>>,
    len: usize,
}

impl Default for SpatialCluster {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_DEGREES)
    }
}

impl SpatialCluster {
    pub fn new(cell_degrees: f64) -> Self {
        let cell_degrees = if cell_degrees.is_finite() && cell_degrees > 0.0 {
            cell_degrees
        } else {
            DEFAULT_CELL_DEGREES
        };
        Self {
            cell_degrees,
            cells: HashMap::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, hotspot: SatelliteHotspot) {
        let key = self.cell_of(hotspot.lat, hotspot.lon);
        self.cells.entry(key).or_default().push(hotspot);
        self.len += 1;
    }

    pub fn insert_batch(&mut self, batch: &[SatelliteHotspot]) {
        for hotspot in batch {
            self.insert(*hotspot);
        }
    }

    /// Total number of hotspots held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cluster markers, largest first.
    pub fn summaries(&self) -> Vec<ClusterSummary> {
        let mut out: Vec<ClusterSummary> = self
            .cells
            .values()
            .map(|members| {
                let n = members.len() as f64;
                let (lat_sum, lon_sum, max_intensity) = members.iter().fold(
                    (0.0, 0.0, f64::MIN),
                    |(lat, lon, max), h| (lat + h.lat, lon + h.lon, max.max(h.intensity)),
                );
                ClusterSummary {
                    lat: lat_sum / n,
                    lon: lon_sum / n,
                    count: members.len(),
                    max_intensity,
                }
            })
            .collect();
        out.sort_by(|a, b| b.count.cmp(&a.count));
        out
    }

    fn cell_of(&self, lat: f64, lon: f64) -> (i64, i64) {
        (
            (lat / self.cell_degrees).floor() as i64,
            (lon / self.cell_degrees).floor() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotspot(lat: f64, lon: f64) -> SatelliteHotspot {
        SatelliteHotspot {
            lat,
            lon,
            intensity: 300.0,
        }
    }

    #[test]
    fn test_batched_inserts_hold_every_record() {
        let records: Vec<_> = (0..700).map(|i| hotspot(i as f64 * 0.01, 78.0)).collect();
        let mut cluster = SpatialCluster::default();
        for batch in records.chunks(300) {
            cluster.insert_batch(batch);
        }
        assert_eq!(cluster.len(), 700);
        let summed: usize = cluster.summaries().iter().map(|s| s.count).sum();
        assert_eq!(summed, 700);
    }

    #[test]
    fn test_nearby_points_share_a_cell() {
        let mut cluster = SpatialCluster::new(1.0);
        cluster.insert(hotspot(10.1, 20.1));
        cluster.insert(hotspot(10.9, 20.8));
        cluster.insert(hotspot(-10.1, 20.1));
        assert_eq!(cluster.cell_count(), 2);
        let top = cluster.summaries()[0];
        assert_eq!(top.count, 2);
        assert!((top.lat - 10.5).abs() < 1e-9);
    }
}
