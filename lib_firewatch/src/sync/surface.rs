//! # Display Surface
//!
//! The rendering seam of the sync engine. The engine decides *what* to redraw
//! and *when*; a surface only draws. Methods take `&self`: implementations
//! keep their own interior state, and the engine never calls two render
//! methods for the same view concurrently.

use chrono::Local;

use crate::core::SpatialCluster;
use crate::model::{FireEvent, StatusReport, View};

pub trait DisplaySurface: Send + Sync {
    /// Whether the widgets of `view` still exist. Responses for an unmounted
    /// view are dropped.
    fn is_mounted(&self, view: View) -> bool;

    /// Status cards.
    fn render_status(&self, report: &StatusReport);

    /// Constructs the map and its tile base layer. Called exactly once.
    fn init_map(&self);

    /// Adds a fully built satellite cluster layer to the map.
    fn attach_cluster(&self, cluster: &SpatialCluster);

    /// Removes the current satellite cluster layer.
    fn teardown_cluster(&self);

    /// Discards every local marker and draws `events` instead.
    fn replace_local_markers(&self, events: &[FireEvent]);

    /// Pans the map to the given point.
    fn recenter(&self, lat: f64, lon: f64);

    /// Replaces the whole detection list.
    fn replace_list(&self, entries: &[String]);

    /// Destroys the previous chart instance, if any.
    fn teardown_chart(&self);

    /// Builds a new chart from the trend values, oldest first.
    fn draw_chart(&self, values: &[u64]);

    /// Satellite and local totals on the analytics page.
    fn render_totals(&self, satellite_points: usize, local_points: u64);
}

/// Text of one detection list entry. `ordinal` is the 1-based position of the
/// event among all accepted detections.
pub fn format_list_entry(ordinal: u64, event: &FireEvent) -> String {
    format!(
        "Fire #{} | Lat {:.5}, Lon {:.5} | Confidence {:.1}% | {}",
        ordinal,
        event.lat,
        event.lon,
        event.confidence * 100.0,
        event.time.with_timezone(&Local).format("%H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_list_entry_text() {
        let event = FireEvent {
            lat: 12.9716781,
            lon: 77.5945449,
            confidence: 0.8123,
            time: Utc::now(),
        };
        let text = format_list_entry(42, &event);
        assert!(text.starts_with("Fire #42 | Lat 12.97168, Lon 77.59454 | Confidence 81.2% | "), "{text}");
    }
}
