//! # Fire Log Journal
//!
//! Appends accepted detections to the legacy fire log using the exact grammar
//! the hydrator reads back (`<ctime> - FIRE at <lat>, <lon>`), which makes
//! live ingestions recoverable across restarts.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::model::FireEvent;

/// ctime layout with the space-padded day, e.g. `Tue Feb  3 02:19:37 2026`.
const CTIME_WRITE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

pub struct FireLog {
    path: PathBuf,
    // Keeps concurrent appends from interleaving partial lines.
    write_lock: Mutex<()>,
}

impl FireLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Formats one log line (without the trailing newline).
    pub fn format_line(time: DateTime<Utc>, lat: f64, lon: f64) -> String {
        format!(
            "{} - FIRE at {}, {}",
            time.with_timezone(&Local).format(CTIME_WRITE_FORMAT),
            lat,
            lon
        )
    }

    pub async fn record(&self, event: &FireEvent) -> io::Result<()> {
        let line = Self::format_line(event.time, event.lat, event.lon);
        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestors::log_hydrator::parse_log_line;
    use tempfile::tempdir;

    #[test]
    fn test_format_matches_legacy_grammar() {
        let time = DateTime::parse_from_rfc3339("2026-02-03T02:19:37Z")
            .unwrap()
            .with_timezone(&Utc);
        let line = FireLog::format_line(time, 12.971678, 77.594545);
        assert!(line.ends_with(" - FIRE at 12.971678, 77.594545"), "{line}");
        let (parsed, lat, lon) = parse_log_line(&line).unwrap();
        assert_eq!(parsed, time);
        assert_eq!((lat, lon), (12.971678, 77.594545));
    }

    #[tokio::test]
    async fn test_record_appends_lines() {
        let dir = tempdir().unwrap();
        let log = FireLog::new(dir.path().join("fire_log.txt"));
        for i in 0..3 {
            let event = FireEvent {
                lat: i as f64,
                lon: 1.0,
                confidence: 0.6,
                time: Utc::now(),
            };
            log.record(&event).await.unwrap();
        }
        let text = tokio::fs::read_to_string(log.path()).await.unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().all(|l| parse_log_line(l).is_some()));
    }
}
