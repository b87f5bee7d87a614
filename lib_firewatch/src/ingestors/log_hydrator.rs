//! # Log Hydrator
//!
//! Rebuilds the initial event store contents from the legacy fire log, one
//! line per historical detection:
//!
//! ```text
//! Tue Feb  3 02:19:37 2026 - FIRE at 12.971678, 77.594545
//! ```
//!
//! ## Rules
//! - Only the trailing window of non-empty lines (500 by default) is
//!   considered. The file is read backwards from its end in fixed-size chunks
//!   until the window is filled, so startup cost depends on the window and
//!   not on the size of the log.
//! - A line splits on the literal `" - FIRE at "`. The left side must parse as
//!   a timestamp (ctime or RFC 3339), the right side must split on `,` into
//!   exactly two finite numbers. Anything else is skipped silently.
//! - Confidence was never recorded, so it is synthesized with the same
//!   estimator the live ingestion path uses.
//! - Output keeps line order, oldest first.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::{ConfidenceEstimator, EventStore};
use crate::model::FireEvent;

/// Number of trailing log lines replayed at startup.
pub const HYDRATE_WINDOW_LINES: usize = 500;

/// Bytes read per step when scanning the log backwards from its end.
const TAIL_CHUNK_BYTES: u64 = 8 * 1024;

const FIRE_DELIMITER: &str = " - FIRE at ";

const CTIME_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

#[derive(Debug, Error)]
pub enum HydrationError {
    #[error("I/O error reading fire log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Outcome counts of one hydration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationReport {
    /// Non-empty lines inside the trailing window.
    pub considered: usize,
    pub accepted: usize,
    pub skipped: usize,
}

/// # Log Hydrator
pub struct LogHydrator {
    window_lines: usize,
    estimator: Arc<dyn ConfidenceEstimator>,
}

impl LogHydrator {
    pub fn new(estimator: Arc<dyn ConfidenceEstimator>) -> Self {
        Self {
            window_lines: HYDRATE_WINDOW_LINES,
            estimator,
        }
    }

    pub fn with_window(mut self, window_lines: usize) -> Self {
        self.window_lines = window_lines;
        self
    }

    /// Parses the trailing window of `lines` into events.
    pub fn hydrate_lines<'a, I>(&self, lines: I) -> (Vec<FireEvent>, HydrationReport)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let non_empty: Vec<&str> = lines.into_iter().filter(|l| !l.trim().is_empty()).collect();
        let window = &non_empty[non_empty.len().saturating_sub(self.window_lines)..];

        let mut report = HydrationReport {
            considered: window.len(),
            ..HydrationReport::default()
        };
        let mut events = Vec::with_capacity(window.len());
        for line in window {
            match parse_log_line(line) {
                Some((time, lat, lon)) => {
                    events.push(FireEvent {
                        lat,
                        lon,
                        confidence: self.estimator.estimate(),
                        time,
                    });
                    report.accepted += 1;
                }
                None => {
                    debug!(line = %line, "Skipping malformed fire log line");
                    report.skipped += 1;
                }
            }
        }
        (events, report)
    }

    /// Reads the tail of the log at `path` and parses it.
    ///
    /// A missing file is not an error: there is simply no history.
    pub fn hydrate_file(&self, path: &Path) -> Result<(Vec<FireEvent>, HydrationReport), HydrationError> {
        if !path.exists() {
            return Ok((Vec::new(), HydrationReport::default()));
        }
        let text = read_tail(path, self.window_lines)?;
        Ok(self.hydrate_lines(text.lines()))
    }

    /// Seeds `store` from the log at `path`. Never fails: I/O problems are
    /// logged and leave the store empty.
    pub fn hydrate_into(&self, path: &Path, store: &EventStore) -> HydrationReport {
        match self.hydrate_file(path) {
            Ok((events, report)) => {
                store.seed(events);
                info!(
                    path = %path.display(),
                    accepted = report.accepted,
                    skipped = report.skipped,
                    "Hydrated fires from log"
                );
                report
            }
            Err(e) => {
                warn!("Failed to load initial log: {}", e);
                HydrationReport::default()
            }
        }
    }
}

/// Reads backwards from the end of the file until it holds `window_lines`
/// complete non-empty lines or reaches the start of the file.
///
/// When the read stops mid-file, the text before the first newline may be a
/// partial line and is dropped.
fn read_tail(path: &Path, window_lines: usize) -> Result<String, HydrationError> {
    let io_err = |source| HydrationError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let mut start = file.metadata().map_err(io_err)?.len();
    let mut buf: Vec<u8> = Vec::new();

    while start > 0 && complete_lines(&buf) < window_lines {
        let next = start.saturating_sub(TAIL_CHUNK_BYTES);
        let mut chunk = vec![0u8; (start - next) as usize];
        file.seek(SeekFrom::Start(next)).map_err(io_err)?;
        file.read_exact(&mut chunk).map_err(io_err)?;
        chunk.extend_from_slice(&buf);
        buf = chunk;
        start = next;
    }

    let text = if start > 0 { after_first_newline(&buf) } else { &buf[..] };
    Ok(String::from_utf8_lossy(text).into_owned())
}

fn after_first_newline(buf: &[u8]) -> &[u8] {
    match buf.iter().position(|b| *b == b'\n') {
        Some(i) => &buf[i + 1..],
        None => &[],
    }
}

/// Non-empty lines in `buf` that are known to be whole.
fn complete_lines(buf: &[u8]) -> usize {
    after_first_newline(buf)
        .split(|b| *b == b'\n')
        .filter(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .count()
}

/// Parses one `"<timestamp> - FIRE at <lat>, <lon>"` line.
pub fn parse_log_line(line: &str) -> Option<(DateTime<Utc>, f64, f64)> {
    let (stamp, coords) = line.trim().split_once(FIRE_DELIMITER)?;
    let mut parts = coords.split(',');
    let lat = parse_coordinate(parts.next()?)?;
    let lon = parse_coordinate(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    let time = parse_timestamp(stamp)?;
    Some((time, lat, lon))
}

fn parse_coordinate(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts ctime (`Tue Feb  3 02:19:37 2026`, local time) or RFC 3339.
pub fn parse_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    let stamp = stamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(stamp) {
        return Some(dt.with_timezone(&Utc));
    }
    let normalized = stamp.split_whitespace().collect::<Vec<_>>().join(" ");
    let naive = NaiveDateTime::parse_from_str(&normalized, CTIME_FORMAT).ok()?;
    Some(
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc()),
    )
}
