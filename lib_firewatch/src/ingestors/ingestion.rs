//! # Ingestion Endpoint
//!
//! The sole write path into the event store after startup. A request carries
//! `lat` and `lon` and optionally `confidence`. Validation happens before the
//! store is touched, so a rejected request never mutates it.
//!
//! - `lat` / `lon`: required, numeric (JSON numbers or numeric strings),
//!   within `[-90, 90]` / `[-180, 180]`.
//! - `confidence`: optional; `null` counts as absent. When present it must be
//!   numeric and within `[0, 1]`; when absent the configured
//!   [`ConfidenceEstimator`] supplies one.
//! - `time`: always server-assigned. Any client-supplied value is ignored.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::{ConfidenceEstimator, EventStore};
use crate::ingestors::fire_log::FireLog;
use crate::model::{Detection, FireEvent};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IngestError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Field `{0}` is not numeric")]
    NotNumeric(&'static str),

    #[error("Field `{field}` value {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub struct IngestionEndpoint {
    store: Arc<EventStore>,
    estimator: Arc<dyn ConfidenceEstimator>,
    journal: Option<Arc<FireLog>>,
}

impl IngestionEndpoint {
    pub fn new(store: Arc<EventStore>, estimator: Arc<dyn ConfidenceEstimator>) -> Self {
        Self {
            store,
            estimator,
            journal: None,
        }
    }

    /// Also append every accepted detection to `journal`.
    pub fn with_journal(mut self, journal: Arc<FireLog>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn store(&self) -> &Arc<EventStore> {
        &self.store
    }

    /// Validates a request body into a detection, synthesizing confidence
    /// when it is absent.
    pub fn validate(&self, body: &Value) -> Result<Detection, IngestError> {
        let obj = body.as_object().ok_or(IngestError::NotAnObject)?;
        let lat = required(obj, "lat", -90.0, 90.0)?;
        let lon = required(obj, "lon", -180.0, 180.0)?;
        let confidence = match numeric_field(obj, "confidence")? {
            Some(value) => in_range("confidence", value, 0.0, 1.0)?,
            None => self.estimator.estimate(),
        };
        Ok(Detection { lat, lon, confidence })
    }

    /// Validates and appends without touching the journal.
    pub fn accept(&self, body: &Value) -> Result<FireEvent, IngestError> {
        let detection = self.validate(body).inspect_err(|e| {
            warn!("Rejected local fire detection: {}", e);
        })?;
        let event = self.store.append(detection);
        debug!(lat = event.lat, lon = event.lon, confidence = event.confidence, "Accepted local fire");
        Ok(event)
    }

    /// Validates, appends and journals one detection. Journal failures are
    /// logged and do not fail the request.
    pub async fn ingest(&self, body: &Value) -> Result<FireEvent, IngestError> {
        let event = self.accept(body)?;
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.record(&event).await {
                warn!(path = %journal.path().display(), "Failed to journal local fire: {}", e);
            }
        }
        Ok(event)
    }
}

fn required(obj: &Map<String, Value>, field: &'static str, min: f64, max: f64) -> Result<f64, IngestError> {
    let value = numeric_field(obj, field)?.ok_or(IngestError::MissingField(field))?;
    in_range(field, value, min, max)
}

fn numeric_field(obj: &Map<String, Value>, field: &'static str) -> Result<Option<f64>, IngestError> {
    let parsed = match obj.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or(IngestError::NotNumeric(field))
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, IngestError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(IngestError::OutOfRange { field, value, min, max })
    }
}
