//! # HTTP Surface
//!
//! The JSON API viewers and sensors talk to.
//!
//! | Route | Method | Body |
//! |---|---|---|
//! | `/` | GET | plain-text banner |
//! | `/health` | GET | `OK` |
//! | `/api/status` | GET | [`StatusReport`] |
//! | `/api/firms` | GET | [`FirmsReport`], at most [`FIRMS_RESPONSE_CAP`] fires |
//! | `/api/local-fires` | POST | detection in, [`IngestAck`] out |
//! | `/api/local-fires` | GET | up to [`LOCAL_READ_LIMIT`] most recent [`FireEvent`]s |
//!
//! `GET /api/local-fires` also carries the number of detections ever accepted
//! in the [`TOTAL_COUNT_HEADER`] response header, which viewers use as their
//! watermark.

mod error;

pub use error::AppError;

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::core::EventStore;
use crate::ingestors::{IngestionEndpoint, SatelliteDataset};
use crate::model::{FireEvent, FirmsReport, IngestAck, StatusReport};

pub use crate::model::TOTAL_COUNT_HEADER;

/// Most recent local detections served per read.
pub const LOCAL_READ_LIMIT: usize = 500;

/// Satellite hotspots served per read.
pub const FIRMS_RESPONSE_CAP: usize = 2000;

/// Value of `system` in the status report.
pub const SYSTEM_ACTIVE: &str = "active";

const BANNER: &str = "Forest Fire Backend Running";

/// Shared handles for the request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EventStore>,
    pub dataset: Arc<SatelliteDataset>,
    pub ingestion: Arc<IngestionEndpoint>,
}

impl AppState {
    pub fn new(dataset: Arc<SatelliteDataset>, ingestion: Arc<IngestionEndpoint>) -> Self {
        Self {
            store: Arc::clone(ingestion.store()),
            dataset,
            ingestion,
        }
    }
}

/// Builds the full router with permissive CORS.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { BANNER }))
        .route("/health", get(|| async { "OK" }))
        .route("/api/status", get(status_handler))
        .route("/api/firms", get(firms_handler))
        .route(
            "/api/local-fires",
            get(list_local_fires).post(ingest_local_fire),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusReport> {
    Json(StatusReport {
        system: SYSTEM_ACTIVE.to_string(),
        satellite_points: state.dataset.len(),
        local_points: state.store.total_accepted(),
        time: Utc::now(),
    })
}

async fn firms_handler(State(state): State<AppState>) -> Json<FirmsReport> {
    let snapshot = state.dataset.snapshot();
    Json(FirmsReport {
        count: snapshot.len(),
        fires: snapshot.iter().take(FIRMS_RESPONSE_CAP).copied().collect(),
    })
}

async fn list_local_fires(State(state): State<AppState>) -> impl IntoResponse {
    let (events, total): (Vec<FireEvent>, u64) = state.store.snapshot(LOCAL_READ_LIMIT);
    ([(TOTAL_COUNT_HEADER, total.to_string())], Json(events))
}

async fn ingest_local_fire(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IngestAck>, AppError> {
    let value: Value = serde_json::from_slice(&body).map_err(AppError::MalformedBody)?;
    state.ingestion.ingest(&value).await?;
    Ok(Json(IngestAck::ok()))
}
