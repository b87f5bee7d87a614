use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use crate::ingestors::IngestError;

/// # Application Error
///
/// Failures the HTTP surface reports to callers. Every variant is a client
/// error: the read paths cannot fail.
#[derive(Debug)]
pub enum AppError {
    /// The request body was not valid JSON.
    MalformedBody(serde_json::Error),
    /// The body parsed but failed detection validation.
    Validation(IngestError),
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        AppError::Validation(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_json) = match self {
            AppError::MalformedBody(e) => {
                warn!("Malformed JSON body: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error_type": "MalformedBody",
                        "message": "Request body is not valid JSON",
                        "detail": e.to_string()
                    }),
                )
            }
            AppError::Validation(e) => {
                let detail = match &e {
                    IngestError::NotAnObject => "body".to_string(),
                    IngestError::MissingField(field) | IngestError::NotNumeric(field) => field.to_string(),
                    IngestError::OutOfRange { field, .. } => field.to_string(),
                };
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error_type": "ValidationError",
                        "message": e.to_string(),
                        "detail": detail
                    }),
                )
            }
        };
        (status, Json(error_json)).into_response()
    }
}
