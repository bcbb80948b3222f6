//! Pipeline error → HTTP status mapping.
//!
//! Input errors map to 4xx, duplicate ingestion to 409, backend/service
//! failures to 502, and everything else to 500. The body is always
//! `{"error": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use marginalia_ingestion::{AcquireError, IngestError};
use marginalia_qa::QaError;
use marginalia_store::StoreError;

pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl ToString) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Duplicate(_) => StatusCode::CONFLICT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        let status = match &err {
            IngestError::NotPdf(_) => StatusCode::BAD_REQUEST,
            IngestError::Acquire(AcquireError::MalformedDocument(_)) => StatusCode::BAD_REQUEST,
            IngestError::Acquire(_) => StatusCode::BAD_GATEWAY,
            IngestError::Extract(_) => StatusCode::BAD_GATEWAY,
            IngestError::Generate(_) => StatusCode::BAD_GATEWAY,
            IngestError::Store(store) => store_status(store),
        };
        ApiError::new(status, err)
    }
}

impl From<QaError> for ApiError {
    fn from(err: QaError) -> Self {
        let status = match &err {
            QaError::Generate(_) => StatusCode::BAD_GATEWAY,
            QaError::Store(store) => store_status(store),
        };
        ApiError::new(status, err)
    }
}
