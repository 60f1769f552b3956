//! Gateway request/response types

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::payout::{BatchStatus, NewPayout, PayoutError};

/// Create-batch request body
#[derive(Debug, Deserialize)]
pub struct CreateBatchRequest {
    pub payouts: Vec<NewPayout>,
}

/// Create-batch response
#[derive(Debug, Serialize)]
pub struct CreateBatchResponse {
    pub message: String,
    pub batch_id: String,
    pub total: i64,
    pub status: BatchStatus,
}

/// Start / stop / informational responses
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            batch_id: None,
        }
    }

    pub fn with_batch(message: impl Into<String>, batch_id: impl ToString) -> Self {
        Self {
            message: message.into(),
            batch_id: Some(batch_id.to_string()),
        }
    }
}

/// Retry-failed response
#[derive(Debug, Serialize)]
pub struct RetryResponse {
    pub message: String,
    pub requeued: u64,
}

/// Query parameters for the payout listing
#[derive(Debug, Deserialize)]
pub struct ListPayoutsQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Error body: `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// Handler-level error wrapper mapping `PayoutError` to an HTTP response
#[derive(Debug)]
pub struct ApiError(pub PayoutError);

impl From<PayoutError> for ApiError {
    fn from(e: PayoutError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.0.to_string(),
            code: self.0.code(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
