//! Batch payout handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::payout::{BatchId, PayoutError, PayoutStatus};

use super::state::AppState;
use super::types::{
    ApiError, ApiResult, CreateBatchRequest, CreateBatchResponse, ListPayoutsQuery,
    MessageResponse, RetryResponse,
};

fn parse_batch_id(raw: &str) -> Result<BatchId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError(PayoutError::InvalidBatchId(raw.to_string())))
}

/// POST /api/v1/batches
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBatchRequest>,
) -> ApiResult<impl IntoResponse> {
    let batch = state.service.create_batch(req.payouts).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBatchResponse {
            message: "Batch created successfully".to_string(),
            batch_id: batch.id.to_string(),
            total: batch.total_count,
            status: batch.status,
        }),
    ))
}

/// POST /api/v1/batches/{id}/start
pub async fn start_batch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let batch_id = parse_batch_id(&id)?;
    state.service.start_batch(batch_id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::with_batch(
            "Batch processing started",
            batch_id,
        )),
    ))
}

/// POST /api/v1/batches/{id}/stop
pub async fn stop_batch(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.service.stop();
    Json(MessageResponse::new(
        "Stop signal sent. Processing will pause after current chunk.",
    ))
}

/// GET /api/v1/batches/{id}
pub async fn get_batch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let batch_id = parse_batch_id(&id)?;
    let summary = state.service.batch_status(batch_id).await?;
    Ok(Json(summary))
}

/// GET /api/v1/batches/{id}/payouts?status=failed&page=1&page_size=50
pub async fn list_payouts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ListPayoutsQuery>,
) -> ApiResult<impl IntoResponse> {
    let batch_id = parse_batch_id(&id)?;

    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            PayoutStatus::parse(raw)
                .ok_or_else(|| ApiError(PayoutError::InvalidStatusFilter(raw.to_string())))?,
        ),
    };

    let page = state
        .service
        .list_payouts(
            batch_id,
            status,
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(crate::payout::service::DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(Json(page))
}

/// POST /api/v1/batches/{id}/retry-failed
pub async fn retry_failed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let batch_id = parse_batch_id(&id)?;
    let requeued = state.service.retry_failed(batch_id).await?;

    if requeued == 0 {
        return Ok((
            StatusCode::OK,
            Json(RetryResponse {
                message: "No retryable payouts found".to_string(),
                requeued: 0,
            }),
        ));
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(RetryResponse {
            message: "Retrying failed payouts".to_string(),
            requeued,
        }),
    ))
}

/// GET /api/v1/health
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_status = match &state.db {
        Some(db) => match db.health_check().await {
            Ok(()) => "up",
            Err(_) => "down",
        },
        None => "not_configured",
    };

    let status = if db_status == "down" { "degraded" } else { "ok" };
    let code = if db_status == "down" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        code,
        Json(json!({
            "status": status,
            "database": db_status,
            "processing": state.service.is_processing(),
        })),
    )
}
