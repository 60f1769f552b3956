//! Payout Error Types
//!
//! All error paths of the engine. Bank transfer failures are NOT errors;
//! they are absorbed into payout state as `FailureCode`.

use thiserror::Error;

/// Engine error types
#[derive(Error, Debug, Clone)]
pub enum PayoutError {
    // === Validation Errors ===
    #[error("Batch must contain at least one payout")]
    EmptyBatch,

    #[error("Amount must be greater than zero for vendor {0}")]
    InvalidAmount(String),

    #[error("Missing required field '{field}' for payout at index {index}")]
    MissingField { field: &'static str, index: usize },

    #[error("Duplicate vendor in batch: {0}")]
    DuplicateVendor(String),

    // === Lookup Errors ===
    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    #[error("Invalid batch ID: {0}")]
    InvalidBatchId(String),

    #[error("Unknown status filter: {0}")]
    InvalidStatusFilter(String),

    // === Conflict Errors ===
    #[error("A batch is already being processed")]
    ProcessorBusy,

    // === System Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PayoutError {
    /// Wire code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PayoutError::EmptyBatch => "EMPTY_BATCH",
            PayoutError::InvalidAmount(_) => "INVALID_AMOUNT",
            PayoutError::MissingField { .. } => "MISSING_FIELD",
            PayoutError::DuplicateVendor(_) => "DUPLICATE_VENDOR",
            PayoutError::BatchNotFound(_) => "BATCH_NOT_FOUND",
            PayoutError::InvalidBatchId(_) => "INVALID_BATCH_ID",
            PayoutError::InvalidStatusFilter(_) => "INVALID_STATUS_FILTER",
            PayoutError::ProcessorBusy => "PROCESSOR_BUSY",
            PayoutError::Database(_) => "DATABASE_ERROR",
            PayoutError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            PayoutError::EmptyBatch
            | PayoutError::InvalidAmount(_)
            | PayoutError::MissingField { .. }
            | PayoutError::DuplicateVendor(_)
            | PayoutError::InvalidBatchId(_)
            | PayoutError::InvalidStatusFilter(_) => 400,
            PayoutError::BatchNotFound(_) => 404,
            PayoutError::ProcessorBusy => 409,
            PayoutError::Database(_) | PayoutError::Internal(_) => 500,
        }
    }
}

impl From<sqlx::Error> for PayoutError {
    fn from(e: sqlx::Error) -> Self {
        PayoutError::Database(e.to_string())
    }
}
