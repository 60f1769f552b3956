//! Payout Core Types
//!
//! Batches, payouts and attempt audit records, plus the status and
//! failure-code vocabularies shared by the store and the executor.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Batch identifier
///
/// ULID-based: monotonic, sortable, no coordination needed.
/// Stored as TEXT in PostgreSQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(ulid::Ulid);

impl BatchId {
    /// Generate a new unique BatchId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// Payout identifier (ULID, stored as TEXT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayoutId(ulid::Ulid);

impl PayoutId {
    /// Generate a new unique PayoutId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for PayoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PayoutId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// Batch lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    InProgress,
    Completed,
    PartiallyCompleted,
    Failed,
}

impl BatchStatus {
    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::InProgress => "in_progress",
            BatchStatus::Completed => "completed",
            BatchStatus::PartiallyCompleted => "partially_completed",
            BatchStatus::Failed => "failed",
        }
    }

    /// Parse from storage representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BatchStatus::Pending),
            "in_progress" => Some(BatchStatus::InProgress),
            "completed" => Some(BatchStatus::Completed),
            "partially_completed" => Some(BatchStatus::PartiallyCompleted),
            "failed" => Some(BatchStatus::Failed),
            _ => None,
        }
    }

    /// Terminal statuses never change again (absent an operator retry)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Completed | BatchStatus::PartiallyCompleted | BatchStatus::Failed
        )
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payout lifecycle status
///
/// Transitions follow pending → processing → {completed | failed | pending}.
/// The pending → processing edge is the claim and is the only contended one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Processing => "processing",
            PayoutStatus::Completed => "completed",
            PayoutStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PayoutStatus::Pending),
            "processing" => Some(PayoutStatus::Processing),
            "completed" => Some(PayoutStatus::Completed),
            "failed" => Some(PayoutStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PayoutStatus::Completed | PayoutStatus::Failed)
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bank transfer failure codes
///
/// Closed set. The retryable subset triggers requeue within the retry
/// budget; the rest terminate the payout on first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    InvalidBankAccount,
    InsufficientFunds,
    BankApiTimeout,
    AccountBlocked,
    RateLimited,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::InvalidBankAccount => "INVALID_BANK_ACCOUNT",
            FailureCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            FailureCode::BankApiTimeout => "BANK_API_TIMEOUT",
            FailureCode::AccountBlocked => "ACCOUNT_BLOCKED",
            FailureCode::RateLimited => "RATE_LIMITED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INVALID_BANK_ACCOUNT" => Some(FailureCode::InvalidBankAccount),
            "INSUFFICIENT_FUNDS" => Some(FailureCode::InsufficientFunds),
            "BANK_API_TIMEOUT" => Some(FailureCode::BankApiTimeout),
            "ACCOUNT_BLOCKED" => Some(FailureCode::AccountBlocked),
            "RATE_LIMITED" => Some(FailureCode::RateLimited),
            _ => None,
        }
    }

    /// Transient failures that earn another attempt within the budget
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureCode::InsufficientFunds | FailureCode::BankApiTimeout | FailureCode::RateLimited
        )
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Default retry budget for a payout
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// A batch of payouts treated as one unit of progress reporting
///
/// Counter columns are a cached projection refreshed from the payout rows;
/// `BatchStatistics` is the live aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutBatch {
    pub id: BatchId,
    pub status: BatchStatus,
    pub total_count: i64,
    pub completed_count: i64,
    pub failed_count: i64,
    pub pending_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// One disbursement to one vendor; the unit of at-most-once execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub id: PayoutId,
    pub batch_id: BatchId,
    /// "{vendor_id}:{batch_id}", globally unique; forwarded downstream so
    /// an idempotent bank API can reject duplicate submissions.
    pub idempotency_key: String,
    pub vendor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub bank_account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    /// Back-reference IDs carried for audit only
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub transaction_ids: Vec<String>,
    pub status: PayoutStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureCode>,
    pub attempt_count: i32,
    pub max_retries: i32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Build the idempotency key for a (vendor, batch) pair
pub fn idempotency_key(vendor_id: &str, batch_id: BatchId) -> String {
    format!("{}:{}", vendor_id, batch_id)
}

/// Outcome of an attempt, as recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Completed,
    Failed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Completed => "completed",
            AttemptStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(AttemptStatus::Completed),
            "failed" => Some(AttemptStatus::Failed),
            _ => None,
        }
    }
}

/// Append-only audit record for one claim → outcome cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutAttempt {
    pub id: ulid::Ulid,
    pub payout_id: PayoutId,
    /// Post-increment attempt_count of the enclosing claim; gap-free and
    /// monotonic per payout.
    pub attempt_num: i32,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureCode>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A single payout item in a batch creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayout {
    pub vendor_id: String,
    #[serde(default)]
    pub vendor_name: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub bank_account: String,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub transaction_ids: Vec<String>,
}

/// Live aggregate over a batch's payouts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub total: i64,
    pub completed: i64,
    pub failed: i64,
    pub pending: i64,
    pub processing: i64,
    pub success_rate_percent: f64,
    pub completion_rate_percent: f64,
}

impl BatchStatistics {
    /// Compute the derived rates from the raw counts
    pub fn with_rates(mut self) -> Self {
        if self.total > 0 {
            self.success_rate_percent = self.completed as f64 / self.total as f64 * 100.0;
            let processed = self.completed + self.failed;
            self.completion_rate_percent = processed as f64 / self.total as f64 * 100.0;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_status_roundtrip() {
        for s in [
            BatchStatus::Pending,
            BatchStatus::InProgress,
            BatchStatus::Completed,
            BatchStatus::PartiallyCompleted,
            BatchStatus::Failed,
        ] {
            assert_eq!(BatchStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(BatchStatus::parse("bogus"), None);
    }

    #[test]
    fn test_payout_status_roundtrip() {
        for s in [
            PayoutStatus::Pending,
            PayoutStatus::Processing,
            PayoutStatus::Completed,
            PayoutStatus::Failed,
        ] {
            assert_eq!(PayoutStatus::parse(s.as_str()), Some(s));
        }
        assert!(PayoutStatus::Completed.is_terminal());
        assert!(PayoutStatus::Failed.is_terminal());
        assert!(!PayoutStatus::Processing.is_terminal());
    }

    #[test]
    fn test_retryable_set() {
        assert!(FailureCode::InsufficientFunds.is_retryable());
        assert!(FailureCode::BankApiTimeout.is_retryable());
        assert!(FailureCode::RateLimited.is_retryable());
        assert!(!FailureCode::InvalidBankAccount.is_retryable());
        assert!(!FailureCode::AccountBlocked.is_retryable());
    }

    #[test]
    fn test_failure_code_roundtrip() {
        for c in [
            FailureCode::InvalidBankAccount,
            FailureCode::InsufficientFunds,
            FailureCode::BankApiTimeout,
            FailureCode::AccountBlocked,
            FailureCode::RateLimited,
        ] {
            assert_eq!(FailureCode::parse(c.as_str()), Some(c));
        }
    }

    #[test]
    fn test_idempotency_key_format() {
        let batch_id = BatchId::new();
        let key = idempotency_key("vendor_ID_00042", batch_id);
        assert_eq!(key, format!("vendor_ID_00042:{}", batch_id));
    }

    #[test]
    fn test_statistics_rates() {
        let stats = BatchStatistics {
            total: 50,
            completed: 40,
            failed: 10,
            ..Default::default()
        }
        .with_rates();
        assert_eq!(stats.success_rate_percent, 80.0);
        assert_eq!(stats.completion_rate_percent, 100.0);

        let empty = BatchStatistics::default().with_rates();
        assert_eq!(empty.success_rate_percent, 0.0);
    }

    #[test]
    fn test_batch_id_parse_roundtrip() {
        let id = BatchId::new();
        let parsed: BatchId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
