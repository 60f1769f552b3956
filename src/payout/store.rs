//! Payout Store Contract
//!
//! Every state transition of the engine is an atomic store operation; the
//! store is the single source of truth for resumability. Cross-worker
//! coordination happens exclusively through the conditional updates defined
//! here; there is no shared in-memory payout state.

use async_trait::async_trait;

use super::error::PayoutError;
use super::types::{
    BatchId, BatchStatistics, BatchStatus, FailureCode, NewPayout, Payout, PayoutAttempt,
    PayoutBatch, PayoutId, PayoutStatus,
};

/// Durable state for batches, payouts and attempt history.
///
/// `claim_payout` is the lynchpin: its conditional update is the only
/// primitive that grants a worker exclusive ownership of a payout. Every
/// other write either precedes a claim (discovery) or follows one (outcome
/// commit).
#[async_trait]
pub trait PayoutStore: Send + Sync {
    /// Insert one batch and all its payouts in a single transaction.
    /// Fails wholesale on any duplicate (vendor_id, batch_id).
    async fn create_batch(&self, items: &[NewPayout]) -> Result<PayoutBatch, PayoutError>;

    /// Snapshot read of the batch row
    async fn get_batch(&self, batch_id: BatchId) -> Result<Option<PayoutBatch>, PayoutError>;

    /// Set batch status; stamps started_at on entering in_progress and
    /// completed_at on entering a terminal status.
    async fn update_batch_status(
        &self,
        batch_id: BatchId,
        status: BatchStatus,
    ) -> Result<(), PayoutError>;

    /// Recompute the cached batch counters from the payout rows
    async fn refresh_batch_counts(&self, batch_id: BatchId) -> Result<(), PayoutError>;

    /// Live aggregate counts by status over the batch's payouts
    async fn batch_statistics(&self, batch_id: BatchId) -> Result<BatchStatistics, PayoutError>;

    /// Up to `limit` payouts in status=pending, created_at ascending
    async fn pending_payouts(
        &self,
        batch_id: BatchId,
        limit: i64,
    ) -> Result<Vec<Payout>, PayoutError>;

    /// Atomically transition pending → processing, stamping attempted_at and
    /// incrementing attempt_count. Returns the post-increment attempt_count,
    /// or `None` when the claim was lost (row no longer pending).
    async fn claim_payout(&self, payout_id: PayoutId) -> Result<Option<i32>, PayoutError>;

    /// Mark a payout completed (terminal), stamping completed_at
    async fn complete_payout(&self, payout_id: PayoutId) -> Result<(), PayoutError>;

    /// Mark a payout failed (terminal) with the recorded reason
    async fn fail_payout(
        &self,
        payout_id: PayoutId,
        reason: FailureCode,
    ) -> Result<(), PayoutError>;

    /// Return a processing payout to pending and clear its failure reason,
    /// only while attempt_count < max_retries.
    async fn requeue_payout(&self, payout_id: PayoutId) -> Result<(), PayoutError>;

    /// Crash recovery: every processing payout with retry budget left goes
    /// back to pending. attempt_count is NOT decremented: a crashed attempt
    /// still consumes a retry slot.
    async fn reset_stuck_processing(&self, batch_id: BatchId) -> Result<u64, PayoutError>;

    /// Operator retry: failed payouts with a retryable reason and budget
    /// left go back to pending with the reason cleared. Returns the count
    /// requeued.
    async fn retry_failed_payouts(&self, batch_id: BatchId) -> Result<u64, PayoutError>;

    /// Paged view over a batch's payouts with optional status filter.
    /// 1-based pages. Returns the page plus the unfiltered-by-page total.
    async fn list_payouts(
        &self,
        batch_id: BatchId,
        status: Option<PayoutStatus>,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<Payout>, i64), PayoutError>;

    /// Append an attempt audit record. Best-effort for callers: a failure
    /// here never affects payout state.
    async fn log_attempt(&self, attempt: &PayoutAttempt) -> Result<(), PayoutError>;
}
