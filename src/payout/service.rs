//! Payout Control Surface
//!
//! The thin operation layer invoked by the outside world. Orchestrates the
//! store and the executor; contains no payout logic of its own.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use super::error::PayoutError;
use super::executor::PayoutExecutor;
use super::store::PayoutStore;
use super::types::{BatchId, BatchStatistics, NewPayout, Payout, PayoutBatch, PayoutStatus};

/// Default page size for payout listings
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Upper bound on page size
pub const MAX_PAGE_SIZE: u32 = 200;

/// Batch row plus live statistics
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub batch: PayoutBatch,
    pub statistics: BatchStatistics,
}

/// One page of payouts
#[derive(Debug, Clone, Serialize)]
pub struct PayoutPage {
    pub payouts: Vec<Payout>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
}

/// Control surface over store + executor
pub struct PayoutService {
    store: Arc<dyn PayoutStore>,
    executor: Arc<PayoutExecutor>,
}

impl PayoutService {
    pub fn new(store: Arc<dyn PayoutStore>, executor: Arc<PayoutExecutor>) -> Self {
        Self { store, executor }
    }

    /// Validate and persist a new batch. All-or-nothing: any invalid item
    /// rejects the whole request with no state change.
    pub async fn create_batch(&self, items: Vec<NewPayout>) -> Result<PayoutBatch, PayoutError> {
        validate_items(&items)?;

        let batch = self.store.create_batch(&items).await?;
        info!(batch_id = %batch.id, total = batch.total_count, "Batch created");
        Ok(batch)
    }

    /// Begin or resume processing a batch on a detached task.
    /// Conflict when the executor is already busy.
    pub async fn start_batch(&self, batch_id: BatchId) -> Result<(), PayoutError> {
        self.store
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| PayoutError::BatchNotFound(batch_id.to_string()))?;

        if self.executor.is_running() {
            return Err(PayoutError::ProcessorBusy);
        }

        let executor = self.executor.clone();
        tokio::spawn(async move {
            if let Err(e) = executor.process_batch(batch_id).await {
                error!(batch_id = %batch_id, error = %e, "Batch processing aborted");
            }
        });

        Ok(())
    }

    /// Raise the stop signal; the current chunk drains, then the loop exits
    pub fn stop(&self) {
        self.executor.stop();
    }

    /// Whether the executor is processing a batch right now
    pub fn is_processing(&self) -> bool {
        self.executor.is_running()
    }

    /// Batch row plus live statistics
    pub async fn batch_status(&self, batch_id: BatchId) -> Result<BatchSummary, PayoutError> {
        let batch = self
            .store
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| PayoutError::BatchNotFound(batch_id.to_string()))?;
        let statistics = self.store.batch_statistics(batch_id).await?;

        Ok(BatchSummary { batch, statistics })
    }

    /// Paged payout listing with optional status filter. Page is 1-based;
    /// page_size is clamped to [1, MAX_PAGE_SIZE].
    pub async fn list_payouts(
        &self,
        batch_id: BatchId,
        status: Option<PayoutStatus>,
        page: u32,
        page_size: u32,
    ) -> Result<PayoutPage, PayoutError> {
        let page = page.max(1);
        let page_size = if (1..=MAX_PAGE_SIZE).contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };

        let (payouts, total_count) = self
            .store
            .list_payouts(batch_id, status, page, page_size)
            .await?;

        Ok(PayoutPage {
            payouts,
            total_count,
            page,
            page_size,
        })
    }

    /// Requeue retryable terminal failures with budget left; kicks the
    /// executor when anything was requeued and it is idle. Returns the
    /// number of payouts requeued.
    pub async fn retry_failed(&self, batch_id: BatchId) -> Result<u64, PayoutError> {
        self.store
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| PayoutError::BatchNotFound(batch_id.to_string()))?;

        let requeued = self.store.retry_failed_payouts(batch_id).await?;
        info!(batch_id = %batch_id, requeued = requeued, "Retry failed payouts");

        if requeued > 0 && !self.executor.is_running() {
            let executor = self.executor.clone();
            tokio::spawn(async move {
                if let Err(e) = executor.process_batch(batch_id).await {
                    error!(batch_id = %batch_id, error = %e, "Retry processing aborted");
                }
            });
        }

        Ok(requeued)
    }
}

/// Request validation: minimum one item, positive amounts, required fields,
/// no duplicate vendor within the batch.
fn validate_items(items: &[NewPayout]) -> Result<(), PayoutError> {
    if items.is_empty() {
        return Err(PayoutError::EmptyBatch);
    }

    let mut seen = HashSet::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if item.vendor_id.is_empty() {
            return Err(PayoutError::MissingField {
                field: "vendor_id",
                index,
            });
        }
        if item.currency.is_empty() {
            return Err(PayoutError::MissingField {
                field: "currency",
                index,
            });
        }
        if item.bank_account.is_empty() {
            return Err(PayoutError::MissingField {
                field: "bank_account",
                index,
            });
        }
        if item.amount <= rust_decimal::Decimal::ZERO {
            return Err(PayoutError::InvalidAmount(item.vendor_id.clone()));
        }
        if !seen.insert(item.vendor_id.as_str()) {
            return Err(PayoutError::DuplicateVendor(item.vendor_id.clone()));
        }
    }

    Ok(())
}
