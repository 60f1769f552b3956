//! In-Memory Payout Store
//!
//! Mutex-guarded implementation of the same contract as the PostgreSQL
//! store. Used by the scenario tests and for local development without a
//! database. Claim exclusivity holds because the pending check and the
//! processing transition happen under a single lock acquisition.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::error::PayoutError;
use super::store::PayoutStore;
use super::types::{
    BatchId, BatchStatistics, BatchStatus, DEFAULT_MAX_RETRIES, FailureCode, NewPayout, Payout,
    PayoutAttempt, PayoutBatch, PayoutId, PayoutStatus, idempotency_key,
};

#[derive(Default)]
struct Inner {
    batches: HashMap<BatchId, PayoutBatch>,
    payouts: HashMap<PayoutId, Payout>,
    /// Insertion order per batch; pending pulls walk this to preserve the
    /// created_at ordering of the durable store.
    batch_order: HashMap<BatchId, Vec<PayoutId>>,
    attempts: Vec<PayoutAttempt>,
}

/// In-memory store
#[derive(Default)]
pub struct MemoryPayoutStore {
    inner: Mutex<Inner>,
}

impl MemoryPayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt audit records for one payout, in insertion order.
    /// Test/inspection helper; not part of the store contract.
    pub fn attempts_for(&self, payout_id: PayoutId) -> Vec<PayoutAttempt> {
        let inner = self.inner.lock().unwrap();
        inner
            .attempts
            .iter()
            .filter(|a| a.payout_id == payout_id)
            .cloned()
            .collect()
    }

    /// Snapshot of a payout row. Test/inspection helper.
    pub fn payout(&self, payout_id: PayoutId) -> Option<Payout> {
        let inner = self.inner.lock().unwrap();
        inner.payouts.get(&payout_id).cloned()
    }
}

#[async_trait]
impl PayoutStore for MemoryPayoutStore {
    async fn create_batch(&self, items: &[NewPayout]) -> Result<PayoutBatch, PayoutError> {
        let mut inner = self.inner.lock().unwrap();

        // Wholesale rejection: validate all keys before writing anything
        let batch_id = BatchId::new();
        let mut seen = std::collections::HashSet::new();
        for item in items {
            if !seen.insert(item.vendor_id.as_str()) {
                return Err(PayoutError::DuplicateVendor(item.vendor_id.clone()));
            }
        }

        let now = Utc::now();
        let total = items.len() as i64;

        let batch = PayoutBatch {
            id: batch_id,
            status: BatchStatus::Pending,
            total_count: total,
            completed_count: 0,
            failed_count: 0,
            pending_count: total,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        };

        let mut order = Vec::with_capacity(items.len());
        for item in items {
            let payout_id = PayoutId::new();
            let payout = Payout {
                id: payout_id,
                batch_id,
                idempotency_key: idempotency_key(&item.vendor_id, batch_id),
                vendor_id: item.vendor_id.clone(),
                vendor_name: item.vendor_name.clone(),
                amount: item.amount,
                currency: item.currency.clone(),
                bank_account: item.bank_account.clone(),
                bank_name: item.bank_name.clone(),
                transaction_ids: item.transaction_ids.clone(),
                status: PayoutStatus::Pending,
                failure_reason: None,
                attempt_count: 0,
                max_retries: DEFAULT_MAX_RETRIES,
                created_at: now,
                attempted_at: None,
                completed_at: None,
                updated_at: now,
            };
            inner.payouts.insert(payout_id, payout);
            order.push(payout_id);
        }

        inner.batch_order.insert(batch_id, order);
        inner.batches.insert(batch_id, batch.clone());

        Ok(batch)
    }

    async fn get_batch(&self, batch_id: BatchId) -> Result<Option<PayoutBatch>, PayoutError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.batches.get(&batch_id).cloned())
    }

    async fn update_batch_status(
        &self,
        batch_id: BatchId,
        status: BatchStatus,
    ) -> Result<(), PayoutError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        if let Some(batch) = inner.batches.get_mut(&batch_id) {
            batch.status = status;
            if status == BatchStatus::InProgress {
                batch.started_at = Some(now);
            } else if status.is_terminal() {
                batch.completed_at = Some(now);
            }
            batch.updated_at = now;
        }
        Ok(())
    }

    async fn refresh_batch_counts(&self, batch_id: BatchId) -> Result<(), PayoutError> {
        let mut inner = self.inner.lock().unwrap();
        let (mut completed, mut failed, mut pending) = (0i64, 0i64, 0i64);
        for p in inner.payouts.values().filter(|p| p.batch_id == batch_id) {
            match p.status {
                PayoutStatus::Completed => completed += 1,
                PayoutStatus::Failed => failed += 1,
                PayoutStatus::Pending | PayoutStatus::Processing => pending += 1,
            }
        }
        if let Some(batch) = inner.batches.get_mut(&batch_id) {
            batch.completed_count = completed;
            batch.failed_count = failed;
            batch.pending_count = pending;
            batch.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn batch_statistics(&self, batch_id: BatchId) -> Result<BatchStatistics, PayoutError> {
        let inner = self.inner.lock().unwrap();
        let mut stats = BatchStatistics::default();
        for p in inner.payouts.values().filter(|p| p.batch_id == batch_id) {
            stats.total += 1;
            match p.status {
                PayoutStatus::Completed => stats.completed += 1,
                PayoutStatus::Failed => stats.failed += 1,
                PayoutStatus::Pending => stats.pending += 1,
                PayoutStatus::Processing => stats.processing += 1,
            }
        }
        Ok(stats.with_rates())
    }

    async fn pending_payouts(
        &self,
        batch_id: BatchId,
        limit: i64,
    ) -> Result<Vec<Payout>, PayoutError> {
        let inner = self.inner.lock().unwrap();
        let ids = match inner.batch_order.get(&batch_id) {
            Some(ids) => ids,
            None => return Ok(Vec::new()),
        };
        Ok(ids
            .iter()
            .filter_map(|id| inner.payouts.get(id))
            .filter(|p| p.status == PayoutStatus::Pending)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn claim_payout(&self, payout_id: PayoutId) -> Result<Option<i32>, PayoutError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(payout) = inner.payouts.get_mut(&payout_id) else {
            return Ok(None);
        };
        if payout.status != PayoutStatus::Pending {
            return Ok(None);
        }
        let now = Utc::now();
        payout.status = PayoutStatus::Processing;
        payout.attempt_count += 1;
        payout.attempted_at = Some(now);
        payout.updated_at = now;
        Ok(Some(payout.attempt_count))
    }

    async fn complete_payout(&self, payout_id: PayoutId) -> Result<(), PayoutError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(payout) = inner.payouts.get_mut(&payout_id) {
            let now = Utc::now();
            payout.status = PayoutStatus::Completed;
            payout.completed_at = Some(now);
            payout.updated_at = now;
        }
        Ok(())
    }

    async fn fail_payout(
        &self,
        payout_id: PayoutId,
        reason: FailureCode,
    ) -> Result<(), PayoutError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(payout) = inner.payouts.get_mut(&payout_id) {
            payout.status = PayoutStatus::Failed;
            payout.failure_reason = Some(reason);
            payout.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn requeue_payout(&self, payout_id: PayoutId) -> Result<(), PayoutError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(payout) = inner.payouts.get_mut(&payout_id) {
            if payout.attempt_count < payout.max_retries {
                payout.status = PayoutStatus::Pending;
                payout.failure_reason = None;
                payout.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn reset_stuck_processing(&self, batch_id: BatchId) -> Result<u64, PayoutError> {
        let mut inner = self.inner.lock().unwrap();
        let mut reset = 0u64;
        for payout in inner.payouts.values_mut() {
            if payout.batch_id == batch_id
                && payout.status == PayoutStatus::Processing
                && payout.attempt_count < payout.max_retries
            {
                payout.status = PayoutStatus::Pending;
                payout.updated_at = Utc::now();
                reset += 1;
            }
        }
        Ok(reset)
    }

    async fn retry_failed_payouts(&self, batch_id: BatchId) -> Result<u64, PayoutError> {
        let mut inner = self.inner.lock().unwrap();
        let mut requeued = 0u64;
        for payout in inner.payouts.values_mut() {
            if payout.batch_id == batch_id
                && payout.status == PayoutStatus::Failed
                && payout.attempt_count < payout.max_retries
                && payout.failure_reason.is_some_and(|r| r.is_retryable())
            {
                payout.status = PayoutStatus::Pending;
                payout.failure_reason = None;
                payout.updated_at = Utc::now();
                requeued += 1;
            }
        }
        Ok(requeued)
    }

    async fn list_payouts(
        &self,
        batch_id: BatchId,
        status: Option<PayoutStatus>,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<Payout>, i64), PayoutError> {
        let inner = self.inner.lock().unwrap();
        let ids = match inner.batch_order.get(&batch_id) {
            Some(ids) => ids,
            None => return Ok((Vec::new(), 0)),
        };
        let matching: Vec<&Payout> = ids
            .iter()
            .filter_map(|id| inner.payouts.get(id))
            .filter(|p| status.is_none_or(|s| p.status == s))
            .collect();

        let total = matching.len() as i64;
        let offset = (page.saturating_sub(1) as usize) * page_size as usize;
        let payouts = matching
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok((payouts, total))
    }

    async fn log_attempt(&self, attempt: &PayoutAttempt) -> Result<(), PayoutError> {
        let mut inner = self.inner.lock().unwrap();
        inner.attempts.push(attempt.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn items(n: usize) -> Vec<NewPayout> {
        (0..n)
            .map(|i| NewPayout {
                vendor_id: format!("vendor_{:04}", i),
                vendor_name: None,
                amount: Decimal::new(5000, 2),
                currency: "USD".to_string(),
                bank_account: format!("ACC{:06}", i),
                bank_name: None,
                transaction_ids: vec![],
            })
            .collect()
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let store = MemoryPayoutStore::new();
        let batch = store.create_batch(&items(1)).await.unwrap();
        let pending = store.pending_payouts(batch.id, 10).await.unwrap();
        let id = pending[0].id;

        assert_eq!(store.claim_payout(id).await.unwrap(), Some(1));
        assert_eq!(store.claim_payout(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_claim_single_winner() {
        let store = Arc::new(MemoryPayoutStore::new());
        let batch = store.create_batch(&items(1)).await.unwrap();
        let id = store.pending_payouts(batch.id, 1).await.unwrap()[0].id;

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.claim_payout(id).await.unwrap().is_some()
            }));
        }

        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_requeue_respects_budget() {
        let store = MemoryPayoutStore::new();
        let batch = store.create_batch(&items(1)).await.unwrap();
        let id = store.pending_payouts(batch.id, 1).await.unwrap()[0].id;

        // Burn the whole budget
        for expected in 1..=DEFAULT_MAX_RETRIES {
            assert_eq!(store.claim_payout(id).await.unwrap(), Some(expected));
            store.requeue_payout(id).await.unwrap();
        }

        // Third requeue was refused: attempt_count == max_retries
        let payout = store.payout(id).unwrap();
        assert_eq!(payout.attempt_count, DEFAULT_MAX_RETRIES);
        assert_eq!(payout.status, PayoutStatus::Processing);
    }

    #[tokio::test]
    async fn test_duplicate_vendor_rejected_wholesale() {
        let store = MemoryPayoutStore::new();
        let mut batch_items = items(2);
        batch_items[1].vendor_id = batch_items[0].vendor_id.clone();

        let err = store.create_batch(&batch_items).await.unwrap_err();
        assert!(matches!(err, PayoutError::DuplicateVendor(_)));

        // Nothing was written
        let inner = store.inner.lock().unwrap();
        assert!(inner.batches.is_empty());
        assert!(inner.payouts.is_empty());
    }

    #[tokio::test]
    async fn test_pending_pull_preserves_order() {
        let store = MemoryPayoutStore::new();
        let batch = store.create_batch(&items(5)).await.unwrap();

        let pending = store.pending_payouts(batch.id, 3).await.unwrap();
        assert_eq!(pending.len(), 3);
        assert_eq!(pending[0].vendor_id, "vendor_0000");
        assert_eq!(pending[2].vendor_id, "vendor_0002");
    }

    #[tokio::test]
    async fn test_list_payouts_paging() {
        let store = MemoryPayoutStore::new();
        let batch = store.create_batch(&items(7)).await.unwrap();

        let (page1, total) = store.list_payouts(batch.id, None, 1, 3).await.unwrap();
        assert_eq!(total, 7);
        assert_eq!(page1.len(), 3);

        let (page3, _) = store.list_payouts(batch.id, None, 3, 3).await.unwrap();
        assert_eq!(page3.len(), 1);

        let (filtered, total_pending) = store
            .list_payouts(batch.id, Some(PayoutStatus::Completed), 1, 50)
            .await
            .unwrap();
        assert_eq!(total_pending, 0);
        assert!(filtered.is_empty());
    }
}
