//! Payout Executor
//!
//! The scheduling loop and worker pool. Pulls pending payouts in chunks,
//! fans them out to a bounded set of concurrent workers, and commits every
//! outcome through the store. Resumable: all progress lives in the store,
//! never in memory, so a crashed or stopped run continues from where it
//! left off.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use super::bank::{BankClient, TransferOutcome};
use super::error::PayoutError;
use super::store::PayoutStore;
use super::types::{AttemptStatus, BatchId, BatchStatistics, BatchStatus, Payout, PayoutAttempt};

/// Executor tuning knobs
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum workers in flight within a chunk
    pub concurrency: usize,
    /// Payouts pulled from the store per iteration
    pub chunk_size: i64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            chunk_size: 100,
        }
    }
}

/// Releases the single-flight guard even when the owning future is dropped
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Worker pool processing one batch at a time
///
/// `running` serializes batches within this process; correctness against
/// other processes comes from the store's claim, not from this flag.
pub struct PayoutExecutor {
    store: Arc<dyn PayoutStore>,
    bank: Arc<dyn BankClient>,
    config: ExecutorConfig,
    running: AtomicBool,
    stop: AtomicBool,
}

impl PayoutExecutor {
    pub fn new(store: Arc<dyn PayoutStore>, bank: Arc<dyn BankClient>, config: ExecutorConfig) -> Self {
        Self {
            store,
            bank,
            config,
            running: AtomicBool::new(false),
            stop: AtomicBool::new(false),
        }
    }

    /// Whether a batch is currently being processed
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the current run to stop after the in-flight chunk drains.
    /// No-op when idle. The next `process_batch` re-arms the signal.
    pub fn stop(&self) {
        if self.running.load(Ordering::SeqCst) {
            self.stop.store(true, Ordering::SeqCst);
            info!("Stop signal raised, will pause after current chunk");
        }
    }

    /// Process all pending payouts of a batch to termination (or until
    /// stopped). Safe to re-invoke at any time: already-claimed and terminal
    /// payouts are skipped by the claim guard.
    pub async fn process_batch(&self, batch_id: BatchId) -> Result<(), PayoutError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PayoutError::ProcessorBusy);
        }
        let _guard = RunningGuard(&self.running);
        self.stop.store(false, Ordering::SeqCst);

        info!(
            batch_id = %batch_id,
            concurrency = self.config.concurrency,
            chunk_size = self.config.chunk_size,
            bank = self.bank.name(),
            "Starting batch processing"
        );

        // Crash recovery: payouts left in processing by a dead run return to
        // pending. Their consumed attempts stay consumed.
        let reset = self.store.reset_stuck_processing(batch_id).await?;
        if reset > 0 {
            warn!(batch_id = %batch_id, count = reset, "Reset stuck processing payouts");
        }

        self.store
            .update_batch_status(batch_id, BatchStatus::InProgress)
            .await?;

        loop {
            if self.stop.load(Ordering::SeqCst) {
                info!(batch_id = %batch_id, "Stop signal received, pausing batch");
                return Ok(());
            }

            let chunk = self
                .store
                .pending_payouts(batch_id, self.config.chunk_size)
                .await?;
            if chunk.is_empty() {
                break;
            }

            debug!(batch_id = %batch_id, count = chunk.len(), "Processing chunk");
            self.process_chunk(chunk).await;

            if let Err(e) = self.store.refresh_batch_counts(batch_id).await {
                warn!(batch_id = %batch_id, error = %e, "Failed to refresh batch counts");
            }
        }

        // No pending left: classify the terminal status from live counts
        let stats = self.store.batch_statistics(batch_id).await?;
        let final_status = classify_terminal(&stats);

        self.store
            .update_batch_status(batch_id, final_status)
            .await?;
        let _ = self.store.refresh_batch_counts(batch_id).await;

        info!(
            batch_id = %batch_id,
            status = %final_status,
            completed = stats.completed,
            failed = stats.failed,
            "Batch finished"
        );

        Ok(())
    }

    /// Fan a chunk out to at most `concurrency` workers and wait for all of
    /// them. The stop signal short-circuits dispatch of the remainder, but
    /// workers already in flight always drain so their outcomes are not
    /// lost. Workers are detached tasks: dropping this future (caller-side
    /// cancellation) never aborts an in-flight transfer.
    async fn process_chunk(&self, payouts: Vec<Payout>) {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut handles = Vec::with_capacity(payouts.len());

        for payout in payouts {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break, // semaphore closed; cannot happen
            };

            let store = self.store.clone();
            let bank = self.bank.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                process_single_payout(store, bank, payout).await;
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task panicked");
            }
        }
    }
}

/// Per-item protocol: claim → transfer → commit outcome → log attempt.
///
/// The claim is the idempotency guard: a lost claim means another worker
/// owns the payout or it is already terminal, and this worker walks away
/// without touching anything.
async fn process_single_payout(
    store: Arc<dyn PayoutStore>,
    bank: Arc<dyn BankClient>,
    payout: Payout,
) {
    let attempt_num = match store.claim_payout(payout.id).await {
        Ok(Some(n)) => n,
        Ok(None) => return,
        Err(e) => {
            error!(payout_id = %payout.id, error = %e, "Failed to claim payout");
            return;
        }
    };

    let started_at = Utc::now();
    let outcome = bank.transfer(&payout).await;
    let finished_at = Utc::now();

    let attempt_error = match outcome {
        TransferOutcome::Success => {
            if let Err(e) = store.complete_payout(payout.id).await {
                // Left in processing; the next run's reset recovers it.
                error!(payout_id = %payout.id, error = %e, "Failed to complete payout");
            }
            None
        }
        TransferOutcome::Failure(code) => {
            if code.is_retryable() && attempt_num < payout.max_retries {
                debug!(
                    payout_id = %payout.id,
                    code = %code,
                    attempt = attempt_num,
                    max_retries = payout.max_retries,
                    "Retryable failure, requeueing"
                );
                if let Err(e) = store.requeue_payout(payout.id).await {
                    error!(payout_id = %payout.id, error = %e, "Failed to requeue payout");
                }
            } else {
                debug!(
                    payout_id = %payout.id,
                    code = %code,
                    attempt = attempt_num,
                    "Permanent failure"
                );
                if let Err(e) = store.fail_payout(payout.id, code).await {
                    error!(payout_id = %payout.id, error = %e, "Failed to fail payout");
                }
            }
            Some(code)
        }
    };

    let attempt = PayoutAttempt {
        id: ulid::Ulid::new(),
        payout_id: payout.id,
        attempt_num,
        status: if attempt_error.is_none() {
            AttemptStatus::Completed
        } else {
            AttemptStatus::Failed
        },
        error: attempt_error,
        started_at,
        finished_at,
    };

    // Audit log is best-effort: payout state is already committed.
    if let Err(e) = store.log_attempt(&attempt).await {
        error!(payout_id = %payout.id, error = %e, "Failed to log attempt");
    }
}

/// Terminal status from live statistics, once no pending/processing remain
fn classify_terminal(stats: &BatchStatistics) -> BatchStatus {
    if stats.failed == 0 {
        BatchStatus::Completed
    } else if stats.completed == 0 {
        BatchStatus::Failed
    } else {
        BatchStatus::PartiallyCompleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_config_default() {
        let config = ExecutorConfig::default();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.chunk_size, 100);
    }

    #[test]
    fn test_classify_terminal() {
        let mk = |completed, failed| BatchStatistics {
            total: completed + failed,
            completed,
            failed,
            ..Default::default()
        };

        assert_eq!(classify_terminal(&mk(50, 0)), BatchStatus::Completed);
        assert_eq!(classify_terminal(&mk(0, 50)), BatchStatus::Failed);
        assert_eq!(
            classify_terminal(&mk(42, 8)),
            BatchStatus::PartiallyCompleted
        );
        // Empty batch degenerates to completed
        assert_eq!(classify_terminal(&mk(0, 0)), BatchStatus::Completed);
    }
}
