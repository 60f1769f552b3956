//! Bank Transfer Client
//!
//! The money-movement back-end behind a trait. The executor treats the call
//! as opaque and blocking; latency, timeouts and retries-on-the-wire are the
//! client's business. The payout's idempotency_key travels with the request
//! so a real bank API can reject duplicate submissions.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use super::types::{FailureCode, Payout};

/// Outcome of one transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Success,
    Failure(FailureCode),
}

impl TransferOutcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Success)
    }

    /// Failure code, if any
    pub fn failure_code(&self) -> Option<FailureCode> {
        match self {
            TransferOutcome::Success => None,
            TransferOutcome::Failure(code) => Some(*code),
        }
    }
}

/// Transfer back-end contract
#[async_trait]
pub trait BankClient: Send + Sync {
    /// Client name for logging
    fn name(&self) -> &'static str;

    /// Execute one transfer. May block for arbitrary latency; must not be
    /// assumed idempotent unless the downstream honors the payout's
    /// idempotency_key.
    async fn transfer(&self, payout: &Payout) -> TransferOutcome;
}

/// Simulated bank API with a realistic outcome distribution:
///
/// - 85% success
/// - 5%  INVALID_BANK_ACCOUNT (permanent)
/// - 3%  BANK_API_TIMEOUT (retryable)
/// - 3%  INSUFFICIENT_FUNDS (retryable)
/// - 2%  ACCOUNT_BLOCKED (permanent)
/// - 2%  RATE_LIMITED (retryable)
///
/// Each call sleeps a uniform random latency (default 50–500 ms) to exercise
/// the concurrency paths.
pub struct SimulatedBank {
    rng: Mutex<StdRng>,
    latency_ms: Range<u64>,
}

impl SimulatedBank {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            latency_ms: 50..500,
        }
    }

    /// Deterministic outcomes for tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            latency_ms: 50..500,
        }
    }

    /// Override the latency range (start == end disables the sleep)
    pub fn with_latency(mut self, latency_ms: Range<u64>) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    fn draw(&self) -> (TransferOutcome, u64) {
        let mut rng = self.rng.lock().unwrap();
        let latency = if self.latency_ms.is_empty() {
            self.latency_ms.start
        } else {
            rng.gen_range(self.latency_ms.clone())
        };
        let roll: f64 = rng.gen_range(0.0..100.0);

        let outcome = match roll {
            r if r < 85.0 => TransferOutcome::Success,
            r if r < 90.0 => TransferOutcome::Failure(FailureCode::InvalidBankAccount),
            r if r < 93.0 => TransferOutcome::Failure(FailureCode::BankApiTimeout),
            r if r < 96.0 => TransferOutcome::Failure(FailureCode::InsufficientFunds),
            r if r < 98.0 => TransferOutcome::Failure(FailureCode::AccountBlocked),
            _ => TransferOutcome::Failure(FailureCode::RateLimited),
        };

        (outcome, latency)
    }
}

impl Default for SimulatedBank {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BankClient for SimulatedBank {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn transfer(&self, payout: &Payout) -> TransferOutcome {
        let (outcome, latency) = self.draw();

        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        debug!(
            payout_id = %payout.id,
            idempotency_key = %payout.idempotency_key,
            vendor_id = %payout.vendor_id,
            amount = %payout.amount,
            latency_ms = latency,
            outcome = ?outcome,
            "Simulated bank transfer"
        );

        outcome
    }
}

/// Scripted bank for tests: per-vendor outcome sequences, then a default.
///
/// Outcomes are consumed in order per vendor; once a vendor's script is
/// exhausted every further call succeeds. Counts every call.
pub struct ScriptedBank {
    scripts: Mutex<std::collections::HashMap<String, Vec<TransferOutcome>>>,
    calls: std::sync::atomic::AtomicU64,
}

impl ScriptedBank {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(std::collections::HashMap::new()),
            calls: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Queue outcomes for one vendor, consumed front to back
    pub fn script(&self, vendor_id: &str, outcomes: Vec<TransferOutcome>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(vendor_id.to_string(), outcomes);
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl Default for ScriptedBank {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BankClient for ScriptedBank {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn transfer(&self, payout: &Payout) -> TransferOutcome {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&payout.vendor_id) {
            Some(queue) if !queue.is_empty() => queue.remove(0),
            _ => TransferOutcome::Success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payout::types::{BatchId, PayoutId, PayoutStatus, idempotency_key};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn dummy_payout(vendor_id: &str) -> Payout {
        let batch_id = BatchId::new();
        let now = Utc::now();
        Payout {
            id: PayoutId::new(),
            batch_id,
            idempotency_key: idempotency_key(vendor_id, batch_id),
            vendor_id: vendor_id.to_string(),
            vendor_name: None,
            amount: Decimal::new(12345, 2),
            currency: "USD".to_string(),
            bank_account: "ACC000001".to_string(),
            bank_name: None,
            transaction_ids: vec![],
            status: PayoutStatus::Processing,
            failure_reason: None,
            attempt_count: 1,
            max_retries: 3,
            created_at: now,
            attempted_at: Some(now),
            completed_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn test_seeded_distribution_is_plausible() {
        let bank = SimulatedBank::with_seed(42);
        let mut successes = 0;
        for _ in 0..1000 {
            if bank.draw().0.is_success() {
                successes += 1;
            }
        }
        // 85% expected; allow a generous band for a 1000-sample draw
        assert!((800..=900).contains(&successes), "successes={}", successes);
    }

    #[test]
    fn test_seeded_draws_are_deterministic() {
        let a = SimulatedBank::with_seed(7);
        let b = SimulatedBank::with_seed(7);
        for _ in 0..100 {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[tokio::test]
    async fn test_scripted_bank_consumes_in_order() {
        let bank = ScriptedBank::new();
        bank.script(
            "v1",
            vec![
                TransferOutcome::Failure(FailureCode::RateLimited),
                TransferOutcome::Failure(FailureCode::BankApiTimeout),
            ],
        );

        let payout = dummy_payout("v1");
        assert_eq!(
            bank.transfer(&payout).await,
            TransferOutcome::Failure(FailureCode::RateLimited)
        );
        assert_eq!(
            bank.transfer(&payout).await,
            TransferOutcome::Failure(FailureCode::BankApiTimeout)
        );
        // Script exhausted: success from here on
        assert_eq!(bank.transfer(&payout).await, TransferOutcome::Success);
        assert_eq!(bank.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unscripted_vendor_succeeds() {
        let bank = ScriptedBank::new();
        let payout = dummy_payout("anyone");
        assert!(bank.transfer(&payout).await.is_success());
    }
}
