//! Batch Payout Engine
//!
//! Durable, resumable, concurrent execution of vendor payout batches with
//! at-most-once payment semantics.
//!
//! # Architecture
//!
//! ```text
//! Control Surface → Store (create) ┐
//!                 → Executor ──────┤ pulls pending chunks
//!                                  ↓
//!                    workers: claim → bank transfer → commit outcome
//!                                  ↓
//!                    Store (single source of truth for resumability)
//! ```
//!
//! # State Machine
//!
//! ```text
//! payout:  pending → processing → completed
//!                         ↓     ↘ failed
//!                      pending (requeue within retry budget)
//!
//! batch:   pending → in_progress → {completed | partially_completed | failed}
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Claim-Before-Transfer**: a worker may only execute a payout it has
//!    won via the store's atomic pending → processing claim
//! 2. **At-Most-Once**: a payout that reached `completed` never leaves it;
//!    concurrent claims have exactly one winner per transition
//! 3. **Store-Only Progress**: no in-memory cursors; a restart resumes
//!    purely from persisted state
//! 4. **Conservative Crash Accounting**: attempts consumed by a crashed run
//!    still count against the retry budget

pub mod bank;
pub mod db;
pub mod error;
pub mod executor;
pub mod memory;
pub mod schema;
pub mod service;
pub mod store;
pub mod types;


// Re-exports for convenience
pub use bank::{BankClient, ScriptedBank, SimulatedBank, TransferOutcome};
pub use db::PgPayoutStore;
pub use error::PayoutError;
pub use executor::{ExecutorConfig, PayoutExecutor};
pub use memory::MemoryPayoutStore;
pub use service::{BatchSummary, PayoutPage, PayoutService};
pub use store::PayoutStore;
pub use types::{
    BatchId, BatchStatistics, BatchStatus, FailureCode, NewPayout, Payout, PayoutAttempt,
    PayoutBatch, PayoutId, PayoutStatus,
};
