//! Payout Engine - Durable Batch Payout Processing
//!
//! A resumable, concurrent batch payout executor with at-most-once payment
//! semantics, backed by PostgreSQL.
//!
//! # Modules
//!
//! - [`payout`] - Core engine: store, executor, bank client, control surface
//! - [`gateway`] - HTTP API over the control surface
//! - [`config`] - Application configuration
//! - [`db`] - PostgreSQL connection pool
//! - [`logging`] - Structured logging setup

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod payout;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use db::Database;
pub use payout::{
    BankClient, BatchId, BatchStatus, ExecutorConfig, MemoryPayoutStore, NewPayout, PayoutError,
    PayoutExecutor, PayoutService, PayoutStore, PgPayoutStore, SimulatedBank,
};
