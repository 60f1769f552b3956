//! PostgreSQL schema for the payout engine
//!
//! Three tables: batches, payouts, attempts. Status vocabularies are
//! enforced with CHECK constraints and the at-most-once invariants with
//! UNIQUE constraints, so a buggy writer cannot corrupt the state machine.

use anyhow::{Context, Result};
use sqlx::PgPool;

/// Apply the schema idempotently. Safe to run at every startup.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    tracing::info!("Initializing payout schema");

    for (name, ddl) in [
        ("payout_batches", CREATE_BATCHES_TABLE),
        ("payouts", CREATE_PAYOUTS_TABLE),
        ("payout_attempts", CREATE_ATTEMPTS_TABLE),
        ("indexes", CREATE_INDEXES),
    ] {
        sqlx::raw_sql(ddl)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to apply schema step: {}", name))?;
    }

    tracing::info!("Payout schema ready");
    Ok(())
}

const CREATE_BATCHES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS payout_batches (
    id              TEXT PRIMARY KEY,
    status          TEXT NOT NULL CHECK (status IN
                        ('pending', 'in_progress', 'completed', 'partially_completed', 'failed')),
    total_count     BIGINT NOT NULL,
    completed_count BIGINT NOT NULL DEFAULT 0,
    failed_count    BIGINT NOT NULL DEFAULT 0,
    pending_count   BIGINT NOT NULL DEFAULT 0,
    created_at      TIMESTAMPTZ NOT NULL,
    started_at      TIMESTAMPTZ,
    completed_at    TIMESTAMPTZ,
    updated_at      TIMESTAMPTZ NOT NULL
)
"#;

const CREATE_PAYOUTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS payouts (
    id              TEXT PRIMARY KEY,
    batch_id        TEXT NOT NULL REFERENCES payout_batches(id),
    idempotency_key TEXT NOT NULL UNIQUE,
    vendor_id       TEXT NOT NULL,
    vendor_name     TEXT,
    amount          NUMERIC(20, 4) NOT NULL CHECK (amount > 0),
    currency        TEXT NOT NULL,
    bank_account    TEXT NOT NULL,
    bank_name       TEXT,
    transaction_ids TEXT[] NOT NULL DEFAULT '{}',
    status          TEXT NOT NULL CHECK (status IN
                        ('pending', 'processing', 'completed', 'failed')),
    failure_reason  TEXT,
    attempt_count   INT NOT NULL DEFAULT 0,
    max_retries     INT NOT NULL DEFAULT 3,
    created_at      TIMESTAMPTZ NOT NULL,
    attempted_at    TIMESTAMPTZ,
    completed_at    TIMESTAMPTZ,
    updated_at      TIMESTAMPTZ NOT NULL,
    UNIQUE (batch_id, vendor_id)
)
"#;

const CREATE_ATTEMPTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS payout_attempts (
    id          TEXT PRIMARY KEY,
    payout_id   TEXT NOT NULL REFERENCES payouts(id),
    attempt_num INT NOT NULL,
    status      TEXT NOT NULL CHECK (status IN ('completed', 'failed')),
    error       TEXT,
    started_at  TIMESTAMPTZ NOT NULL,
    finished_at TIMESTAMPTZ NOT NULL,
    UNIQUE (payout_id, attempt_num)
)
"#;

const CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_payouts_batch ON payouts (batch_id);
CREATE INDEX IF NOT EXISTS idx_payouts_batch_status ON payouts (batch_id, status);
CREATE INDEX IF NOT EXISTS idx_payouts_vendor ON payouts (vendor_id);
CREATE INDEX IF NOT EXISTS idx_payouts_idempotency ON payouts (idempotency_key);
CREATE INDEX IF NOT EXISTS idx_attempts_payout ON payout_attempts (payout_id)
"#;
