//! Payout Engine server entry point

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use payout_engine::config::AppConfig;
use payout_engine::db::Database;
use payout_engine::gateway::{self, state::AppState};
use payout_engine::logging;
use payout_engine::payout::{
    ExecutorConfig, PayoutExecutor, PayoutService, PgPayoutStore, SimulatedBank, schema,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("PAYOUT_ENV").unwrap_or_else(|_| "dev".to_string());
    let config = AppConfig::load(&env)?;
    let _log_guard = logging::init_logging(&config);

    info!(
        env = %env,
        rev = env!("PAYOUT_ENGINE_REV"),
        concurrency = config.worker.concurrency,
        chunk_size = config.worker.chunk_size,
        "Payout engine starting"
    );

    let db = Database::connect(&config.postgres_url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    schema::init_schema(db.pool()).await?;

    let store = Arc::new(PgPayoutStore::new(db.pool().clone()));
    let bank = Arc::new(SimulatedBank::new());
    let executor = Arc::new(PayoutExecutor::new(
        store.clone(),
        bank,
        ExecutorConfig {
            concurrency: config.worker.concurrency,
            chunk_size: config.worker.chunk_size,
        },
    ));
    let service = Arc::new(PayoutService::new(store, executor));

    let state = Arc::new(AppState::new(service, Some(Arc::new(db))));
    gateway::run_server(state, &config.gateway.host, config.gateway.port).await
}
