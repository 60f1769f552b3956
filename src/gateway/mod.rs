pub mod handlers;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use state::AppState;

/// Build the API router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    let batch_routes = Router::new()
        .route("/batches", post(handlers::create_batch))
        .route("/batches/{id}", get(handlers::get_batch))
        .route("/batches/{id}/start", post(handlers::start_batch))
        .route("/batches/{id}/stop", post(handlers::stop_batch))
        .route("/batches/{id}/payouts", get(handlers::list_payouts))
        .route("/batches/{id}/retry-failed", post(handlers::retry_failed));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .nest("/api/v1", batch_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the gateway until the process exits
pub async fn run_server(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("  POST   /api/v1/batches                   - Create batch");
    tracing::info!("  GET    /api/v1/batches/{{id}}              - Batch status");
    tracing::info!("  POST   /api/v1/batches/{{id}}/start        - Start/resume");
    tracing::info!("  POST   /api/v1/batches/{{id}}/stop         - Stop processing");
    tracing::info!("  GET    /api/v1/batches/{{id}}/payouts      - List payouts");
    tracing::info!("  POST   /api/v1/batches/{{id}}/retry-failed - Retry failures");

    axum::serve(listener, app).await?;
    Ok(())
}
