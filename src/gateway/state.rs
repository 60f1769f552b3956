//! Shared gateway state

use std::sync::Arc;

use crate::db::Database;
use crate::payout::PayoutService;

/// Application state shared across handlers
pub struct AppState {
    pub service: Arc<PayoutService>,
    /// Present when backed by PostgreSQL; the health endpoint pings it
    pub db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(service: Arc<PayoutService>, db: Option<Arc<Database>>) -> Self {
        Self { service, db }
    }
}
