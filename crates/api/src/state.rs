use std::sync::Arc;

use startline_alerts::Dispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
/// Everything here is constructed once in `main.rs` and injected; there are
/// no module-level singletons.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: startline_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Alert dispatcher, triggered by the cron endpoint.
    pub dispatcher: Arc<Dispatcher>,
}
