//! Route definitions for internally triggered jobs.

use axum::routing::post;
use axum::Router;

use crate::handlers::dispatch;
use crate::state::AppState;

/// Internal routes mounted at `/internal`. Guarded by the cron secret, not
/// by user authentication.
///
/// ```text
/// POST /dispatch   -> dispatch_due
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/dispatch", post(dispatch::dispatch_due))
}
