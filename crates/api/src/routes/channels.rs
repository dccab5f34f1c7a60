//! Route definitions for notification channel state.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::channels;
use crate::state::AppState;

/// Channel routes mounted at `/user/channels`.
///
/// ```text
/// GET    /                    -> get_channels
/// PUT    /                    -> update_channels
/// PUT    /push-subscription   -> set_push_subscription
/// DELETE /push-subscription   -> clear_push_subscription
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(channels::get_channels).put(channels::update_channels),
        )
        .route(
            "/push-subscription",
            put(channels::set_push_subscription).delete(channels::clear_push_subscription),
        )
}
