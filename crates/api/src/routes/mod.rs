pub mod auth;
pub mod channels;
pub mod events;
pub mod health;
pub mod internal;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                         register (public)
/// /auth/login                            login (public)
/// /auth/me                               profile (requires auth)
///
/// /events                                list (GET), create (POST, admin)
/// /events/{id}                           get (GET), update (PUT, admin)
/// /events/{id}/alerts                    alert state (GET), schedule (PUT)
///
/// /user/channels                         get, update enable flags
/// /user/channels/push-subscription       store (PUT), drop (DELETE)
///
/// /internal/dispatch                     dispatch pass (POST, cron secret)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/events", events::router())
        .nest("/user/channels", channels::router())
        .nest("/internal", internal::router())
}
