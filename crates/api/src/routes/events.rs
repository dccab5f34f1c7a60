//! Route definitions for race events and per-event alert scheduling.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{alerts, events};
use crate::state::AppState;

/// Event routes mounted at `/events`.
///
/// ```text
/// GET  /                -> list_events
/// POST /                -> create_event (admin)
/// GET  /{id}            -> get_event
/// PUT  /{id}            -> update_event (admin)
/// GET  /{id}/alerts     -> get_alert_state
/// PUT  /{id}/alerts     -> schedule_alerts
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route("/{id}", get(events::get_event).put(events::update_event))
        .route(
            "/{id}/alerts",
            get(alerts::get_alert_state).put(alerts::schedule_alerts),
        )
}
