//! Handlers for the `/events` resource.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use startline_core::error::CoreError;
use startline_core::types::DbId;
use startline_db::models::event::{RaceEvent, UpsertRaceEvent};
use startline_db::repositories::RaceEventRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum page size for event listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for event listing.
const DEFAULT_LIMIT: i64 = 50;

/// Query parameters for `GET /events`.
#[derive(Debug, Deserialize)]
pub struct EventQuery {
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
}

/// GET /api/v1/events
///
/// List events whose registration has not yet opened, soonest first.
pub async fn list_events(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<EventQuery>,
) -> AppResult<Json<DataResponse<Vec<RaceEvent>>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let events = RaceEventRepo::list_upcoming(&state.pool, chrono::Utc::now(), limit).await?;

    Ok(Json(DataResponse { data: events }))
}

/// GET /api/v1/events/{id}
pub async fn get_event(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<DataResponse<RaceEvent>>> {
    let event = RaceEventRepo::find_by_id(&state.pool, event_id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Event", event_id)))?;

    Ok(Json(DataResponse { data: event }))
}

/// POST /api/v1/events
///
/// Create a race event. Admin only.
pub async fn create_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpsertRaceEvent>,
) -> AppResult<Json<DataResponse<RaceEvent>>> {
    auth.require_admin()?;

    let event = RaceEventRepo::create(&state.pool, &input).await?;
    tracing::info!(event_id = event.id, name = %event.name, "Race event created");

    Ok(Json(DataResponse { data: event }))
}

/// PUT /api/v1/events/{id}
///
/// Update a race event. Admin only.
pub async fn update_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
    Json(input): Json<UpsertRaceEvent>,
) -> AppResult<Json<DataResponse<RaceEvent>>> {
    auth.require_admin()?;

    let event = RaceEventRepo::update(&state.pool, event_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Event", event_id)))?;

    Ok(Json(DataResponse { data: event }))
}
