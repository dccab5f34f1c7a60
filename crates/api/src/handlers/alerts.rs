//! Handlers for per-event alert scheduling.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use startline_alerts::AlertScheduler;
use startline_core::alert::AlertChoices;
use startline_core::types::DbId;
use startline_db::models::alert::{AlertPreference, ScheduledAlert};
use startline_db::repositories::{AlertPreferenceRepo, ScheduledAlertRepo};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `PUT /events/{id}/alerts`.
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub want_10min: bool,
    pub want_5min: bool,
    pub want_1min: bool,
}

/// Response body for `PUT /events/{id}/alerts`.
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    /// Pending rows created; lead times whose fire time already elapsed are
    /// omitted without error.
    pub alerts_created: usize,
}

/// Response body for `GET /events/{id}/alerts`.
#[derive(Debug, Serialize)]
pub struct AlertStateResponse {
    pub preference: Option<AlertPreference>,
    pub pending: Vec<ScheduledAlert>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// PUT /api/v1/events/{id}/alerts
///
/// Replace the authenticated user's alert schedule for an event. Fails with
/// 404 for an unknown event and 409 (`ALREADY_OPEN`) once registration has
/// opened.
pub async fn schedule_alerts(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
    Json(input): Json<ScheduleRequest>,
) -> AppResult<Json<DataResponse<ScheduleResponse>>> {
    let choices = AlertChoices {
        want_10min: input.want_10min,
        want_5min: input.want_5min,
        want_1min: input.want_1min,
    };

    let outcome = AlertScheduler::schedule(
        &state.pool,
        auth.user_id,
        event_id,
        choices,
        chrono::Utc::now(),
    )
    .await?;

    Ok(Json(DataResponse {
        data: ScheduleResponse {
            alerts_created: outcome.alerts_created,
        },
    }))
}

/// GET /api/v1/events/{id}/alerts
///
/// Return the authenticated user's stored choices and pending alerts for an
/// event, so the client can render its toggles.
pub async fn get_alert_state(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<DataResponse<AlertStateResponse>>> {
    let preference = AlertPreferenceRepo::find(&state.pool, auth.user_id, event_id).await?;
    let pending = ScheduledAlertRepo::list_pending(&state.pool, auth.user_id, event_id).await?;

    Ok(Json(DataResponse {
        data: AlertStateResponse {
            preference,
            pending,
        },
    }))
}
