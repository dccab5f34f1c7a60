//! Handler for the cron-triggered dispatch endpoint.

use axum::extract::State;
use axum::Json;
use startline_alerts::DispatchReport;

use crate::error::AppResult;
use crate::middleware::auth::CronAuth;
use crate::state::AppState;

/// POST /api/v1/internal/dispatch
///
/// Run one dispatch pass over the alerts due in the current window. Intended
/// to be invoked once per minute by an external scheduler presenting the
/// shared secret; the caller is expected to log the report and take no
/// corrective action.
pub async fn dispatch_due(
    _cron: CronAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DispatchReport>> {
    let report = state.dispatcher.dispatch_due(chrono::Utc::now()).await?;

    if report.processed > 0 {
        tracing::info!(processed = report.processed, "Dispatch pass complete");
    }

    Ok(Json(report))
}
