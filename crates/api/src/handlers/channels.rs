//! Handlers for the `/user/channels` resource (notification channel state).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use startline_db::models::user::{NotificationChannels, PushSubscriptionInput, UpdateChannels};
use startline_db::repositories::NotificationChannelRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Channel state as exposed to the client: enable flags plus whether a push
/// subscription is on file (the subscription itself is never echoed back).
#[derive(Debug, Serialize)]
pub struct ChannelStateResponse {
    pub push_enabled: bool,
    pub email_enabled: bool,
    pub has_push_subscription: bool,
}

impl From<NotificationChannels> for ChannelStateResponse {
    fn from(channels: NotificationChannels) -> Self {
        let has_push_subscription = channels.has_push_subscription();
        Self {
            push_enabled: channels.push_enabled,
            email_enabled: channels.email_enabled,
            has_push_subscription,
        }
    }
}

/// GET /api/v1/user/channels
pub async fn get_channels(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ChannelStateResponse>>> {
    let channels = NotificationChannelRepo::get_or_create(&state.pool, auth.user_id).await?;

    Ok(Json(DataResponse {
        data: channels.into(),
    }))
}

/// PUT /api/v1/user/channels
///
/// Toggle the per-channel enable flags. Omitted flags are left unchanged.
pub async fn update_channels(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateChannels>,
) -> AppResult<Json<DataResponse<ChannelStateResponse>>> {
    let channels = NotificationChannelRepo::update_flags(
        &state.pool,
        auth.user_id,
        input.push_enabled,
        input.email_enabled,
    )
    .await?;

    Ok(Json(DataResponse {
        data: channels.into(),
    }))
}

/// PUT /api/v1/user/channels/push-subscription
///
/// Store the browser's Web Push subscription for the authenticated user.
pub async fn set_push_subscription(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<PushSubscriptionInput>,
) -> AppResult<Json<DataResponse<ChannelStateResponse>>> {
    let channels =
        NotificationChannelRepo::set_push_subscription(&state.pool, auth.user_id, &input).await?;

    tracing::info!(user_id = auth.user_id, "Push subscription stored");

    Ok(Json(DataResponse {
        data: channels.into(),
    }))
}

/// DELETE /api/v1/user/channels/push-subscription
///
/// Drop the stored subscription (client unsubscribed). 204 on success.
pub async fn clear_push_subscription(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    NotificationChannelRepo::clear_push_subscription(&state.pool, auth.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
