//! User and notification-channel entity models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use startline_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `notification_channels` table.
///
/// Read-only from the dispatcher's perspective; mutated only through the
/// `/user/channels` endpoints.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationChannels {
    pub user_id: DbId,
    pub push_enabled: bool,
    pub email_enabled: bool,
    #[serde(skip_serializing)]
    pub push_endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub push_p256dh: Option<String>,
    #[serde(skip_serializing)]
    pub push_auth: Option<String>,
    pub updated_at: Timestamp,
}

impl NotificationChannels {
    /// Whether a complete Web Push subscription is on file.
    pub fn has_push_subscription(&self) -> bool {
        self.push_endpoint.is_some() && self.push_p256dh.is_some() && self.push_auth.is_some()
    }
}

/// Input for toggling channel enable flags.
#[derive(Debug, Deserialize)]
pub struct UpdateChannels {
    pub push_enabled: Option<bool>,
    pub email_enabled: Option<bool>,
}

/// Opaque Web Push subscription as produced by the browser's
/// `PushManager.subscribe()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscriptionInput {
    pub endpoint: String,
    pub keys: PushSubscriptionKeys,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}
