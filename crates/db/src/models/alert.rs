//! Alert preference and scheduled alert entity models.

use serde::Serialize;
use sqlx::FromRow;
use startline_core::types::{DbId, Timestamp};

/// A row from the `alert_preferences` table: the latest opt-in choices for
/// one (user, event) pair. Latest write wins; no history is kept.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertPreference {
    pub id: DbId,
    pub user_id: DbId,
    pub event_id: DbId,
    pub want_10min: bool,
    pub want_5min: bool,
    pub want_1min: bool,
    pub updated_at: Timestamp,
}

/// A row from the `scheduled_alerts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduledAlert {
    pub id: DbId,
    pub user_id: DbId,
    pub event_id: DbId,
    /// Lead-time bucket: `10min`, `5min`, or `1min`.
    pub alert_type: String,
    pub scheduled_for: Timestamp,
    pub status: String,
    pub sent_at: Option<Timestamp>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
}

/// Staged insert for one pending alert row.
#[derive(Debug, Clone)]
pub struct NewScheduledAlert {
    pub alert_type: &'static str,
    pub scheduled_for: Timestamp,
}

/// A claimed alert joined with event display data and the user's channel
/// state, as returned by `ScheduledAlertRepo::claim_due`.
///
/// The joins are LEFT JOINs: a row whose event or user vanished still comes
/// back (with `None` fields) so the dispatcher can mark it failed instead of
/// leaving it stuck in `claimed`.
#[derive(Debug, Clone, FromRow)]
pub struct DueAlert {
    pub id: DbId,
    pub user_id: DbId,
    pub event_id: DbId,
    pub alert_type: String,
    pub scheduled_for: Timestamp,
    pub event_name: Option<String>,
    pub registration_url: Option<String>,
    pub official_url: Option<String>,
    pub email: Option<String>,
    pub push_enabled: Option<bool>,
    pub email_enabled: Option<bool>,
    pub push_endpoint: Option<String>,
    pub push_p256dh: Option<String>,
    pub push_auth: Option<String>,
}
