//! Race event entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use startline_core::types::{DbId, Timestamp};

/// A row from the `race_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RaceEvent {
    pub id: DbId,
    pub name: String,
    /// When online registration opens. Alerts fire relative to this.
    pub registration_opens_at: Timestamp,
    pub registration_url: Option<String>,
    pub official_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating or updating a race event.
#[derive(Debug, Deserialize)]
pub struct UpsertRaceEvent {
    pub name: String,
    pub registration_opens_at: Timestamp,
    pub registration_url: Option<String>,
    pub official_url: Option<String>,
}
