//! Repository for the `race_events` table.

use sqlx::PgPool;
use startline_core::types::{DbId, Timestamp};

use crate::models::event::{RaceEvent, UpsertRaceEvent};

const EVENT_COLUMNS: &str = "\
    id, name, registration_opens_at, registration_url, official_url, \
    created_at, updated_at";

/// CRUD for the `race_events` table.
pub struct RaceEventRepo;

impl RaceEventRepo {
    /// List events whose registration has not yet opened, soonest first.
    pub async fn list_upcoming(
        pool: &PgPool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<RaceEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM race_events \
             WHERE registration_opens_at > $1 \
             ORDER BY registration_opens_at ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, RaceEvent>(&query)
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Find an event by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<RaceEvent>, sqlx::Error> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM race_events WHERE id = $1");
        sqlx::query_as::<_, RaceEvent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a new race event.
    pub async fn create(pool: &PgPool, input: &UpsertRaceEvent) -> Result<RaceEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO race_events \
                 (name, registration_opens_at, registration_url, official_url) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {EVENT_COLUMNS}"
        );
        sqlx::query_as::<_, RaceEvent>(&query)
            .bind(&input.name)
            .bind(input.registration_opens_at)
            .bind(&input.registration_url)
            .bind(&input.official_url)
            .fetch_one(pool)
            .await
    }

    /// Update an existing race event. Returns `None` if the id is unknown.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpsertRaceEvent,
    ) -> Result<Option<RaceEvent>, sqlx::Error> {
        let query = format!(
            "UPDATE race_events \
             SET name = $2, registration_opens_at = $3, registration_url = $4, \
                 official_url = $5, updated_at = now() \
             WHERE id = $1 \
             RETURNING {EVENT_COLUMNS}"
        );
        sqlx::query_as::<_, RaceEvent>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.registration_opens_at)
            .bind(&input.registration_url)
            .bind(&input.official_url)
            .fetch_optional(pool)
            .await
    }
}
