//! Repositories for the `alert_preferences` and `scheduled_alerts` tables.

use sqlx::PgPool;
use startline_core::alert::AlertStatus;
use startline_core::types::{DbId, Timestamp};

use crate::models::alert::{AlertPreference, DueAlert, NewScheduledAlert, ScheduledAlert};

// ===========================================================================
// AlertPreferenceRepo
// ===========================================================================

const PREFERENCE_COLUMNS: &str = "\
    id, user_id, event_id, want_10min, want_5min, want_1min, updated_at";

/// CRUD for the `alert_preferences` table.
pub struct AlertPreferenceRepo;

impl AlertPreferenceRepo {
    /// Find the preference row for a (user, event) pair.
    pub async fn find(
        pool: &PgPool,
        user_id: DbId,
        event_id: DbId,
    ) -> Result<Option<AlertPreference>, sqlx::Error> {
        let query = format!(
            "SELECT {PREFERENCE_COLUMNS} FROM alert_preferences \
             WHERE user_id = $1 AND event_id = $2"
        );
        sqlx::query_as::<_, AlertPreference>(&query)
            .bind(user_id)
            .bind(event_id)
            .fetch_optional(pool)
            .await
    }

    /// Upsert the latest choices for a (user, event) pair. Latest write wins.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        event_id: DbId,
        want_10min: bool,
        want_5min: bool,
        want_1min: bool,
    ) -> Result<AlertPreference, sqlx::Error> {
        let query = format!(
            "INSERT INTO alert_preferences \
                 (user_id, event_id, want_10min, want_5min, want_1min) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, event_id) \
             DO UPDATE SET want_10min = $3, want_5min = $4, want_1min = $5, \
                           updated_at = now() \
             RETURNING {PREFERENCE_COLUMNS}"
        );
        sqlx::query_as::<_, AlertPreference>(&query)
            .bind(user_id)
            .bind(event_id)
            .bind(want_10min)
            .bind(want_5min)
            .bind(want_1min)
            .fetch_one(pool)
            .await
    }
}

// ===========================================================================
// ScheduledAlertRepo
// ===========================================================================

const ALERT_COLUMNS: &str = "\
    id, user_id, event_id, alert_type, scheduled_for, status, sent_at, \
    error_message, created_at";

/// Lifecycle operations for the `scheduled_alerts` table.
pub struct ScheduledAlertRepo;

impl ScheduledAlertRepo {
    /// Replace all pending alerts for a (user, event) pair with a new set.
    ///
    /// Delete and insert run in one transaction so a failed insert cannot
    /// leave the pair with neither the old nor the new rows. Together with
    /// the partial unique index this upholds the "at most one pending row
    /// per lead-time bucket" invariant. Returns the number of rows created.
    pub async fn replace_pending(
        pool: &PgPool,
        user_id: DbId,
        event_id: DbId,
        alerts: &[NewScheduledAlert],
    ) -> Result<usize, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM scheduled_alerts \
             WHERE user_id = $1 AND event_id = $2 AND status = 'pending'",
        )
        .bind(user_id)
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        for alert in alerts {
            sqlx::query(
                "INSERT INTO scheduled_alerts \
                     (user_id, event_id, alert_type, scheduled_for, status) \
                 VALUES ($1, $2, $3, $4, 'pending')",
            )
            .bind(user_id)
            .bind(event_id)
            .bind(alert.alert_type)
            .bind(alert.scheduled_for)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(alerts.len())
    }

    /// List pending alerts for a (user, event) pair, soonest first.
    pub async fn list_pending(
        pool: &PgPool,
        user_id: DbId,
        event_id: DbId,
    ) -> Result<Vec<ScheduledAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {ALERT_COLUMNS} FROM scheduled_alerts \
             WHERE user_id = $1 AND event_id = $2 AND status = 'pending' \
             ORDER BY scheduled_for ASC"
        );
        sqlx::query_as::<_, ScheduledAlert>(&query)
            .bind(user_id)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// Atomically claim all pending alerts due in `[window_start, window_end)`
    /// and return them joined with event display data and channel state.
    ///
    /// The claim is part of the selection statement (`pending` -> `claimed`
    /// with `FOR UPDATE SKIP LOCKED`), so two overlapping dispatcher runs
    /// cannot both pick up the same row.
    pub async fn claim_due(
        pool: &PgPool,
        window_start: Timestamp,
        window_end: Timestamp,
    ) -> Result<Vec<DueAlert>, sqlx::Error> {
        sqlx::query_as::<_, DueAlert>(
            "WITH claimed AS ( \
                 UPDATE scheduled_alerts SET status = 'claimed' \
                 WHERE id IN ( \
                     SELECT id FROM scheduled_alerts \
                     WHERE status = 'pending' \
                       AND scheduled_for >= $1 AND scheduled_for < $2 \
                     FOR UPDATE SKIP LOCKED \
                 ) \
                 RETURNING id, user_id, event_id, alert_type, scheduled_for \
             ) \
             SELECT c.id, c.user_id, c.event_id, c.alert_type, c.scheduled_for, \
                    e.name AS event_name, e.registration_url, e.official_url, \
                    u.email, \
                    nc.push_enabled, nc.email_enabled, \
                    nc.push_endpoint, nc.push_p256dh, nc.push_auth \
             FROM claimed c \
             LEFT JOIN race_events e ON e.id = c.event_id \
             LEFT JOIN users u ON u.id = c.user_id \
             LEFT JOIN notification_channels nc ON nc.user_id = c.user_id \
             ORDER BY c.scheduled_for ASC",
        )
        .bind(window_start)
        .bind(window_end)
        .fetch_all(pool)
        .await
    }

    /// Fail claimed rows whose fire time is older than `cutoff`.
    ///
    /// A crash between claiming and terminal marking strands rows in
    /// `claimed`. This pass runs ahead of each claim so such rows surface as
    /// `failed` instead of sitting invisible forever; the alert itself is
    /// long past being useful by then, so no redelivery is attempted.
    /// Returns the number of rows expired.
    pub async fn expire_stale_claims(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE scheduled_alerts \
             SET status = 'failed', error_message = 'claim expired without an outcome' \
             WHERE status = 'claimed' AND scheduled_for < $1",
        )
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Move a claimed row to a terminal status.
    ///
    /// `sent_at` is recorded only for the `sent` outcome; failure statuses
    /// leave it NULL and carry `error_message` instead.
    pub async fn mark_terminal(
        pool: &PgPool,
        id: DbId,
        status: AlertStatus,
        now: Timestamp,
        error_message: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let sent_at = matches!(status, AlertStatus::Sent).then_some(now);
        sqlx::query(
            "UPDATE scheduled_alerts \
             SET status = $2, sent_at = $3, error_message = $4 \
             WHERE id = $1 AND status = 'claimed'",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(sent_at)
        .bind(error_message)
        .execute(pool)
        .await?;
        Ok(())
    }
}
