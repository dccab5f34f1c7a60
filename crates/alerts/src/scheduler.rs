//! Alert scheduler: turns opt-in choices into pending alert rows.

use startline_core::alert::{plan_fire_times, AlertChoices};
use startline_core::types::{DbId, Timestamp};
use startline_db::models::alert::{AlertPreference, NewScheduledAlert};
use startline_db::repositories::{AlertPreferenceRepo, RaceEventRepo, ScheduledAlertRepo};
use startline_db::DbPool;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for scheduling failures.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The referenced event does not exist.
    #[error("Event not found: {0}")]
    EventNotFound(DbId),

    /// Registration already opened; nothing can be scheduled.
    #[error("Registration for event {event_id} already opened at {opens_at}")]
    AlreadyOpen { event_id: DbId, opens_at: Timestamp },

    /// Storage failure; the pending set is left unchanged (transactional).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of a successful schedule call.
#[derive(Debug)]
pub struct ScheduleOutcome {
    /// Number of pending rows created. May be less than the number of
    /// selected lead times when some fire times already elapsed.
    pub alerts_created: usize,
    /// The upserted preference row (latest write wins).
    pub preference: AlertPreference,
}

// ---------------------------------------------------------------------------
// AlertScheduler
// ---------------------------------------------------------------------------

/// Synchronous scheduling service invoked from the API request path.
pub struct AlertScheduler;

impl AlertScheduler {
    /// Replace the pending alerts for `(user_id, event_id)` according to
    /// `choices`, then record the choices themselves.
    ///
    /// Repeated calls with the same choices are idempotent: the previous
    /// pending set is deleted and rebuilt in one transaction, so no
    /// duplicates can accumulate and a failed insert leaves the prior set
    /// logically intact (the transaction rolls back).
    ///
    /// The preference upsert is independent of how many rows were created;
    /// a user opting into an elapsed lead time still has that choice stored.
    pub async fn schedule(
        pool: &DbPool,
        user_id: DbId,
        event_id: DbId,
        choices: AlertChoices,
        now: Timestamp,
    ) -> Result<ScheduleOutcome, ScheduleError> {
        let event = RaceEventRepo::find_by_id(pool, event_id)
            .await?
            .ok_or(ScheduleError::EventNotFound(event_id))?;

        let planned = plan_fire_times(event.registration_opens_at, choices, now).map_err(|e| {
            ScheduleError::AlreadyOpen {
                event_id,
                opens_at: e.opens_at,
            }
        })?;

        let staged: Vec<NewScheduledAlert> = planned
            .iter()
            .map(|p| NewScheduledAlert {
                alert_type: p.lead.as_str(),
                scheduled_for: p.fire_at,
            })
            .collect();

        let alerts_created =
            ScheduledAlertRepo::replace_pending(pool, user_id, event_id, &staged).await?;

        let preference = AlertPreferenceRepo::upsert(
            pool,
            user_id,
            event_id,
            choices.want_10min,
            choices.want_5min,
            choices.want_1min,
        )
        .await?;

        tracing::info!(
            user_id,
            event_id,
            alerts_created,
            "Alert schedule replaced"
        );

        Ok(ScheduleOutcome {
            alerts_created,
            preference,
        })
    }
}
