//! Scheduler flow against a real database: repeat calls converge on the
//! same pending set, narrowing choices removes rows, and an already-open
//! event is rejected without touching stored rows.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use startline_alerts::{AlertScheduler, ScheduleError};
use startline_core::alert::AlertChoices;
use startline_core::types::{DbId, Timestamp};
use startline_db::models::event::UpsertRaceEvent;
use startline_db::repositories::{RaceEventRepo, ScheduledAlertRepo, UserRepo};

const ALL: AlertChoices = AlertChoices {
    want_10min: true,
    want_5min: true,
    want_1min: true,
};

async fn seed_user(pool: &PgPool) -> DbId {
    UserRepo::create(pool, "runner@example.com", "$argon2id$fake-hash", None)
        .await
        .unwrap()
        .id
}

async fn seed_event(pool: &PgPool, opens_at: Timestamp) -> DbId {
    RaceEventRepo::create(
        pool,
        &UpsertRaceEvent {
            name: "Seoul Marathon".to_string(),
            registration_opens_at: opens_at,
            registration_url: None,
            official_url: None,
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn scheduling_twice_yields_the_same_pending_set(pool: PgPool) {
    let now = Utc::now();
    let opens_at = now + Duration::hours(1);
    let user_id = seed_user(&pool).await;
    let event_id = seed_event(&pool, opens_at).await;

    let first = AlertScheduler::schedule(&pool, user_id, event_id, ALL, now)
        .await
        .unwrap();
    let second = AlertScheduler::schedule(&pool, user_id, event_id, ALL, now)
        .await
        .unwrap();

    assert_eq!(first.alerts_created, 3);
    assert_eq!(second.alerts_created, 3);

    let pending = ScheduledAlertRepo::list_pending(&pool, user_id, event_id)
        .await
        .unwrap();
    assert_eq!(pending.len(), 3, "repeat scheduling must not duplicate rows");

    let fired: Vec<(&str, Timestamp)> = pending
        .iter()
        .map(|a| (a.alert_type.as_str(), a.scheduled_for))
        .collect();
    assert_eq!(
        fired,
        vec![
            ("10min", opens_at - Duration::minutes(10)),
            ("5min", opens_at - Duration::minutes(5)),
            ("1min", opens_at - Duration::minutes(1)),
        ]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn narrowing_choices_shrinks_the_pending_set(pool: PgPool) {
    let now = Utc::now();
    let opens_at = now + Duration::hours(1);
    let user_id = seed_user(&pool).await;
    let event_id = seed_event(&pool, opens_at).await;

    AlertScheduler::schedule(&pool, user_id, event_id, ALL, now)
        .await
        .unwrap();

    let only_last = AlertChoices {
        want_10min: false,
        want_5min: false,
        want_1min: true,
    };
    let outcome = AlertScheduler::schedule(&pool, user_id, event_id, only_last, now)
        .await
        .unwrap();
    assert_eq!(outcome.alerts_created, 1);

    let pending = ScheduledAlertRepo::list_pending(&pool, user_id, event_id)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].alert_type, "1min");

    // The stored preference reflects the latest call.
    assert!(!outcome.preference.want_10min);
    assert!(outcome.preference.want_1min);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn already_open_event_is_rejected(pool: PgPool) {
    let now = Utc::now();
    let user_id = seed_user(&pool).await;
    let event_id = seed_event(&pool, now - Duration::minutes(1)).await;

    let err = AlertScheduler::schedule(&pool, user_id, event_id, ALL, now)
        .await
        .unwrap_err();

    assert_matches!(err, ScheduleError::AlreadyOpen { .. });

    let pending = ScheduledAlertRepo::list_pending(&pool, user_id, event_id)
        .await
        .unwrap();
    assert!(pending.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_event_is_rejected(pool: PgPool) {
    let now = Utc::now();
    let user_id = seed_user(&pool).await;

    let err = AlertScheduler::schedule(&pool, user_id, 424242, ALL, now)
        .await
        .unwrap_err();

    assert_matches!(err, ScheduleError::EventNotFound(424242));
}
