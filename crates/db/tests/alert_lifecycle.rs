//! Integration tests for the scheduled-alert lifecycle against a real
//! database:
//! - pending-set replacement (idempotency, set swap, terminal rows untouched)
//! - window-bounded claiming and double-claim prevention
//! - terminal marking rules
//! - orphaned-claim expiry

use chrono::{Duration, Utc};
use sqlx::PgPool;
use startline_core::alert::AlertStatus;
use startline_core::types::{DbId, Timestamp};
use startline_db::models::alert::NewScheduledAlert;
use startline_db::models::event::UpsertRaceEvent;
use startline_db::repositories::{RaceEventRepo, ScheduledAlertRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, email: &str) -> DbId {
    UserRepo::create(pool, email, "$argon2id$fake-hash", None)
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
            registration_url: Some("https://reg.example.com".to_string()),
            official_url: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn three_alerts(opens_at: Timestamp) -> Vec<NewScheduledAlert> {
    vec![
        NewScheduledAlert {
            alert_type: "10min",
            scheduled_for: opens_at - Duration::minutes(10),
        },
        NewScheduledAlert {
            alert_type: "5min",
            scheduled_for: opens_at - Duration::minutes(5),
        },
        NewScheduledAlert {
            alert_type: "1min",
            scheduled_for: opens_at - Duration::minutes(1),
        },
    ]
}

async fn row_state(pool: &PgPool, id: DbId) -> (String, Option<Timestamp>, Option<String>) {
    sqlx::query_as("SELECT status, sent_at, error_message FROM scheduled_alerts WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Pending-set replacement
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn replace_pending_is_idempotent(pool: PgPool) {
    let opens_at = Utc::now() + Duration::hours(1);
    let user_id = seed_user(&pool, "runner@example.com").await;
    let event_id = seed_event(&pool, opens_at).await;
    let alerts = three_alerts(opens_at);

    let first = ScheduledAlertRepo::replace_pending(&pool, user_id, event_id, &alerts)
        .await
        .unwrap();
    let second = ScheduledAlertRepo::replace_pending(&pool, user_id, event_id, &alerts)
        .await
        .unwrap();

    assert_eq!(first, 3);
    assert_eq!(second, 3);

    let pending = ScheduledAlertRepo::list_pending(&pool, user_id, event_id)
        .await
        .unwrap();
    assert_eq!(pending.len(), 3, "repeat call must not accumulate rows");

    let types: Vec<&str> = pending.iter().map(|a| a.alert_type.as_str()).collect();
    assert_eq!(types, vec!["10min", "5min", "1min"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn replace_pending_swaps_the_whole_set(pool: PgPool) {
    let opens_at = Utc::now() + Duration::hours(1);
    let user_id = seed_user(&pool, "runner@example.com").await;
    let event_id = seed_event(&pool, opens_at).await;

    ScheduledAlertRepo::replace_pending(&pool, user_id, event_id, &three_alerts(opens_at))
        .await
        .unwrap();

    let only_one = vec![NewScheduledAlert {
        alert_type: "1min",
        scheduled_for: opens_at - Duration::minutes(1),
    }];
    ScheduledAlertRepo::replace_pending(&pool, user_id, event_id, &only_one)
        .await
        .unwrap();

    let pending = ScheduledAlertRepo::list_pending(&pool, user_id, event_id)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].alert_type, "1min");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn replace_pending_leaves_terminal_rows_alone(pool: PgPool) {
    let now = Utc::now();
    let opens_at = now + Duration::seconds(30);
    let user_id = seed_user(&pool, "runner@example.com").await;
    let event_id = seed_event(&pool, opens_at).await;

    // Get one row all the way to `sent`.
    let due = vec![NewScheduledAlert {
        alert_type: "1min",
        scheduled_for: now,
    }];
    ScheduledAlertRepo::replace_pending(&pool, user_id, event_id, &due)
        .await
        .unwrap();
    let claimed = ScheduledAlertRepo::claim_due(&pool, now, now + Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);
    ScheduledAlertRepo::mark_terminal(&pool, claimed[0].id, AlertStatus::Sent, now, None)
        .await
        .unwrap();

    // A fresh schedule replaces pending rows only.
    ScheduledAlertRepo::replace_pending(&pool, user_id, event_id, &three_alerts(opens_at))
        .await
        .unwrap();

    let (status, _, _) = row_state(&pool, claimed[0].id).await;
    assert_eq!(status, "sent", "history must survive rescheduling");
}

// ---------------------------------------------------------------------------
// Claiming
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn claim_due_respects_the_half_open_window(pool: PgPool) {
    let now = Utc::now();
    let user_id = seed_user(&pool, "runner@example.com").await;
    let event_id = seed_event(&pool, now + Duration::hours(1)).await;

    // One row behind the window, one inside, one beyond.
    let staggered = vec![
        NewScheduledAlert {
            alert_type: "10min",
            scheduled_for: now - Duration::seconds(1),
        },
        NewScheduledAlert {
            alert_type: "5min",
            scheduled_for: now + Duration::seconds(30),
        },
        NewScheduledAlert {
            alert_type: "1min",
            scheduled_for: now + Duration::seconds(90),
        },
    ];
    ScheduledAlertRepo::replace_pending(&pool, user_id, event_id, &staggered)
        .await
        .unwrap();

    let due = ScheduledAlertRepo::claim_due(&pool, now, now + Duration::seconds(60))
        .await
        .unwrap();

    assert_eq!(due.len(), 1);
    assert_eq!(due[0].alert_type, "5min");
    // The claim query joins the event display data.
    assert_eq!(due[0].event_name.as_deref(), Some("Seoul Marathon"));
    assert_eq!(
        due[0].registration_url.as_deref(),
        Some("https://reg.example.com")
    );

    let remaining = ScheduledAlertRepo::list_pending(&pool, user_id, event_id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 2, "rows outside the window stay pending");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn claimed_rows_are_not_claimed_twice(pool: PgPool) {
    let now = Utc::now();
    let user_id = seed_user(&pool, "runner@example.com").await;
    let event_id = seed_event(&pool, now + Duration::hours(1)).await;

    let due = vec![NewScheduledAlert {
        alert_type: "5min",
        scheduled_for: now + Duration::seconds(10),
    }];
    ScheduledAlertRepo::replace_pending(&pool, user_id, event_id, &due)
        .await
        .unwrap();

    let window_end = now + Duration::seconds(60);
    let first = ScheduledAlertRepo::claim_due(&pool, now, window_end)
        .await
        .unwrap();
    let second = ScheduledAlertRepo::claim_due(&pool, now, window_end)
        .await
        .unwrap();

    assert_eq!(first.len(), 1);
    assert!(second.is_empty(), "a claimed row must not be handed out again");
}

// ---------------------------------------------------------------------------
// Terminal marking
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn sent_at_is_recorded_only_for_sent(pool: PgPool) {
    let now = Utc::now();
    let user_id = seed_user(&pool, "runner@example.com").await;
    let event_id = seed_event(&pool, now + Duration::hours(1)).await;

    let due = vec![
        NewScheduledAlert {
            alert_type: "10min",
            scheduled_for: now + Duration::seconds(5),
        },
        NewScheduledAlert {
            alert_type: "5min",
            scheduled_for: now + Duration::seconds(10),
        },
    ];
    ScheduledAlertRepo::replace_pending(&pool, user_id, event_id, &due)
        .await
        .unwrap();
    let claimed = ScheduledAlertRepo::claim_due(&pool, now, now + Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(claimed.len(), 2);

    ScheduledAlertRepo::mark_terminal(&pool, claimed[0].id, AlertStatus::Sent, now, None)
        .await
        .unwrap();
    ScheduledAlertRepo::mark_terminal(
        &pool,
        claimed[1].id,
        AlertStatus::DeliveryFailed,
        now,
        Some("push: relay returned HTTP 502"),
    )
    .await
    .unwrap();

    let (status, sent_at, error) = row_state(&pool, claimed[0].id).await;
    assert_eq!(status, "sent");
    assert!(sent_at.is_some());
    assert!(error.is_none());

    let (status, sent_at, error) = row_state(&pool, claimed[1].id).await;
    assert_eq!(status, "delivery_failed");
    assert!(sent_at.is_none(), "failure outcomes must not record sent_at");
    assert_eq!(error.as_deref(), Some("push: relay returned HTTP 502"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mark_terminal_ignores_unclaimed_rows(pool: PgPool) {
    let now = Utc::now();
    let user_id = seed_user(&pool, "runner@example.com").await;
    let event_id = seed_event(&pool, now + Duration::hours(1)).await;

    let due = vec![NewScheduledAlert {
        alert_type: "1min",
        scheduled_for: now + Duration::minutes(59),
    }];
    ScheduledAlertRepo::replace_pending(&pool, user_id, event_id, &due)
        .await
        .unwrap();
    let pending = ScheduledAlertRepo::list_pending(&pool, user_id, event_id)
        .await
        .unwrap();

    // Never claimed, so the terminal write must be a no-op.
    ScheduledAlertRepo::mark_terminal(&pool, pending[0].id, AlertStatus::Sent, now, None)
        .await
        .unwrap();

    let (status, sent_at, _) = row_state(&pool, pending[0].id).await;
    assert_eq!(status, "pending");
    assert!(sent_at.is_none());
}

// ---------------------------------------------------------------------------
// Orphaned-claim expiry
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn expire_stale_claims_fails_only_old_claims(pool: PgPool) {
    let now = Utc::now();
    let user_id = seed_user(&pool, "runner@example.com").await;
    let event_id = seed_event(&pool, now + Duration::hours(1)).await;

    // Simulate a claimer that crashed 20 minutes ago and one mid-flight.
    let stale_id: DbId = sqlx::query_scalar(
        "INSERT INTO scheduled_alerts (user_id, event_id, alert_type, scheduled_for, status) \
         VALUES ($1, $2, '10min', $3, 'claimed') RETURNING id",
    )
    .bind(user_id)
    .bind(event_id)
    .bind(now - Duration::minutes(20))
    .fetch_one(&pool)
    .await
    .unwrap();

    let fresh_id: DbId = sqlx::query_scalar(
        "INSERT INTO scheduled_alerts (user_id, event_id, alert_type, scheduled_for, status) \
         VALUES ($1, $2, '5min', $3, 'claimed') RETURNING id",
    )
    .bind(user_id)
    .bind(event_id)
    .bind(now - Duration::minutes(1))
    .fetch_one(&pool)
    .await
    .unwrap();

    let expired = ScheduledAlertRepo::expire_stale_claims(&pool, now - Duration::minutes(10))
        .await
        .unwrap();
    assert_eq!(expired, 1);

    let (status, sent_at, error) = row_state(&pool, stale_id).await;
    assert_eq!(status, "failed");
    assert!(sent_at.is_none());
    assert!(error.unwrap().contains("claim expired"));

    let (status, _, _) = row_state(&pool, fresh_id).await;
    assert_eq!(status, "claimed", "in-flight claims must be left alone");
}
