//! Alert dispatcher: claims due rows and fans out to the delivery channels.
//!
//! Invoked once per polling interval (HTTP cron trigger or the worker
//! binary). Each run claims the pending rows due inside its window, attempts
//! every enabled channel per row, and moves each row to a terminal status.
//! One row's failure never aborts the rest of the batch.

use chrono::Duration;
use serde::Serialize;
use startline_core::alert::{AlertStatus, LeadTime};
use startline_core::notification::{build_payload, pick_target_url, NotificationPayload};
use startline_core::types::{DbId, Timestamp};
use startline_db::models::alert::DueAlert;
use startline_db::models::user::{PushSubscriptionInput, PushSubscriptionKeys};
use startline_db::repositories::ScheduledAlertRepo;
use startline_db::DbPool;

use crate::delivery::email::EmailChannel;
use crate::delivery::push::PushChannel;

// ---------------------------------------------------------------------------
// Settings & window
// ---------------------------------------------------------------------------

/// Tunables for the dispatch loop, all explicit rather than assumed.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Forward window: rows with `scheduled_for < now + lookahead` are due.
    /// Must match the invocation cadence or alerts are skipped.
    pub lookahead: Duration,
    /// Backward widening of the window. Zero preserves the strict
    /// fixed-forward window; raising it lets a run catch up rows missed by
    /// a skipped invocation.
    pub grace: Duration,
    /// Age past the fire time after which a row still in `claimed` is
    /// considered orphaned (claimer crashed before recording an outcome)
    /// and expired to `failed`.
    pub stale_after: Duration,
    /// Deep-link fallback when an event has no registration or official URL.
    pub default_url: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            lookahead: Duration::seconds(60),
            grace: Duration::zero(),
            stale_after: Duration::seconds(600),
            default_url: "https://startline.local".to_string(),
        }
    }
}

/// The half-open time window `[start, end)` one dispatcher run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl DispatchWindow {
    /// Compute the window for a run at `now`.
    pub fn at(now: Timestamp, settings: &DispatchSettings) -> Self {
        Self {
            start: now - settings.grace,
            end: now + settings.lookahead,
        }
    }

    pub fn contains(&self, t: Timestamp) -> bool {
        t >= self.start && t < self.end
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal outcome of processing one claimed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedAlert {
    pub status: AlertStatus,
    pub error: Option<String>,
}

/// Per-row entry in a [`DispatchReport`].
#[derive(Debug, Clone, Serialize)]
pub struct AlertOutcome {
    pub id: DbId,
    pub status: AlertStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What one dispatcher run did, for the caller to log.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub processed: usize,
    pub results: Vec<AlertOutcome>,
}

// ---------------------------------------------------------------------------
// Row processing
// ---------------------------------------------------------------------------

/// Data extracted from a [`DueAlert`] before any delivery is attempted.
struct PreparedAlert {
    payload: NotificationPayload,
    push_target: Option<PushSubscriptionInput>,
    email_target: Option<String>,
}

/// Validate the joined row and compose its notification.
///
/// Fails when the join came back empty (event or user deleted between
/// scheduling and dispatch) or the stored lead-time bucket is unreadable.
/// These are row-processing errors: the row is marked `failed`, not
/// `delivery_failed`.
fn prepare_alert(row: &DueAlert, default_url: &str) -> Result<PreparedAlert, String> {
    let event_name = row
        .event_name
        .as_deref()
        .ok_or_else(|| format!("event {} no longer exists", row.event_id))?;

    let lead = LeadTime::parse(&row.alert_type)
        .ok_or_else(|| format!("unknown alert_type '{}'", row.alert_type))?;

    let url = pick_target_url(
        row.registration_url.as_deref(),
        row.official_url.as_deref(),
        default_url,
    );

    let push_target = if row.push_enabled.unwrap_or(false) {
        match (&row.push_endpoint, &row.push_p256dh, &row.push_auth) {
            (Some(endpoint), Some(p256dh), Some(auth)) => Some(PushSubscriptionInput {
                endpoint: endpoint.clone(),
                keys: PushSubscriptionKeys {
                    p256dh: p256dh.clone(),
                    auth: auth.clone(),
                },
            }),
            // Enabled but never subscribed: nothing to attempt.
            _ => None,
        }
    } else {
        None
    };

    let email_target = if row.email_enabled.unwrap_or(false) {
        row.email.clone()
    } else {
        None
    };

    Ok(PreparedAlert {
        payload: build_payload(event_name, lead, url),
        push_target,
        email_target,
    })
}

/// Process one claimed row: compose, attempt each applicable channel, and
/// decide the terminal status. Never returns an error; every failure mode is
/// folded into the returned [`ProcessedAlert`].
///
/// Channel semantics:
/// - at least one channel delivered, or none were applicable -> `sent`;
/// - every attempted channel failed -> `delivery_failed`;
/// - the row itself could not be processed -> `failed`.
pub async fn process_alert(
    row: &DueAlert,
    push: Option<&dyn PushChannel>,
    email: Option<&dyn EmailChannel>,
    default_url: &str,
) -> ProcessedAlert {
    let prepared = match prepare_alert(row, default_url) {
        Ok(prepared) => prepared,
        Err(message) => {
            return ProcessedAlert {
                status: AlertStatus::Failed,
                error: Some(message),
            }
        }
    };

    // The two channels are fully independent; attempt them concurrently.
    let push_attempt = async {
        match (push, &prepared.push_target) {
            (Some(channel), Some(subscription)) => Some(
                channel
                    .deliver(subscription, &prepared.payload)
                    .await
                    .map_err(|e| e.to_string()),
            ),
            _ => None,
        }
    };

    let email_attempt = async {
        match (email, &prepared.email_target) {
            (Some(channel), Some(to)) => Some(
                channel
                    .deliver(to, &prepared.payload)
                    .await
                    .map_err(|e| e.to_string()),
            ),
            _ => None,
        }
    };

    let (push_result, email_result) = tokio::join!(push_attempt, email_attempt);

    let mut attempted = 0;
    let mut delivered = 0;
    let mut errors: Vec<String> = Vec::new();

    for (channel_name, result) in [("push", push_result), ("email", email_result)] {
        match result {
            None => {}
            Some(Ok(())) => {
                attempted += 1;
                delivered += 1;
            }
            Some(Err(message)) => {
                attempted += 1;
                tracing::warn!(
                    alert_id = row.id,
                    channel = channel_name,
                    error = %message,
                    "Channel delivery failed"
                );
                errors.push(format!("{channel_name}: {message}"));
            }
        }
    }

    if attempted > 0 && delivered == 0 {
        ProcessedAlert {
            status: AlertStatus::DeliveryFailed,
            error: Some(errors.join("; ")),
        }
    } else {
        ProcessedAlert {
            status: AlertStatus::Sent,
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Batch dispatch service.
///
/// Owns the database pool and the (optional) delivery channels; constructed
/// once at process startup and injected wherever a run is triggered.
pub struct Dispatcher {
    pool: DbPool,
    push: Option<Box<dyn PushChannel>>,
    email: Option<Box<dyn EmailChannel>>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        pool: DbPool,
        push: Option<Box<dyn PushChannel>>,
        email: Option<Box<dyn EmailChannel>>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            pool,
            push,
            email,
            settings,
        }
    }

    /// Run one dispatch pass at `now`.
    ///
    /// Expires orphaned claims, then claims every pending row due in the
    /// window, processes each in isolation, and records terminal statuses.
    /// Returns the per-row report; only the housekeeping and claim queries
    /// surface errors.
    pub async fn dispatch_due(&self, now: Timestamp) -> Result<DispatchReport, sqlx::Error> {
        let expired =
            ScheduledAlertRepo::expire_stale_claims(&self.pool, now - self.settings.stale_after)
                .await?;
        if expired > 0 {
            tracing::warn!(expired, "Expired orphaned claimed alerts");
        }

        let window = DispatchWindow::at(now, &self.settings);
        let due = ScheduledAlertRepo::claim_due(&self.pool, window.start, window.end).await?;

        let mut results = Vec::with_capacity(due.len());

        for row in &due {
            let processed = process_alert(
                row,
                self.push.as_deref(),
                self.email.as_deref(),
                &self.settings.default_url,
            )
            .await;

            if let Err(e) = ScheduledAlertRepo::mark_terminal(
                &self.pool,
                row.id,
                processed.status,
                now,
                processed.error.as_deref(),
            )
            .await
            {
                // The row stays `claimed`; it will not be re-sent.
                tracing::error!(alert_id = row.id, error = %e, "Failed to record alert outcome");
            }

            results.push(AlertOutcome {
                id: row.id,
                status: processed.status,
                error: processed.error,
            });
        }

        if !results.is_empty() {
            tracing::info!(processed = results.len(), "Dispatched due alerts");
        }

        Ok(DispatchReport {
            processed: results.len(),
            results,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn window_is_half_open() {
        let now = ts("2026-03-15T09:49:30+09:00");
        let window = DispatchWindow::at(now, &DispatchSettings::default());

        // Rows at now-1s, now+30s, now+90s: only the +30s row is selected.
        assert!(!window.contains(now - Duration::seconds(1)));
        assert!(window.contains(now + Duration::seconds(30)));
        assert!(!window.contains(now + Duration::seconds(90)));
        // Boundary: exactly now is included, exactly now+60s is not.
        assert!(window.contains(now));
        assert!(!window.contains(now + Duration::seconds(60)));
    }

    #[test]
    fn lookahead_selects_the_ten_minute_alert_thirty_seconds_early() {
        // Event opens 10:00; 10-minute alert fires 09:50; dispatcher runs
        // at 09:49:30 with a one-minute lookahead.
        let now = ts("2026-03-15T09:49:30+09:00");
        let window = DispatchWindow::at(now, &DispatchSettings::default());

        assert!(window.contains(ts("2026-03-15T09:50:00+09:00")));
        assert!(!window.contains(ts("2026-03-15T09:55:00+09:00")));
    }

    #[test]
    fn grace_widens_the_window_backwards() {
        let now = ts("2026-03-15T10:00:00+09:00");
        let settings = DispatchSettings {
            grace: Duration::seconds(120),
            ..DispatchSettings::default()
        };
        let window = DispatchWindow::at(now, &settings);

        assert!(window.contains(now - Duration::seconds(90)));
        assert!(!window.contains(now - Duration::seconds(121)));
    }
}
