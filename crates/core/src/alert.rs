//! Lead-time buckets, alert lifecycle states, and fire-time planning.
//!
//! The planning logic lives here (zero internal deps) so both the API
//! scheduler path and any worker tooling compute fire times identically.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// LeadTime
// ---------------------------------------------------------------------------

/// Offset before `registration_opens_at` at which an alert fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadTime {
    /// 10 minutes before registration opens.
    TenMinutes,
    /// 5 minutes before registration opens.
    FiveMinutes,
    /// 1 minute before registration opens.
    OneMinute,
}

impl LeadTime {
    /// All lead times, longest first (the order alerts fire in).
    pub const ALL: [LeadTime; 3] = [
        LeadTime::TenMinutes,
        LeadTime::FiveMinutes,
        LeadTime::OneMinute,
    ];

    /// Stable string stored in the `scheduled_alerts.alert_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            LeadTime::TenMinutes => "10min",
            LeadTime::FiveMinutes => "5min",
            LeadTime::OneMinute => "1min",
        }
    }

    /// Parse the stored column value back into a lead time.
    pub fn parse(s: &str) -> Option<LeadTime> {
        match s {
            "10min" => Some(LeadTime::TenMinutes),
            "5min" => Some(LeadTime::FiveMinutes),
            "1min" => Some(LeadTime::OneMinute),
            _ => None,
        }
    }

    /// Offset as a chrono duration.
    pub fn offset(self) -> Duration {
        Duration::minutes(self.minutes())
    }

    pub fn minutes(self) -> i64 {
        match self {
            LeadTime::TenMinutes => 10,
            LeadTime::FiveMinutes => 5,
            LeadTime::OneMinute => 1,
        }
    }

    /// Natural-language label used in notification titles.
    pub fn label(self) -> &'static str {
        match self {
            LeadTime::TenMinutes => "10 minutes",
            LeadTime::FiveMinutes => "5 minutes",
            LeadTime::OneMinute => "1 minute",
        }
    }
}

// ---------------------------------------------------------------------------
// AlertStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a `scheduled_alerts` row.
///
/// `Pending` rows are created by the scheduler. The dispatcher claims them
/// (`Claimed`) as part of its selection query, then moves each row to exactly
/// one terminal state. Terminal rows are never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Not yet attempted.
    Pending,
    /// Selected by a dispatcher run; transient, not terminal.
    Claimed,
    /// Delivery was attempted and at least one channel succeeded, or no
    /// channel was applicable.
    Sent,
    /// Every attempted channel failed.
    DeliveryFailed,
    /// Row processing itself failed before channels could be attempted.
    Failed,
}

impl AlertStatus {
    /// Stable string stored in the `scheduled_alerts.status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Pending => "pending",
            AlertStatus::Claimed => "claimed",
            AlertStatus::Sent => "sent",
            AlertStatus::DeliveryFailed => "delivery_failed",
            AlertStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<AlertStatus> {
        match s {
            "pending" => Some(AlertStatus::Pending),
            "claimed" => Some(AlertStatus::Claimed),
            "sent" => Some(AlertStatus::Sent),
            "delivery_failed" => Some(AlertStatus::DeliveryFailed),
            "failed" => Some(AlertStatus::Failed),
            _ => None,
        }
    }

    /// Whether the row can never change state again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AlertStatus::Sent | AlertStatus::DeliveryFailed | AlertStatus::Failed
        )
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// A user's lead-time opt-in choices for one event.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AlertChoices {
    pub want_10min: bool,
    pub want_5min: bool,
    pub want_1min: bool,
}

impl AlertChoices {
    /// The lead times this choice set opts into, longest first.
    pub fn selected(&self) -> Vec<LeadTime> {
        LeadTime::ALL
            .into_iter()
            .filter(|lead| match lead {
                LeadTime::TenMinutes => self.want_10min,
                LeadTime::FiveMinutes => self.want_5min,
                LeadTime::OneMinute => self.want_1min,
            })
            .collect()
    }
}

/// A concrete alert to persist: a lead-time bucket and its absolute fire time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedAlert {
    pub lead: LeadTime,
    pub fire_at: Timestamp,
}

/// Registration has already opened; no alerts can be scheduled.
#[derive(Debug, thiserror::Error)]
#[error("registration opened at {opens_at}, cannot schedule alerts")]
pub struct RegistrationAlreadyOpen {
    pub opens_at: Timestamp,
}

/// Compute the concrete fire times for the selected lead times.
///
/// Fails if `opens_at` is not in the future relative to `now`. Lead times
/// whose fire time has already passed are silently omitted: a user opting
/// into a 10-minute alert 7 minutes before opening still gets the 5- and
/// 1-minute alerts.
pub fn plan_fire_times(
    opens_at: Timestamp,
    choices: AlertChoices,
    now: Timestamp,
) -> Result<Vec<PlannedAlert>, RegistrationAlreadyOpen> {
    if opens_at <= now {
        return Err(RegistrationAlreadyOpen { opens_at });
    }

    Ok(choices
        .selected()
        .into_iter()
        .filter_map(|lead| {
            let fire_at = opens_at - lead.offset();
            (fire_at > now).then_some(PlannedAlert { lead, fire_at })
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
