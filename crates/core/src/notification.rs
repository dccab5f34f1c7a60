//! Notification payload composition.

use serde::Serialize;

use crate::alert::LeadTime;

/// The single payload shape handed to every delivery channel.
///
/// Push serializes this as JSON; email maps `title` to the subject and
/// renders `body` + `url` into the message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    /// Deep-link target for the notification.
    pub url: String,
}

/// Pick the deep-link target: registration page first, then the official
/// page, then the configured fallback.
pub fn pick_target_url(
    registration_url: Option<&str>,
    official_url: Option<&str>,
    default_url: &str,
) -> String {
    registration_url
        .filter(|u| !u.is_empty())
        .or(official_url.filter(|u| !u.is_empty()))
        .unwrap_or(default_url)
        .to_string()
}

/// Compose the notification for one due alert.
pub fn build_payload(event_name: &str, lead: LeadTime, url: String) -> NotificationPayload {
    NotificationPayload {
        title: format!("{event_name}: registration opens in {}", lead.label()),
        body: "Registration is about to open.".to_string(),
        url,
    }
}
