//! Web Push delivery via an HTTP relay.
//!
//! [`PushDelivery`] hands the notification payload and the user's opaque
//! subscription to a push relay with a single JSON POST. The relay owns the
//! Web Push protocol details (encryption, endpoint delivery); this side only
//! carries the VAPID key pair it signs with. One attempt per invocation --
//! a missed push is tolerated, the next dispatcher run will not retry it.

use std::time::Duration;

use async_trait::async_trait;
use startline_core::notification::NotificationPayload;
use startline_db::models::user::PushSubscriptionInput;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for push delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The relay returned a non-2xx status code.
    #[error("Push relay returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// PushChannel
// ---------------------------------------------------------------------------

/// Seam for the push channel so the dispatcher can be tested without a relay.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Deliver one notification to one subscription.
    async fn deliver(
        &self,
        subscription: &PushSubscriptionInput,
        payload: &NotificationPayload,
    ) -> Result<(), PushError>;
}

// ---------------------------------------------------------------------------
// PushConfig
// ---------------------------------------------------------------------------

/// Configuration for the push relay.
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Relay endpoint that accepts `{subscription, payload}` POSTs.
    pub gateway_url: String,
    /// VAPID public key (shared with browser clients at subscribe time).
    pub vapid_public_key: String,
    /// VAPID private key, sent to the relay as a bearer credential.
    pub vapid_private_key: String,
}

impl PushConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if any variable is missing, signalling that push
    /// delivery is not configured and the channel should be skipped.
    ///
    /// | Variable            | Required |
    /// |---------------------|----------|
    /// | `PUSH_GATEWAY_URL`  | yes      |
    /// | `VAPID_PUBLIC_KEY`  | yes      |
    /// | `VAPID_PRIVATE_KEY` | yes      |
    pub fn from_env() -> Option<Self> {
        Some(Self {
            gateway_url: std::env::var("PUSH_GATEWAY_URL").ok()?,
            vapid_public_key: std::env::var("VAPID_PUBLIC_KEY").ok()?,
            vapid_private_key: std::env::var("VAPID_PRIVATE_KEY").ok()?,
        })
    }
}

// ---------------------------------------------------------------------------
// PushDelivery
// ---------------------------------------------------------------------------

/// Sends notification payloads to the configured push relay.
pub struct PushDelivery {
    client: reqwest::Client,
    config: PushConfig,
}

impl PushDelivery {
    /// Create a new delivery service with a pre-configured HTTP client.
    pub fn new(config: PushConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, config }
    }
}

#[async_trait]
impl PushChannel for PushDelivery {
    async fn deliver(
        &self,
        subscription: &PushSubscriptionInput,
        payload: &NotificationPayload,
    ) -> Result<(), PushError> {
        let body = serde_json::json!({
            "subscription": subscription,
            "payload": payload,
            "vapid_public_key": self.config.vapid_public_key,
        });

        let response = self
            .client
            .post(&self.config.gateway_url)
            .bearer_auth(&self.config.vapid_private_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PushError::HttpStatus(response.status().as_u16()));
        }

        tracing::debug!(endpoint = %subscription.endpoint, "Push notification relayed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_does_not_panic() {
        let _delivery = PushDelivery::new(PushConfig {
            gateway_url: "https://push.example.com/send".into(),
            vapid_public_key: "pub".into(),
            vapid_private_key: "priv".into(),
        });
    }

    #[test]
    fn push_error_display_http_status() {
        let err = PushError::HttpStatus(410);
        assert_eq!(err.to_string(), "Push relay returned HTTP 410");
    }

    #[test]
    fn push_error_display_request() {
        // Build a reqwest error from an invalid URL.
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = PushError::Request(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
    }
}
