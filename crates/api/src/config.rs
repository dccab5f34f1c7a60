use chrono::Duration;
use startline_alerts::DispatchSettings;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have sensible defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Shared secret authorizing the cron-triggered dispatch endpoint.
    pub cron_secret: String,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Dispatch window tunables.
    pub dispatch: DispatchConfig,
}

/// Dispatch loop configuration.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Forward window in seconds (default: `60`, the invocation cadence).
    pub lookahead_secs: i64,
    /// Backward window in seconds (default: `0`; raise to catch up rows
    /// missed by a skipped invocation).
    pub grace_secs: i64,
    /// Seconds past the fire time before an orphaned `claimed` row is
    /// expired to `failed` (default: `600`).
    pub stale_secs: i64,
    /// Deep-link fallback for events without any URL.
    pub default_url: String,
}

/// Default deep-link fallback.
const DEFAULT_EVENT_URL: &str = "https://startline.local";

impl DispatchConfig {
    /// Load dispatch tunables from environment variables.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `DISPATCH_LOOKAHEAD_SECS`| `60`                       |
    /// | `DISPATCH_GRACE_SECS`    | `0`                        |
    /// | `DISPATCH_STALE_SECS`    | `600`                      |
    /// | `DEFAULT_EVENT_URL`      | `https://startline.local`  |
    pub fn from_env() -> Self {
        let lookahead_secs: i64 = std::env::var("DISPATCH_LOOKAHEAD_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("DISPATCH_LOOKAHEAD_SECS must be a valid i64");

        let grace_secs: i64 = std::env::var("DISPATCH_GRACE_SECS")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("DISPATCH_GRACE_SECS must be a valid i64");

        let stale_secs: i64 = std::env::var("DISPATCH_STALE_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("DISPATCH_STALE_SECS must be a valid i64");

        let default_url =
            std::env::var("DEFAULT_EVENT_URL").unwrap_or_else(|_| DEFAULT_EVENT_URL.into());

        Self {
            lookahead_secs,
            grace_secs,
            stale_secs,
            default_url,
        }
    }

    /// Convert into the alert pipeline's settings type.
    pub fn to_settings(&self) -> DispatchSettings {
        DispatchSettings {
            lookahead: Duration::seconds(self.lookahead_secs),
            grace: Duration::seconds(self.grace_secs),
            stale_after: Duration::seconds(self.stale_secs),
            default_url: self.default_url.clone(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `CRON_SECRET`          | **required**            |
    ///
    /// # Panics
    ///
    /// Panics if `CRON_SECRET` or `JWT_SECRET` is missing, which is the
    /// desired behaviour -- we want misconfiguration to fail fast.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let cron_secret =
            std::env::var("CRON_SECRET").expect("CRON_SECRET must be set in the environment");
        assert!(!cron_secret.is_empty(), "CRON_SECRET must not be empty");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            cron_secret,
            jwt: JwtConfig::from_env(),
            dispatch: DispatchConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_config_converts_to_settings() {
        let config = DispatchConfig {
            lookahead_secs: 90,
            grace_secs: 30,
            stale_secs: 900,
            default_url: "https://example.com".into(),
        };
        let settings = config.to_settings();

        assert_eq!(settings.lookahead, Duration::seconds(90));
        assert_eq!(settings.grace, Duration::seconds(30));
        assert_eq!(settings.stale_after, Duration::seconds(900));
        assert_eq!(settings.default_url, "https://example.com");
    }
}
