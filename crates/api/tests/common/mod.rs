use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use startline_alerts::{DispatchSettings, Dispatcher};
use startline_api::auth::jwt::JwtConfig;
use startline_api::config::{DispatchConfig, ServerConfig};
use startline_api::router::build_app_router;
use startline_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        cron_secret: "test-cron-secret".to_string(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
        dispatch: DispatchConfig {
            lookahead_secs: 60,
            grace_secs: 0,
            stale_secs: 600,
            default_url: "https://startline.local".to_string(),
        },
    }
}

/// Build the full application router with all middleware layers.
///
/// This mirrors the router construction in `main.rs` so tests exercise the
/// same middleware stack (CORS, request ID, timeout, panic recovery) that
/// production uses. The pool is lazy and points at a closed port, so only
/// routes that never reach the database may be exercised.
pub fn build_test_app() -> Router {
    let config = test_config();

    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy("postgres://localhost:1/startline_test")
        .expect("lazy pool construction cannot fail on a well-formed URL");

    let dispatcher = Arc::new(Dispatcher::new(
        pool.clone(),
        None,
        None,
        DispatchSettings::default(),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        dispatcher,
    };

    build_app_router(state, &config)
}

/// Send a GET request to the app and return the response.
pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request construction");
    app.oneshot(request).await.expect("infallible service")
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collection")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body must be valid JSON")
}
