//! Standalone dispatch worker.
//!
//! Runs the alert dispatch pass on a fixed interval, for deployments without
//! an external cron hitting the API's `/internal/dispatch` endpoint. Exactly
//! one of the two triggers should be active per environment; running both
//! is harmless (claiming uses `FOR UPDATE SKIP LOCKED`) but wasteful.

use chrono::Duration;
use startline_alerts::{
    DispatchSettings, Dispatcher, EmailChannel, EmailConfig, EmailDelivery, PushChannel,
    PushConfig, PushDelivery,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default seconds between dispatch passes. Matches the default lookahead
/// window so consecutive passes tile the timeline without gaps.
const DEFAULT_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "startline_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = startline_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    startline_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    let push: Option<Box<dyn PushChannel>> = match PushConfig::from_env() {
        Some(cfg) => Some(Box::new(PushDelivery::new(cfg))),
        None => {
            tracing::warn!("Push delivery not configured, push alerts disabled");
            None
        }
    };
    let email: Option<Box<dyn EmailChannel>> = match EmailConfig::from_env() {
        Some(cfg) => Some(Box::new(EmailDelivery::new(cfg))),
        None => {
            tracing::warn!("SMTP not configured, email alerts disabled");
            None
        }
    };

    let dispatcher = Dispatcher::new(pool, push, email, settings_from_env());

    let interval_secs: u64 = std::env::var("DISPATCH_INTERVAL_SECS")
        .unwrap_or_else(|_| DEFAULT_INTERVAL_SECS.to_string())
        .parse()
        .expect("DISPATCH_INTERVAL_SECS must be a valid u64");

    let cancel = CancellationToken::new();
    let loop_cancel = cancel.clone();

    let run = tokio::spawn(async move {
        run_loop(dispatcher, interval_secs, loop_cancel).await;
    });

    shutdown_signal().await;
    cancel.cancel();
    let _ = run.await;

    tracing::info!("Worker stopped");
}

/// Run the dispatch loop until cancelled.
async fn run_loop(dispatcher: Dispatcher, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
    tracing::info!(interval_secs, "Dispatch loop started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Dispatch loop cancelled");
                break;
            }
            _ = interval.tick() => {
                match dispatcher.dispatch_due(chrono::Utc::now()).await {
                    Ok(report) => {
                        if report.processed > 0 {
                            tracing::info!(processed = report.processed, "Dispatch pass complete");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Dispatch pass failed");
                    }
                }
            }
        }
    }
}

/// Load dispatch window tunables from environment variables.
///
/// | Env Var                  | Default                    |
/// |--------------------------|----------------------------|
/// | `DISPATCH_LOOKAHEAD_SECS`| `60`                       |
/// | `DISPATCH_GRACE_SECS`    | `0`                        |
/// | `DISPATCH_STALE_SECS`    | `600`                      |
/// | `DEFAULT_EVENT_URL`      | `https://startline.local`  |
fn settings_from_env() -> DispatchSettings {
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

    let default_url = std::env::var("DEFAULT_EVENT_URL")
        .unwrap_or_else(|_| "https://startline.local".into());

    DispatchSettings {
        lookahead: Duration::seconds(lookahead_secs),
        grace: Duration::seconds(grace_secs),
        stale_after: Duration::seconds(stale_secs),
        default_url,
    }
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
