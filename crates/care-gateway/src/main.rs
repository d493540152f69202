//! OpenCare API Gateway binary
//!
//! Reads its credential secret from the environment and refuses to start
//! without one; there is no built-in fallback secret.

use care_access::ApprovalConfig;
use care_gateway::{build_router, AppState};
use care_tenant::GuardConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn approval_config_from_env() -> ApprovalConfig {
    let mut config = ApprovalConfig::default();
    if let Some(hours) = env_hours("CARE_PENDING_TTL_HOURS") {
        config.pending_ttl = hours;
    }
    if let Some(hours) = env_hours("CARE_GRANT_TTL_HOURS") {
        config.grant_ttl = hours;
    }
    config
}

fn env_hours(key: &str) -> Option<chrono::Duration> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<i64>() {
        Ok(hours) if hours > 0 => Some(chrono::Duration::hours(hours)),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring invalid TTL override");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let guard_config = match GuardConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "refusing to start without a usable credential secret");
            std::process::exit(1);
        }
    };

    let state = AppState::new(&guard_config, approval_config_from_env());
    let app = build_router(state);

    let addr = std::env::var("CARE_BIND").unwrap_or_else(|_| "0.0.0.0:8080".into());
    tracing::info!("OpenCare gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
