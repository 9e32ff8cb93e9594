//! secure-service - main entry point
//!
//! Logs in to Vault before serving any traffic, keeps the session alive
//! with a background renewal loop, and exposes a healthcheck plus a demo
//! endpoint that fetches a static secret.

use anyhow::Context;
use secure_service::config::Config;
use secure_service::handlers::{self, AppState};
use secure_service::shutdown::{self, Shutdown};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vault_session::{SessionManager, spawn_renewal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("starting secure-service");

    let config = Config::from_env().context("unable to parse environment variables")?;

    // the service must not begin serving until a valid session exists
    let session = Arc::new(SessionManager::new(config.connection_parameters())?);
    let lease = session.login().await.with_context(|| {
        format!("unable to initialize vault session @ {}", config.vault_address)
    })?;

    let shutdown = Arc::new(Shutdown::new());
    let renewal = spawn_renewal(Arc::clone(&session), lease, shutdown.subscribe());

    let trigger = Arc::clone(&shutdown);
    tokio::spawn(async move {
        shutdown::wait_for_signal().await;
        trigger.trigger();
    });

    let app = handlers::router(AppState { session });
    let listener = tokio::net::TcpListener::bind(config.listen_address)
        .await
        .with_context(|| format!("unable to bind {}", config.listen_address))?;
    info!(address = %config.listen_address, "listening for http traffic");

    let mut shutdown_rx = shutdown.subscribe();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    // stop the renewal loop as well if the server exited on its own
    shutdown.trigger();
    let _ = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_seconds),
        renewal,
    )
    .await;

    info!("goodbye");
    Ok(())
}
