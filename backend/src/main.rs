//! Report store entry-point: loads settings, prepares the database and
//! serves the HTTP API.
//!
//! Any failure before the listener is bound aborts startup.

mod server;

use std::io;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use report_store::inbound::http::health::HealthState;
use report_store::outbound::persistence::{DbPool, run_pending_migrations};

use server::{ServerConfig, ServerSettings, build_report_service, create_server};

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => warn!(error = %e, "SIGTERM handler unavailable; waiting for Ctrl-C only"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl-C handler unavailable; liveness will not report draining");
        std::future::pending::<()>().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt().with_env_filter(filter).json().try_init() {
        warn!(error = %e, "tracing init failed");
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    init_tracing();

    let settings = ServerSettings::load().map_err(|e| io::Error::other(e.to_string()))?;
    let database_url = settings.database_url().map_err(io::Error::other)?;

    run_pending_migrations(database_url)
        .await
        .map_err(io::Error::other)?;
    let pool = DbPool::new(settings.pool_config(database_url))
        .await
        .map_err(io::Error::other)?;

    let service = build_report_service(&pool, settings.idempotency_ttl());
    if let Err(e) = service.purge_expired_idempotency_keys().await {
        warn!(error = %e, "idempotency key purge failed");
    }

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(settings.bind_addr(), pool).with_cors(settings.cors_policy());
    let server = create_server(health_state.clone(), service, config)?;
    actix_web::rt::spawn(async move { health_state.drain_on(shutdown_signal()).await });

    server.await?;
    info!("report store stopped");
    Ok(())
}
