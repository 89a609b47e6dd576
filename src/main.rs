//! Application entry point for the `alarmclock-server` backend service.
//!
//! This binary orchestrates the full startup sequence for the alarm API
//! shared by the clock device and the browser front end:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool
//! - Creating the `alarm_settings` table if it does not exist
//! - Mounting all API routes via the `routes` gateway
//! - Serving until Ctrl-C / SIGTERM, then closing the pool
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `PORT` (optional) – listen port (default: 3000)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the remaining options.
use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::signal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

mod config;
mod error;
mod models;
mod routes;
mod schema;
mod service;
mod store;

pub use config::{Config, StoreKind};

// Re-exported so routes/*.rs only need to know their parent module.
pub use error::AlarmError;
pub use models::AlarmRecord;
pub use service::{AlarmService, Upserted};

use store::{AlarmStore, MemoryAlarmStore, PgAlarmStore};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let (store, pool): (Arc<dyn AlarmStore>, Option<PgPool>) = match cfg.store {
        StoreKind::Postgres => {
            let pool = connect(&cfg).await?;
            schema::create_schema(&pool).await?;
            (Arc::new(PgAlarmStore::new(pool.clone())), Some(pool))
        }
        StoreKind::Memory => {
            tracing::warn!("Using the in-memory alarm store; alarms are lost on restart");
            (Arc::new(MemoryAlarmStore::new()), None)
        }
    };

    let service = AlarmService::new(store)
        .with_policy(cfg.next_alarm_policy)
        .singleton(cfg.singleton);

    let static_dir = cfg.static_dir.is_dir().then_some(cfg.static_dir.as_path());
    if static_dir.is_none() {
        tracing::info!(
            "Static directory {} not found; serving the API only",
            cfg.static_dir.display()
        );
    }

    let app: Router = routes::router(service, static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database pool closed");
    }

    Ok(())
}

// ---

/// Open the pool and prove the database answers before any route is served.
async fn connect(cfg: &Config) -> Result<PgPool> {
    // ---
    tracing::info!("Attempting to connect to database: {}", cfg.masked_db_url());

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .acquire_timeout(Duration::from_secs(u64::from(cfg.db_acquire_timeout_secs)))
        .connect(&cfg.db_url)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to connect to database '{}': {}",
                cfg.masked_db_url(),
                e
            )
        })?;

    tracing::info!("Successfully connected to database");
    Ok(pool)
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    // ---
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `AXUM_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `AXUM_LOG_LEVEL` env var
///
/// Called once at startup, after `.env` is loaded so the variables above
/// may live there too.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to AXUM_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("AXUM_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
