//! wahlinfo-sw server entry point.
//!
//! This is the main binary that boots the offline cache controller behind an
//! MCP server on stdio transport. Logging goes to stderr to avoid interfering
//! with the JSON-RPC protocol on stdout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;
use wahlinfo_client::{FetchClient, FetchConfig};
use wahlinfo_core::worker::Registration;
use wahlinfo_core::{AppConfig, CacheDb};

mod error;
mod handler;
mod notify;
mod tools;

/// Background wake-up for reminder checks. A failed check skips one cycle.
async fn reminder_loop(registration: Arc<Registration<handler::Worker>>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        match registration.periodic_check(Utc::now()).await {
            Ok(shown) if !shown.is_empty() => tracing::info!(count = shown.len(), "reminders notified"),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "reminder check failed"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        version = %config.version_tag,
        db = %config.db_path.display(),
        origin = %config.app_origin,
        "Starting wahlinfo-sw on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from_app(&config))?;
    let host = handler::ServiceWorkerHost::new(config.clone(), db, network, Arc::new(notify::TracingNotifier))?;

    match host.register_configured().await {
        Ok(outcome) => tracing::info!(?outcome, "worker registered"),
        Err(e) => tracing::warn!(error = %e, "initial install failed; requests pass through until an update succeeds"),
    }

    let reminders = tokio::spawn(reminder_loop(host.registration(), config.reminder_interval()));

    let server = serve_server(host, stdio()).await?;
    server.waiting().await?;

    reminders.abort();
    Ok(())
}
