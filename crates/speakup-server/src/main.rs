//! # speakup-server
//!
//! Notification dispatch service for SpeakUp SOS alerts.
//!
//! This binary provides:
//! - **`POST /sos`** which emails an alert (time, location, map link) to
//!   every emergency contact in the request, each delivery independent of
//!   the others, and answers with how many were reached
//! - **`GET /health`** for liveness checks
//!
//! Email goes out through a Resend-compatible HTTP API configured with
//! `RESEND_API_KEY`.

mod api;
mod config;
mod dispatch;
mod error;
mod mailer;
mod template;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::mailer::{Mailer, ResendMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,speakup_server=debug")),
        )
        .init();

    info!("Starting SpeakUp dispatch server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Email provider
    // -----------------------------------------------------------------------
    if !config.email_configured() {
        warn!("RESEND_API_KEY not set; SOS requests will be refused");
    }
    let mailer: Option<Arc<dyn Mailer>> = match &config.email_api_key {
        Some(key) => Some(Arc::new(ResendMailer::new(
            config.email_api_url.clone(),
            key.clone(),
            config.email_timeout,
        )?)),
        None => None,
    };

    let dispatcher = Dispatcher::new(mailer, config.email_from.clone(), config.max_contacts);

    let http_addr = config.http_addr;
    let app_state = AppState {
        dispatcher: Arc::new(dispatcher),
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server until Ctrl+C
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
