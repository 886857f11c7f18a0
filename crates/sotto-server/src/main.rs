//! # sotto-server
//!
//! Chat API server owning the message-pointer index.
//!
//! This binary provides:
//! - **Bearer-credential authentication** against the vault identity
//!   provider (every chat route, before any state is touched)
//! - **Append-only pointer index** (SQLite) of routing metadata: who wrote
//!   to whom, when, and where in the vault the body lives
//! - **REST API** (axum) for listing a conversation's pointers and
//!   appending new ones
//! - **Best-effort SMS notification** through the vault's Twilio
//!   passthrough, detached from the request path
//!
//! Message content never reaches this process; it is written to and read
//! from the vault directly by clients.

mod api;
mod auth;
mod config;
mod error;
mod notify;

use std::sync::{Arc, Mutex};

use tracing::info;
use tracing_subscriber::EnvFilter;

use sotto_index::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::notify::Notifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sotto_server=debug")),
        )
        .init();

    info!("Starting sotto chat server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    // Not logged wholesale: the SMS section carries credentials.
    let config = ServerConfig::from_env();
    info!(
        http_addr = %config.http_addr,
        vault = %config.vault_endpoint,
        sms_enabled = config.sms.is_some(),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Pointer index (runs migrations on open).
    let index = match &config.index_db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };

    // Notification dispatcher (disabled when SMS is not configured).
    let notifier = Arc::new(Notifier::new(config.sms.clone()));

    let http_addr = config.http_addr;
    let state = AppState {
        index: Arc::new(Mutex::new(index)),
        config: Arc::new(config),
        notifier,
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(state, http_addr) => {
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
