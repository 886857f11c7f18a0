//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development -- except SMS notification, which
//! stays disabled until the Twilio passthrough credentials are provided.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:3000`
    pub http_addr: SocketAddr,

    /// Filesystem path of the SQLite pointer index.
    /// Env: `INDEX_DB_PATH`
    /// Default: none (platform data directory).
    pub index_db_path: Option<PathBuf>,

    /// Base URL of the vault service used to validate caller credentials
    /// and to relay SMS notifications.
    /// Env: `VAULT_ENDPOINT`
    /// Default: `https://api.vault.example`
    pub vault_endpoint: String,

    /// Twilio passthrough settings for the notification dispatcher.
    /// Absent unless all four `TWILIO_*` variables are set; the dispatcher
    /// is disabled without it (notification is advisory).
    pub sms: Option<SmsConfig>,
}

/// Settings for the vault's Twilio SMS passthrough.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    /// Env: `TWILIO_ACCOUNT_SID`
    pub account_sid: String,

    /// Env: `TWILIO_KEY_SID`
    pub key_sid: String,

    /// Env: `TWILIO_KEY_SECRET`
    pub key_secret: String,

    /// Sender phone number, passed to the vault as a literal value.
    /// Env: `TWILIO_FROM_NUMBER`
    pub from_number: String,

    /// Base URL used in the alert text's conversation link.
    /// Env: `CONVERSATION_LINK_BASE`
    /// Default: `https://example.com`
    pub conversation_link_base: String,

    /// Upper bound on one notification attempt, in seconds.
    /// Env: `NOTIFY_TIMEOUT_SECS`
    /// Default: `10`
    pub notify_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 3000).into(),
            index_db_path: None,
            vault_endpoint: "https://api.vault.example".to_string(),
            sms: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Ok(path) = std::env::var("INDEX_DB_PATH") {
            config.index_db_path = Some(PathBuf::from(path));
        }

        if let Ok(endpoint) = std::env::var("VAULT_ENDPOINT") {
            config.vault_endpoint = endpoint;
        }

        config.sms = SmsConfig::from_env();
        if config.sms.is_none() {
            tracing::warn!(
                "TWILIO_* variables not fully set; SMS notification is disabled"
            );
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

impl SmsConfig {
    /// Present only when all four Twilio variables are set.
    pub fn from_env() -> Option<Self> {
        let account_sid = std::env::var("TWILIO_ACCOUNT_SID").ok()?;
        let key_sid = std::env::var("TWILIO_KEY_SID").ok()?;
        let key_secret = std::env::var("TWILIO_KEY_SECRET").ok()?;
        let from_number = std::env::var("TWILIO_FROM_NUMBER").ok()?;

        let conversation_link_base = std::env::var("CONVERSATION_LINK_BASE")
            .unwrap_or_else(|_| "https://example.com".to_string());

        let notify_timeout_secs = std::env::var("NOTIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Some(Self {
            account_sid,
            key_sid,
            key_secret,
            from_number,
            conversation_link_base,
            notify_timeout_secs,
        })
    }
}
