//! Server configuration loaded from environment variables.
//!
//! Everything except the email API key has a default, so the server starts
//! with zero configuration for local development. Without a key it still
//! serves requests but answers every SOS with "Email service not configured".

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use speakup_shared::constants::DEFAULT_HTTP_PORT;

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// API key of the transactional email provider.
    /// Env: `RESEND_API_KEY`
    /// Default: none (email service not configured).
    pub email_api_key: Option<String>,

    /// Endpoint emails are POSTed to.
    /// Env: `EMAIL_API_URL`
    /// Default: `https://api.resend.com/emails`
    pub email_api_url: String,

    /// Sender shown on alert emails.
    /// Env: `EMAIL_FROM`
    pub email_from: String,

    /// Per-request timeout towards the email provider.
    /// Env: `EMAIL_TIMEOUT_SECS`
    /// Default: `15`
    pub email_timeout: Duration,

    /// Largest contact list accepted in one SOS request.
    /// Env: `MAX_CONTACTS_PER_ALERT`
    /// Default: `50`
    pub max_contacts: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            email_api_key: None,
            email_api_url: "https://api.resend.com/emails".to_string(),
            email_from: "SpeakUp Emergency <onboarding@resend.dev>".to_string(),
            email_timeout: Duration::from_secs(15),
            max_contacts: 50,
        }
    }
}

// The API key must never reach the logs.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field(
                "email_api_key",
                &self.email_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("email_api_url", &self.email_api_url)
            .field("email_from", &self.email_from)
            .field("email_timeout", &self.email_timeout)
            .field("max_contacts", &self.max_contacts)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(key) = var("RESEND_API_KEY") {
            if !key.trim().is_empty() {
                config.email_api_key = Some(key.trim().to_string());
            }
        }

        if let Some(url) = var("EMAIL_API_URL") {
            config.email_api_url = url;
        }

        if let Some(from) = var("EMAIL_FROM") {
            if !from.trim().is_empty() {
                config.email_from = from;
            }
        }

        if let Some(val) = var("EMAIL_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.email_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid EMAIL_TIMEOUT_SECS, using default"),
            }
        }

        if let Some(val) = var("MAX_CONTACTS_PER_ALERT") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_contacts = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_CONTACTS_PER_ALERT, using default"),
            }
        }

        config
    }

    pub fn email_configured(&self) -> bool {
        self.email_api_key.is_some()
    }
}
