//! Client configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use speakup_shared::constants::{LOCATION_TIMEOUT_SECS, SOS_COUNTDOWN_SECS};
use speakup_shared::GeoLocation;

use crate::controller::{ControllerSettings, LocationPolicy};
use crate::location::LocationOptions;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the dispatch service.
    /// Env: `SPEAKUP_SERVER_URL`
    /// Default: `http://127.0.0.1:8080`
    pub server_url: String,

    /// Countdown length in seconds (at least 1).
    /// Env: `SPEAKUP_COUNTDOWN_SECS`
    /// Default: `5`
    pub countdown_secs: u32,

    /// Env: `SPEAKUP_LOCATION_TIMEOUT_SECS`
    /// Default: `10`
    pub location_timeout: Duration,

    /// What to do when no location fix can be obtained.
    /// Env: `SPEAKUP_LOCATION_POLICY` (`send-without` | `abort`)
    /// Default: `send-without`
    pub location_policy: LocationPolicy,

    /// Fixed position for devices without positioning.
    /// Env: `SPEAKUP_LAT` + `SPEAKUP_LNG`
    pub static_location: Option<GeoLocation>,

    /// Command printing `lat,lng` on stdout, run for every fix.
    /// Env: `SPEAKUP_LOCATION_CMD`
    pub location_command: Option<String>,

    /// Contact database path; platform data dir when unset.
    /// Env: `SPEAKUP_DB_PATH`
    pub db_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            countdown_secs: SOS_COUNTDOWN_SECS,
            location_timeout: Duration::from_secs(LOCATION_TIMEOUT_SECS),
            location_policy: LocationPolicy::default(),
            static_location: None,
            location_command: None,
            db_path: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = var("SPEAKUP_SERVER_URL") {
            if !url.trim().is_empty() {
                config.server_url = url.trim().to_string();
            }
        }

        if let Some(val) = var("SPEAKUP_COUNTDOWN_SECS") {
            match val.parse::<u32>() {
                Ok(n) if n >= 1 => config.countdown_secs = n,
                _ => tracing::warn!(value = %val, "Invalid SPEAKUP_COUNTDOWN_SECS, using default"),
            }
        }

        if let Some(val) = var("SPEAKUP_LOCATION_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(n) if n >= 1 => config.location_timeout = Duration::from_secs(n),
                _ => tracing::warn!(
                    value = %val,
                    "Invalid SPEAKUP_LOCATION_TIMEOUT_SECS, using default"
                ),
            }
        }

        if let Some(val) = var("SPEAKUP_LOCATION_POLICY") {
            match val.parse::<LocationPolicy>() {
                Ok(policy) => config.location_policy = policy,
                Err(e) => tracing::warn!(error = %e, "Invalid SPEAKUP_LOCATION_POLICY, using default"),
            }
        }

        if let (Some(lat), Some(lng)) = (var("SPEAKUP_LAT"), var("SPEAKUP_LNG")) {
            match (lat.parse::<f64>(), lng.parse::<f64>()) {
                (Ok(lat), Ok(lng)) if GeoLocation::new(lat, lng).is_valid() => {
                    config.static_location = Some(GeoLocation::new(lat, lng));
                }
                _ => tracing::warn!("Invalid SPEAKUP_LAT/SPEAKUP_LNG, ignoring"),
            }
        }

        if let Some(cmd) = var("SPEAKUP_LOCATION_CMD") {
            if !cmd.trim().is_empty() {
                config.location_command = Some(cmd);
            }
        }

        if let Some(path) = var("SPEAKUP_DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }

        config
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            countdown_secs: self.countdown_secs,
            tick: Duration::from_secs(1),
            location: LocationOptions {
                timeout: self.location_timeout,
                ..LocationOptions::default()
            },
            location_policy: self.location_policy,
        }
    }
}
