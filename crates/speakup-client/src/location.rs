//! Device location acquisition.
//!
//! Every request asks the provider for a fresh fix and is bounded by
//! [`LocationOptions::timeout`]; a provider that overruns it is dropped and
//! the request fails with [`LocationError::Timeout`].

use std::time::Duration;

use async_trait::async_trait;
use speakup_shared::constants::LOCATION_TIMEOUT_SECS;
use speakup_shared::GeoLocation;
use tokio::process::Command;
use tracing::debug;

use crate::error::LocationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix a provider may return. Zero means always fresh.
    pub maximum_age: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(LOCATION_TIMEOUT_SECS),
            maximum_age: Duration::ZERO,
        }
    }
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self, options: &LocationOptions) -> Result<GeoLocation, LocationError>;
}

/// Ask `provider` for a position, enforcing the timeout and rejecting
/// out-of-range coordinates.
pub async fn acquire_location(
    provider: &dyn LocationProvider,
    options: &LocationOptions,
) -> Result<GeoLocation, LocationError> {
    match tokio::time::timeout(options.timeout, provider.current_position(options)).await {
        Ok(Ok(location)) if location.is_valid() => {
            debug!("location acquired");
            Ok(location)
        }
        Ok(Ok(_)) => Err(LocationError::Unavailable(
            "provider returned out-of-range coordinates".into(),
        )),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(LocationError::Timeout),
    }
}

/// Devices with no positioning capability.
#[derive(Debug, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_position(&self, _options: &LocationOptions) -> Result<GeoLocation, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// A fixed, operator-configured position (e.g. a kiosk or a desk phone).
#[derive(Debug, Clone)]
pub struct StaticLocation(pub GeoLocation);

#[async_trait]
impl LocationProvider for StaticLocation {
    async fn current_position(&self, _options: &LocationOptions) -> Result<GeoLocation, LocationError> {
        Ok(self.0)
    }
}

/// Runs an external command per request and parses `lat,lng` (or
/// `lat lng`) from the first line of its stdout.
///
/// The child is killed if the request times out.
#[derive(Debug, Clone)]
pub struct CommandLocation {
    program: String,
    args: Vec<String>,
}

impl CommandLocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a shell-style command line on whitespace.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl LocationProvider for CommandLocation {
    async fn current_position(&self, _options: &LocationOptions) -> Result<GeoLocation, LocationError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => LocationError::Unsupported,
                std::io::ErrorKind::PermissionDenied => LocationError::PermissionDenied,
                _ => LocationError::Unavailable(e.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LocationError::Unavailable(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_fix(stdout.lines().next().unwrap_or(""))
            .ok_or_else(|| LocationError::Unavailable(format!("unparseable fix: {}", stdout.trim())))
    }
}

fn parse_fix(line: &str) -> Option<GeoLocation> {
    let mut parts = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());
    let lat = parts.next()?.parse().ok()?;
    let lng = parts.next()?.parse().ok()?;
    Some(GeoLocation::new(lat, lng))
}
