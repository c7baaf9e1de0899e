//! Alert timestamp formatting.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};

/// `Monday, January 1, 2024 at 09:00:00 AM -05:00` for local time; `%Z`
/// renders a numeric offset there and `UTC` for [`chrono::Utc`].
const ALERT_TIMESTAMP_FORMAT: &str = "%A, %B %-d, %Y at %I:%M:%S %p %Z";

/// Render the instant an alert was triggered as a human-readable,
/// timezone-qualified string.
pub fn format_alert_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(ALERT_TIMESTAMP_FORMAT).to_string()
}

/// [`format_alert_timestamp`] for the current local time.
pub fn alert_timestamp_now() -> String {
    format_alert_timestamp(&Local::now())
}
