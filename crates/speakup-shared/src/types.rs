use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ContactError;
use crate::location::GeoLocation;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email regex"));

/// Loose syntactic check: something@something.tld, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

/// A person who receives an email when the user triggers SOS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub email: String,
}

impl EmergencyContact {
    /// Trim and validate a name/email pair.
    pub fn new(name: &str, email: &str) -> Result<Self, ContactError> {
        let name = name.trim();
        let email = email.trim();

        if name.is_empty() || email.is_empty() {
            return Err(ContactError::MissingField);
        }
        if !is_valid_email(email) {
            return Err(ContactError::InvalidEmail(email.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    /// Lower-cased email, used to detect duplicates.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    pub fn has_valid_email(&self) -> bool {
        is_valid_email(self.email.trim())
    }
}

// ---------------------------------------------------------------------------
// Dispatch request / response
// ---------------------------------------------------------------------------

/// Body of `POST /sos`. Built fresh for every activation, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    #[serde(default)]
    pub contacts: Vec<EmergencyContact>,
    pub location: Option<GeoLocation>,
    /// Human-readable, timezone-qualified trigger time.
    pub timestamp: String,
}

/// Aggregate outcome of one dispatch. Partial failure is a valid result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub successful: usize,
    pub failed: usize,
}

impl DispatchResult {
    pub fn new(successful: usize, failed: usize) -> Self {
        Self { successful, failed }
    }

    pub fn total(&self) -> usize {
        self.successful + self.failed
    }

    pub fn all_delivered(&self) -> bool {
        self.failed == 0
    }

    /// `"2 contact(s) notified"`
    pub fn notified_label(&self) -> String {
        format!("{} contact(s) notified", self.successful)
    }

    /// `"2 of 3 contacts notified"`
    pub fn summary(&self) -> String {
        format!("{} of {} contacts notified", self.successful, self.total())
    }
}

/// 200 response of `POST /sos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SosResponse {
    pub success: bool,
    pub message: String,
    pub successful: usize,
    pub failed: usize,
}

impl SosResponse {
    pub fn from_result(result: DispatchResult) -> Self {
        Self {
            success: true,
            message: format!("SOS alerts sent to {} contact(s)", result.successful),
            successful: result.successful,
            failed: result.failed,
        }
    }

    pub fn result(&self) -> DispatchResult {
        DispatchResult::new(self.successful, self.failed)
    }
}

/// 4xx/5xx response of `POST /sos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
