use speakup_shared::constants::EMERGENCY_NUMBER;
use thiserror::Error;

/// Why a location request produced no fix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location access denied")]
    PermissionDenied,

    #[error("Geolocation not supported on this device")]
    Unsupported,

    #[error("Location request timed out")]
    Timeout,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Failure talking to the dispatch service.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Anything that is not a JSON body we understand.
    #[error("Server returned an invalid response (HTTP {status})")]
    InvalidResponse { status: u16 },

    #[error("Server error (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Category of a failed SOS attempt; decides what the user is told to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    MissingContacts,
    ContactStorage,
    Location,
    Network,
    Server,
}

impl FailureCause {
    pub fn remediation(&self) -> String {
        match self {
            FailureCause::MissingContacts => {
                "Please add at least one emergency contact first.".to_string()
            }
            FailureCause::ContactStorage => format!(
                "Could not read your emergency contacts. Please re-add them, or contact emergency services directly at {EMERGENCY_NUMBER}."
            ),
            FailureCause::Location => {
                "Could not send SOS alert. Please enable location access in your device settings and try again."
                    .to_string()
            }
            FailureCause::Network => format!(
                "Could not send SOS alert. Network error. Please check your internet connection and try again, or contact emergency services directly at {EMERGENCY_NUMBER}."
            ),
            FailureCause::Server => format!(
                "Could not send SOS alert. Server error. Please contact emergency services directly at {EMERGENCY_NUMBER}."
            ),
        }
    }
}

/// A terminal failure of one SOS attempt, ready to show to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SosFailure {
    pub cause: FailureCause,
    /// Actionable text for the user.
    pub message: String,
    /// Underlying error, for logs and "details" views.
    pub detail: String,
}

impl SosFailure {
    pub fn new(cause: FailureCause, detail: impl Into<String>) -> Self {
        Self {
            cause,
            message: cause.remediation(),
            detail: detail.into(),
        }
    }
}

impl From<&LocationError> for SosFailure {
    fn from(e: &LocationError) -> Self {
        SosFailure::new(FailureCause::Location, e.to_string())
    }
}

impl From<&DispatchError> for SosFailure {
    fn from(e: &DispatchError) -> Self {
        let cause = match e {
            DispatchError::Network(_) => FailureCause::Network,
            DispatchError::InvalidResponse { .. } | DispatchError::Rejected { .. } => {
                FailureCause::Server
            }
        };
        SosFailure::new(cause, e.to_string())
    }
}

impl std::fmt::Display for SosFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
