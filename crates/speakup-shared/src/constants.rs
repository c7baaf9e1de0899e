/// Application name
pub const APP_NAME: &str = "SpeakUp";

/// Seconds on the SOS countdown before dispatch begins
pub const SOS_COUNTDOWN_SECS: u32 = 5;

/// Upper bound on a single location request, in seconds
pub const LOCATION_TIMEOUT_SECS: u64 = 10;

/// Key under which the emergency contact list is persisted
pub const CONTACTS_STORE_KEY: &str = "emergency_contacts";

/// Base of the map link embedded in alerts
pub const MAPS_BASE_URL: &str = "https://www.google.com/maps";

/// Number dialled from the alert's call-to-action
pub const EMERGENCY_NUMBER: &str = "911";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Dispatch endpoint path
pub const SOS_PATH: &str = "/sos";

/// Path used by earlier web clients, kept as an alias
pub const LEGACY_SOS_PATH: &str = "/api/send-sos";

/// Error strings that are part of the HTTP contract
pub const ERR_NO_CONTACTS: &str = "No contacts provided";
pub const ERR_SERVICE_NOT_CONFIGURED: &str = "Email service not configured";
pub const ERR_SEND_FAILED: &str = "Failed to send SOS alerts";

/// A crisis line listed next to the SOS trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotline {
    pub name: &'static str,
    /// Number to call, or texting instructions
    pub contact: &'static str,
    pub available: &'static str,
}

pub const CRISIS_HOTLINES: &[Hotline] = &[
    Hotline {
        name: "National Domestic Violence Hotline",
        contact: "1-800-799-7233",
        available: "24/7",
    },
    Hotline {
        name: "National Sexual Assault Hotline",
        contact: "1-800-656-4673",
        available: "24/7",
    },
    Hotline {
        name: "Crisis Text Line",
        contact: "Text HOME to 741741",
        available: "24/7",
    },
];

/// What to do while help is on the way, in order
pub const SAFETY_STEPS: &[&str] = &[
    "Find a safe location away from immediate danger",
    "Call emergency services if in immediate danger (911)",
    "Contact trusted friends or family members",
    "Reach out to local shelters or safe houses",
    "Document any evidence if it's safe to do so",
    "Seek medical attention if needed",
];
