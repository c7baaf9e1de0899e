use thiserror::Error;

/// Reasons a contact cannot be added to the emergency list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("Please enter both name and email")]
    MissingField,

    #[error("Please enter a valid email address")]
    InvalidEmail(String),

    #[error("{0} is already an emergency contact")]
    Duplicate(String),

    #[error("No contact at position {index} (list has {len})")]
    OutOfRange { index: usize, len: usize },
}
