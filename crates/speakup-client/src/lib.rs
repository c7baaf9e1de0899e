//! # speakup-client
//!
//! The SOS activation controller and its collaborators: a cancellable
//! countdown, device location acquisition, the HTTP client for the
//! notification dispatch service, and the crisis resources shown with
//! results.

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod location;
pub mod support;
pub mod timer;

pub use config::ClientConfig;
pub use controller::{ActivateOutcome, ControllerSettings, LocationPolicy, SosController, SosOutcome, SosState};
pub use error::{DispatchError, FailureCause, LocationError, SosFailure};
