//! # speakup-shared
//!
//! Types and helpers shared by the SOS controller (client) and the
//! notification dispatch service (server): the wire format of an SOS
//! request/response, contact validation, map-link derivation and the
//! alert timestamp format.

pub mod constants;
pub mod error;
pub mod location;
pub mod time;
pub mod types;

pub use error::ContactError;
pub use location::{maps_url, GeoLocation};
pub use types::*;
