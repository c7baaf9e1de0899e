//! Device coordinates and the map link derived from them.

use serde::{Deserialize, Serialize};

use crate::constants::MAPS_BASE_URL;

/// A latitude/longitude fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
}

impl GeoLocation {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Map link for this fix. See [`maps_url`].
    pub fn maps_url(&self) -> String {
        maps_url(self.lat, self.lng)
    }

    /// Coordinates rounded to six decimals, for display.
    pub fn display_coordinates(&self) -> String {
        format!("{:.6}, {:.6}", self.lat, self.lng)
    }

    /// Both values are finite and within the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Build `https://www.google.com/maps?q=<lat>,<lng>`.
///
/// Coordinates use the shortest decimal form that round-trips, so `40.0`
/// renders as `40` and `-73.9857` stays `-73.9857`.
pub fn maps_url(lat: f64, lng: f64) -> String {
    format!("{MAPS_BASE_URL}?q={lat},{lng}")
}
