//! A single device position estimate.

use serde::{Deserialize, Serialize};

/// One location fix as delivered by the platform source.
///
/// `is_mocked` is reported by platforms that can detect a mock location
/// provider; sources that cannot tell report `false`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    #[serde(default)]
    pub is_mocked: bool,
}

impl Location {
    /// Create a fix at sea level from coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: 0.0,
            is_mocked: false,
        }
    }

    /// Create a fix with an altitude in meters.
    pub fn with_altitude(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            is_mocked: false,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}
