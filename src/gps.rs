//! Module with GPS specific structures and distance helpers
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A bare coordinate pair in decimal degrees, as the map uses them
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }

    /// Approximate distance to another coordinate, see [`approximate_distance_meters`]
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        approximate_distance_meters(self.lat, self.lng, other.lat, other.lng)
    }
}

/// A single fix reported by the location source
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocationSample {
    /// latitude coordinate in degrees
    latitude: f64,
    /// longitude coordinate in degrees
    longitude: f64,
    /// radius of 95% confidence in meters
    accuracy: f64,
    /// velocity of the device in m/s, the platform may not know it
    speed: Option<f64>,
    /// unix time of the fix in milliseconds
    timestamp: i64,
}

impl LocationSample {
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy: f64,
        speed: Option<f64>,
        timestamp: i64,
    ) -> Self {
        LocationSample {
            latitude,
            longitude,
            accuracy,
            speed,
            timestamp,
        }
    }

    /// Return latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Return longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Return accuracy radius in meters
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Return speed in m/s (if known)
    pub fn speed(&self) -> Option<f64> {
        self.speed
    }

    /// Return fix time as unix milliseconds
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Classes of failure reported by a location source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationErrorKind {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    /// the platform has no location API at all
    Unsupported,
}

/// Error pushed by a location source instead of a fix
#[derive(Clone, Debug, PartialEq)]
pub struct LocationError {
    kind: LocationErrorKind,
    message: String,
}

impl LocationError {
    pub fn new(kind: LocationErrorKind, message: &str) -> Self {
        LocationError {
            kind,
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> LocationErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Numeric code as browsers report it, 0 when the API is missing
    pub fn code(&self) -> u8 {
        match self.kind {
            LocationErrorKind::Unsupported => 0,
            LocationErrorKind::PermissionDenied => 1,
            LocationErrorKind::PositionUnavailable => 2,
            LocationErrorKind::Timeout => 3,
        }
    }

    /// Text shown to a user who asked for their location and didn't get it.
    ///
    /// Mobile browsers tend to hide the location permission deep in their settings so
    /// the hint there is more specific.
    pub fn user_message(&self, mobile: bool) -> String {
        match (self.kind, mobile) {
            (LocationErrorKind::PermissionDenied, true) => format!(
                "Unable to get your location ({}). Make sure location is enabled for your \
                 browser in the system settings and that this site is allowed to use it.",
                self.message
            ),
            (LocationErrorKind::PermissionDenied, false) => format!(
                "Unable to get your location ({}). Allow this site to access your location \
                 and try again.",
                self.message
            ),
            (LocationErrorKind::Unsupported, _) => {
                "Your browser does not support location tracking.".to_string()
            }
            _ => format!(
                "Unable to get your location ({}). Try again in a moment.",
                self.message
            ),
        }
    }
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LocationError {}

#[inline]
pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

#[inline]
pub fn rad_to_deg(radians: f64) -> f64 {
    radians * 180.0 / PI
}

/// Distance between two points using the equirectangular approximation.
///
/// Longitude difference is projected by the cosine of the mean latitude. Good enough
/// for comparing against UI thresholds over tens of kilometers, not for navigation.
pub fn approximate_distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = deg_to_rad(lat1);
    let phi2 = deg_to_rad(lat2);
    let x = deg_to_rad(lon2 - lon1) * ((phi1 + phi2) / 2.0).cos();
    let y = phi2 - phi1;
    (x * x + y * y).sqrt() * EARTH_RADIUS_METERS
}
