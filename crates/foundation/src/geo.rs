use std::fmt;

use serde::{Deserialize, Serialize};

pub const LAT_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LNG_RANGE: (f64, f64) = (-180.0, 180.0);

/// Geographic position in degrees, ordered `[lng, lat]` on the wire like
/// every web map API.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GeoError {
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::LatitudeOutOfRange(v) => write!(f, "latitude {v} outside [-90, 90]"),
            GeoError::LongitudeOutOfRange(v) => write!(f, "longitude {v} outside [-180, 180]"),
        }
    }
}

impl std::error::Error for GeoError {}

impl LngLat {
    /// Unchecked constructor; use [`LngLat::try_new`] for untrusted input.
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn try_new(lng: f64, lat: f64) -> Result<Self, GeoError> {
        // NaN fails both range checks.
        if !(LAT_RANGE.0..=LAT_RANGE.1).contains(&lat) {
            return Err(GeoError::LatitudeOutOfRange(lat));
        }
        if !(LNG_RANGE.0..=LNG_RANGE.1).contains(&lng) {
            return Err(GeoError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lng, lat })
    }

    pub fn from_array(pair: [f64; 2]) -> Result<Self, GeoError> {
        Self::try_new(pair[0], pair[1])
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn approx_eq(self, other: LngLat, eps: f64) -> bool {
        (self.lng - other.lng).abs() <= eps && (self.lat - other.lat).abs() <= eps
    }
}

/// Camera pose as far as the widget cares about it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: LngLat,
    pub zoom: f64,
}

impl CameraState {
    pub const fn new(center: LngLat, zoom: f64) -> Self {
        Self { center, zoom }
    }

    pub fn approx_eq(&self, other: &CameraState, eps: f64) -> bool {
        self.center.approx_eq(other.center, eps) && (self.zoom - other.zoom).abs() <= eps
    }
}

/// Animated camera transition request.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlyTo {
    pub center: LngLat,
    pub zoom: f64,
    pub duration_ms: u32,
}

impl FlyTo {
    pub fn new(center: LngLat, zoom: f64, duration_ms: u32) -> Self {
        Self {
            center,
            zoom,
            duration_ms,
        }
    }

    pub fn target(&self) -> CameraState {
        CameraState::new(self.center, self.zoom)
    }
}
