//! Great-circle distance on a spherical Earth.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for distance calculations, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point given in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Distance to `other` in kilometers.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        great_circle_distance_km(*self, *other)
    }
}

/// Spherical law of cosines.
///
/// The cosine is clamped to `[-1, 1]` before `acos`; rounding can push it
/// just outside that range for near-identical or antipodal points. Identical
/// points return exactly `0.0`.
pub fn great_circle_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    if a == b {
        return 0.0;
    }
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let cosine = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * delta_lon.cos();
    EARTH_RADIUS_KM * cosine.clamp(-1.0, 1.0).acos()
}
