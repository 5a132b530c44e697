//! Geographic value types and great-circle distance.
//!
//! Distance uses the spherical law of cosines. The cosine argument is clamped
//! to [-1, 1] before `acos` so near-identical points never produce NaN from
//! floating-point overshoot.

/// Statute miles per arc minute along a great circle.
const MILES_PER_ARC_MINUTE: f64 = 1.1515;
const KM_PER_MILE: f64 = 1.609_344;

/// A latitude/longitude pair in degrees.
///
/// Latitude is expected in [-90, 90] and longitude in [-180, 180]; upstream
/// data is not validated, but the distance math assumes these ranges.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance between two points in kilometers.
///
/// Identical points return exactly `0.0` without touching `acos`.
#[must_use]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    if a == b {
        return 0.0;
    }

    let theta = (a.lon - b.lon).to_radians();
    let cosine = a.lat.to_radians().sin() * b.lat.to_radians().sin()
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * theta.cos();
    let arc = cosine.clamp(-1.0, 1.0).acos();

    let miles = arc.to_degrees() * 60.0 * MILES_PER_ARC_MINUTE;
    miles * KM_PER_MILE
}
