//! Spherical earth-centered coordinates, used to score resolved positions.
//!
//! This is a coarse model: the earth is a sphere of [`MEAN_EARTH_RADIUS`]
//! and [`Point::distance`] is the chord length between two points. Both are
//! good enough for errors of up to tens of kilometers.

/// Distance from the earth core to sea level, in meters
pub const MEAN_EARTH_RADIUS: f64 = 6_370_000.0;

/// Earth-centered, earth-fixed point in meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    /// Creates a point from latitude and longitude in degrees and altitude in meters.
    pub fn from_lat_lng_alt(lat: f64, lng: f64, alt: f64) -> Self {
        let lat = lat.to_radians();
        let lng = lng.to_radians();
        let r = alt + MEAN_EARTH_RADIUS;

        Self {
            x: r * lat.cos() * lng.sin(),
            y: r * lat.sin(),
            z: r * lat.cos() * lng.cos(),
        }
    }

    /// Straight-line distance in meters, ignoring the curvature of the earth.
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }

    /// Returns `(latitude, longitude, altitude)`.
    pub fn to_lat_lng_alt(&self) -> (f64, f64, f64) {
        let r = (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt();
        let lat = (self.y / r).asin().to_degrees();
        let lng = self.x.atan2(self.z).to_degrees();
        (lat, lng, r - MEAN_EARTH_RADIUS)
    }
}
