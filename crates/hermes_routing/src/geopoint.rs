use geo::{Bearing, Distance, Haversine};
use serde::{Deserialize, Serialize};

use crate::geometry::normalize_angle;

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        GeoPoint { lat, lng }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn haversine_distance(&self, other: &GeoPoint) -> f64 {
        Haversine.distance(geo::Point::from(self), geo::Point::from(other))
    }

    /// Compass bearing to `other`, clockwise from north, in [0, 360).
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        Haversine
            .bearing(geo::Point::from(self), geo::Point::from(other))
            .rem_euclid(360.0)
    }

    /// Direction to `other` in degrees anticlockwise from map east, in (-180, 180].
    pub fn direction_to(&self, other: &GeoPoint) -> f64 {
        compass_to_direction(self.bearing_to(other))
    }

    /// Linear interpolation between two points; good enough for the short
    /// lines that make up road geometry.
    pub fn interpolate(&self, other: &GeoPoint, fraction: f64) -> GeoPoint {
        GeoPoint::new(
            self.lng + fraction * (other.lng - self.lng),
            self.lat + fraction * (other.lat - self.lat),
        )
    }
}

/// Converts a compass bearing (clockwise from north) to a map direction
/// (anticlockwise from east).
pub fn compass_to_direction(bearing: f64) -> f64 {
    normalize_angle(90.0 - bearing)
}

/// Converts a map direction (anticlockwise from east) to a compass bearing in [0, 360).
pub fn direction_to_compass(direction: f64) -> f64 {
    (90.0 - direction).rem_euclid(360.0)
}

impl From<&GeoPoint> for geo::Point {
    fn from(value: &GeoPoint) -> Self {
        geo::Point::new(value.lng, value.lat)
    }
}

impl From<GeoPoint> for geo::Point {
    fn from(value: GeoPoint) -> Self {
        geo::Point::new(value.lng, value.lat)
    }
}

impl From<geo::Point> for GeoPoint {
    fn from(value: geo::Point) -> Self {
        GeoPoint::new(value.x(), value.y())
    }
}
