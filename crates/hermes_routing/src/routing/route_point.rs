use serde::{Deserialize, Serialize};

use crate::{geopoint::GeoPoint, location_match::LocationMatchParam};

/// A waypoint with an optional heading and its own snapping accuracy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoutePoint {
    pub point: GeoPoint,
    /// Compass heading in degrees clockwise from north.
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub match_param: LocationMatchParam,
}

impl RoutePoint {
    pub fn new(point: GeoPoint) -> Self {
        RoutePoint {
            point,
            ..Default::default()
        }
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_match_param(mut self, match_param: LocationMatchParam) -> Self {
        self.match_param = match_param;
        self
    }
}

/// The ordered waypoints of a route request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteCoordSet {
    pub points: Vec<RoutePoint>,
}

impl RouteCoordSet {
    pub fn new(points: Vec<RoutePoint>) -> Self {
        RouteCoordSet { points }
    }

    pub fn from_points(points: impl IntoIterator<Item = GeoPoint>) -> Self {
        RouteCoordSet {
            points: points.into_iter().map(RoutePoint::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn push(&mut self, point: RoutePoint) {
        self.points.push(point);
    }
}
