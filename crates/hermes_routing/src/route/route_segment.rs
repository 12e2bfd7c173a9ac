use serde::{Deserialize, Serialize};

use crate::{arc_attributes::RoadClass, geopoint::GeoPoint, turn::Turn};

/// A stretch of route along one road, between two announced or announceable junctions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSegment {
    pub road_class: RoadClass,
    /// Known speed limit in km/h; zero when unknown.
    pub max_speed: f64,
    pub name: String,
    #[serde(rename = "ref")]
    pub reference: String,
    /// Meters.
    pub distance: f64,
    /// Seconds, including `turn_time`.
    pub time: f64,
    /// Seconds spent at the junction before the segment.
    pub turn_time: f64,
    pub path: Vec<GeoPoint>,
    /// Index of the leg between two waypoints this segment belongs to.
    pub section: usize,
    /// The junction before the segment.
    pub turn: Turn,
    /// Only usable because it starts or ends the route.
    pub restricted: bool,
    pub toll: bool,
    pub roundabout: bool,
}

impl RouteSegment {
    /// Travel time excluding the junction before the segment.
    pub fn travel_time(&self) -> f64 {
        (self.time - self.turn_time).max(0.0)
    }

    /// Time to reach `distance_along` meters into the segment, junction included.
    pub fn time_at(&self, distance_along: f64) -> f64 {
        if self.distance <= 0.0 {
            return self.time;
        }
        let fraction = (distance_along / self.distance).clamp(0.0, 1.0);
        self.turn_time + self.travel_time() * fraction
    }

    /// Same road as `other` for the purpose of announcing a change of road.
    pub fn same_road(&self, other: &RouteSegment) -> bool {
        self.name == other.name && self.reference == other.reference
    }
}

/// Where a point lies relative to a route.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestSegmentInfo {
    pub segment_index: usize,
    /// Line of the segment path holding the nearest point.
    pub line_index: usize,
    pub nearest_point: GeoPoint,
    pub distance_to_route: f64,
    pub distance_along_route: f64,
    pub distance_along_segment: f64,
    pub time_along_route: f64,
    pub time_along_segment: f64,
    /// Map direction of the route at the nearest point.
    pub direction: f64,
}
