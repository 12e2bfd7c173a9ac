use serde::{Deserialize, Serialize};

use crate::{
    constants::{BACKTRACK_TOLERANCE, MAX_ROUTE_DISTANCE, MAX_ROUTE_TIME},
    error::RouteError,
    geometry::{dedup_points, point_along_polyline, project_on_lines},
    geopoint::GeoPoint,
    location_match::{LocationMatchParam, MatchCandidate, best_match},
    profile::RouteProfile,
    turn::Turn,
};

use super::route_segment::{NearestSegmentInfo, RouteSegment};

/// An assembled route. Never mutated once handed out; appending builds the totals afresh.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Route {
    segments: Vec<RouteSegment>,
    distance: f64,
    time: f64,
    path: Vec<GeoPoint>,
    profile: RouteProfile,
}

impl Route {
    pub fn empty(profile: RouteProfile) -> Self {
        Route {
            profile,
            ..Default::default()
        }
    }

    pub fn from_segments(segments: Vec<RouteSegment>, profile: RouteProfile) -> Result<Route, RouteError> {
        let distance: f64 = segments.iter().map(|segment| segment.distance).sum();
        let time: f64 = segments.iter().map(|segment| segment.time).sum();

        if !distance.is_finite() || !time.is_finite() || distance > MAX_ROUTE_DISTANCE || time > MAX_ROUTE_TIME {
            return Err(RouteError::Overflow);
        }

        let mut path: Vec<GeoPoint> = Vec::with_capacity(segments.iter().map(|s| s.path.len()).sum());
        for segment in &segments {
            path.extend_from_slice(&segment.path);
        }
        dedup_points(&mut path);

        Ok(Route {
            segments,
            distance,
            time,
            path,
            profile,
        })
    }

    pub fn segments(&self) -> &[RouteSegment] {
        &self.segments
    }

    /// Total distance in meters.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Total time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn path(&self) -> &[GeoPoint] {
        &self.path
    }

    pub fn profile(&self) -> &RouteProfile {
        &self.profile
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn section_count(&self) -> usize {
        self.segments.last().map_or(0, |segment| segment.section + 1)
    }

    pub fn start(&self) -> Option<GeoPoint> {
        self.path.first().copied()
    }

    pub fn end(&self) -> Option<GeoPoint> {
        self.path.last().copied()
    }

    /// Appends `other`, numbering its sections after this route's.
    pub fn append(&mut self, other: Route) -> Result<(), RouteError> {
        let section_offset = self.section_count();

        let mut segments = self.segments.clone();
        segments.extend(other.segments.into_iter().map(|mut segment| {
            segment.section += section_offset;
            segment
        }));

        *self = Route::from_segments(segments, self.profile.clone())?;
        Ok(())
    }

    /// Distance and time from the route start to the start of each segment.
    fn segment_offsets(&self) -> impl Iterator<Item = (usize, &RouteSegment, f64, f64)> {
        self.segments.iter().enumerate().scan((0.0, 0.0), |(distance, time), (index, segment)| {
            let offsets = (index, segment, *distance, *time);
            *distance += segment.distance;
            *time += segment.time;
            Some(offsets)
        })
    }

    /// Projections of `point` onto every line of the route from `min_section`
    /// on, leaving out positions more than a few meters behind `previous_distance`.
    fn project(&self, point: &GeoPoint, min_section: usize, previous_distance: Option<f64>) -> Vec<NearestSegmentInfo> {
        let mut positions = Vec::new();

        for (segment_index, segment, distance_before, time_before) in self.segment_offsets() {
            if segment.section < min_section {
                continue;
            }

            for position in project_on_lines(&segment.path, point) {
                let distance_along_segment = position.distance_along.min(segment.distance);
                let distance_along_route = distance_before + distance_along_segment;
                if previous_distance.is_some_and(|previous| distance_along_route < previous - BACKTRACK_TOLERANCE) {
                    continue;
                }

                let time_along_segment = segment.time_at(distance_along_segment);
                positions.push(NearestSegmentInfo {
                    segment_index,
                    line_index: position.line_index,
                    nearest_point: position.point,
                    distance_to_route: position.distance,
                    distance_along_route,
                    distance_along_segment,
                    time_along_route: time_before + time_along_segment,
                    time_along_segment,
                    direction: position.direction,
                });
            }
        }

        positions
    }

    pub fn nearest_segment(
        &self,
        point: &GeoPoint,
        min_section: usize,
        previous_distance: Option<f64>,
    ) -> Option<NearestSegmentInfo> {
        self.project(point, min_section, previous_distance)
            .into_iter()
            .min_by(|a, b| a.distance_to_route.total_cmp(&b.distance_to_route))
    }

    /// Matches a position onto the route, taking its heading (a map direction) into account.
    pub fn match_location(
        &self,
        point: &GeoPoint,
        heading: Option<f64>,
        params: &LocationMatchParam,
        min_section: usize,
        previous_distance: Option<f64>,
    ) -> Option<NearestSegmentInfo> {
        let candidates = self
            .project(point, min_section, previous_distance)
            .into_iter()
            .map(|info| MatchCandidate {
                distance: info.distance_to_route,
                direction: info.direction,
                item: info,
            });

        best_match(candidates, heading, params).map(|candidate| candidate.item)
    }

    /// Point `distance` meters along the route, clamped to its ends.
    pub fn point_at_distance(&self, distance: f64) -> Option<GeoPoint> {
        let last = self.segments.last()?;

        for (_, segment, distance_before, _) in self.segment_offsets() {
            if distance <= distance_before + segment.distance {
                return point_along_polyline(&segment.path, distance - distance_before).map(|p| p.point);
            }
        }

        last.path.last().copied()
    }

    /// Point reached `time` seconds after starting, clamped to the route ends.
    pub fn point_at_time(&self, time: f64) -> Option<GeoPoint> {
        let last = self.segments.last()?;

        for (_, segment, _, time_before) in self.segment_offsets() {
            if time <= time_before + segment.time {
                let travel_time = segment.travel_time();
                let elapsed = (time - time_before - segment.turn_time).max(0.0);
                let distance_along = if travel_time > 0.0 {
                    segment.distance * (elapsed / travel_time).min(1.0)
                } else {
                    0.0
                };
                return point_along_polyline(&segment.path, distance_along).map(|p| p.point);
            }
        }

        last.path.last().copied()
    }

    /// The route without the segments only allowed because they start or end it.
    pub fn copy_without_restricted_segments(&self) -> Result<Route, RouteError> {
        let mut segments: Vec<RouteSegment> = self
            .segments
            .iter()
            .filter(|segment| !segment.restricted)
            .cloned()
            .collect();

        if let Some(first) = segments.first_mut() {
            first.time -= first.turn_time;
            first.turn_time = 0.0;
            first.turn = Turn::default();
        }

        Route::from_segments(segments, self.profile.clone())
    }

    pub fn toll_road_distance(&self) -> f64 {
        self.segments
            .iter()
            .filter(|segment| segment.toll)
            .map(|segment| segment.distance)
            .sum()
    }
}
