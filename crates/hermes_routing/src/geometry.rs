use geo::{Closest, HaversineClosestPoint, Line, LineLocatePoint, Point};

use crate::geopoint::GeoPoint;

const FRACTION_EPSILON: f64 = 1e-9;

/// Normalizes an angle in degrees to (-180, 180].
pub fn normalize_angle(degrees: f64) -> f64 {
    let angle = degrees.rem_euclid(360.0);
    if angle > 180.0 { angle - 360.0 } else { angle }
}

pub fn compute_geometry_distance(geometry: &[GeoPoint]) -> f64 {
    geometry
        .windows(2)
        .map(|line| line[0].haversine_distance(&line[1]))
        .sum()
}

/// Removes consecutive coincident points.
pub fn dedup_points(points: &mut Vec<GeoPoint>) {
    points.dedup();
}

/// Direction of the first non-degenerate line of the geometry.
pub fn start_direction(geometry: &[GeoPoint]) -> Option<f64> {
    geometry
        .windows(2)
        .find(|line| line[0] != line[1])
        .map(|line| line[0].direction_to(&line[1]))
}

/// Direction of the last non-degenerate line of the geometry.
pub fn end_direction(geometry: &[GeoPoint]) -> Option<f64> {
    geometry
        .windows(2)
        .rev()
        .find(|line| line[0] != line[1])
        .map(|line| line[0].direction_to(&line[1]))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylinePosition {
    /// Index of the line (pair of consecutive points) holding the position.
    pub line_index: usize,
    pub point: GeoPoint,
    /// Distance from the queried point to `point`.
    pub distance: f64,
    /// Distance from the start of the polyline to `point`.
    pub distance_along: f64,
    /// Map direction of the line holding the position.
    pub direction: f64,
}

/// Point of the line closest to `point` along great circles, with its
/// fraction along the line.
fn closest_on_line(line: &[GeoPoint], point: &GeoPoint) -> (GeoPoint, f64) {
    let segment = Line::new(Point::from(line[0]), Point::from(line[1]));
    let closest = match segment.haversine_closest_point(&Point::from(point)) {
        Closest::Intersection(closest) | Closest::SinglePoint(closest) => closest,
        Closest::Indeterminate => segment.start_point(),
    };
    let fraction = segment.line_locate_point(&closest).unwrap_or(0.0);

    (closest.into(), fraction)
}

/// Point at `fraction` of the line, returning the exact end points at the extremes.
fn point_on_line(line: &[GeoPoint], fraction: f64) -> GeoPoint {
    if fraction <= FRACTION_EPSILON {
        line[0]
    } else if fraction >= 1.0 - FRACTION_EPSILON {
        line[1]
    } else {
        line[0].interpolate(&line[1], fraction)
    }
}

/// Projects `point` onto every line of the polyline, yielding one position per line.
pub fn project_on_lines<'a>(
    geometry: &'a [GeoPoint],
    point: &'a GeoPoint,
) -> impl Iterator<Item = PolylinePosition> + 'a {
    let mut distance_along = 0.0;
    geometry.windows(2).enumerate().map(move |(line_index, line)| {
        let (closest, fraction) = closest_on_line(line, point);
        let line_length = line[0].haversine_distance(&line[1]);

        let position = PolylinePosition {
            line_index,
            point: closest,
            distance: point.haversine_distance(&closest),
            distance_along: distance_along + fraction * line_length,
            direction: line[0].direction_to(&line[1]),
        };

        distance_along += line_length;
        position
    })
}

/// Nearest position on the polyline to `point`.
pub fn nearest_point_on_polyline(geometry: &[GeoPoint], point: &GeoPoint) -> Option<PolylinePosition> {
    if geometry.len() == 1 {
        return Some(PolylinePosition {
            line_index: 0,
            point: geometry[0],
            distance: point.haversine_distance(&geometry[0]),
            distance_along: 0.0,
            direction: 0.0,
        });
    }

    project_on_lines(geometry, point).min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Position at `distance` meters along the polyline, clamped to its ends.
pub fn point_along_polyline(geometry: &[GeoPoint], distance: f64) -> Option<PolylinePosition> {
    let first = geometry.first()?;
    let mut travelled = 0.0;

    for (line_index, line) in geometry.windows(2).enumerate() {
        let line_length = line[0].haversine_distance(&line[1]);
        let is_last = line_index + 2 == geometry.len();

        if travelled + line_length >= distance || is_last {
            let fraction = if line_length > 0.0 {
                ((distance - travelled) / line_length).clamp(0.0, 1.0)
            } else {
                0.0
            };

            return Some(PolylinePosition {
                line_index,
                point: point_on_line(line, fraction),
                distance: 0.0,
                distance_along: travelled + fraction * line_length,
                direction: line[0].direction_to(&line[1]),
            });
        }

        travelled += line_length;
    }

    Some(PolylinePosition {
        line_index: 0,
        point: *first,
        distance: 0.0,
        distance_along: 0.0,
        direction: 0.0,
    })
}

/// The part of the polyline between `start` and `end` meters from its start.
pub fn slice_polyline(geometry: &[GeoPoint], start: f64, end: f64) -> Vec<GeoPoint> {
    let (Some(first), Some(last)) = (
        point_along_polyline(geometry, start),
        point_along_polyline(geometry, end),
    ) else {
        return Vec::new();
    };

    let mut points = Vec::with_capacity(last.line_index - first.line_index.min(last.line_index) + 2);
    points.push(first.point);
    if last.line_index > first.line_index {
        points.extend_from_slice(&geometry[first.line_index + 1..=last.line_index]);
    }
    points.push(last.point);
    dedup_points(&mut points);

    points
}
