use crate::{
    geometry::{PolylinePosition, normalize_angle},
    geopoint::GeoPoint,
    graph::{ArcId, RoutableGraph},
};

/// A position snapped onto an arc.
#[derive(Debug, Clone, PartialEq)]
pub struct Snap {
    pub arc_id: ArcId,
    pub coordinates: GeoPoint,
    /// Distance from the queried point to `coordinates`.
    pub distance: f64,
    /// Distance from the start of the arc to `coordinates`.
    pub offset: f64,
    /// Map direction of the arc at the snapped position.
    pub direction: f64,
    pub line_index: usize,
    /// Leave or reach the position only in the direction of `arc_id`.
    pub fixed_direction: bool,
}

impl Snap {
    pub fn new(arc_id: ArcId, position: PolylinePosition) -> Self {
        Snap {
            arc_id,
            coordinates: position.point,
            distance: position.distance,
            offset: position.distance_along,
            direction: position.direction,
            line_index: position.line_index,
            fixed_direction: false,
        }
    }

    /// The same position seen from the arc running the other way.
    pub fn reversed(&self, graph: &impl RoutableGraph) -> Option<Snap> {
        let reverse_id = graph.reverse_arc(self.arc_id)?;
        let line_count = graph.arc_geometry(self.arc_id).len().saturating_sub(1);

        Some(Snap {
            arc_id: reverse_id,
            coordinates: self.coordinates,
            distance: self.distance,
            offset: (graph.arc(self.arc_id).length() - self.offset).max(0.0),
            direction: normalize_angle(self.direction + 180.0),
            line_index: line_count.saturating_sub(1).saturating_sub(self.line_index),
            fixed_direction: self.fixed_direction,
        })
    }

    /// Positions on the arcs the route may leave from or arrive along:
    /// the snapped arc and, unless the direction is fixed, its reverse.
    pub fn directed(&self, graph: &impl RoutableGraph) -> Vec<Snap> {
        let mut snaps = vec![self.clone()];
        if !self.fixed_direction {
            snaps.extend(self.reversed(graph));
        }
        snaps
    }
}
