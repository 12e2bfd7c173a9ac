use crate::{
    error::RouteError,
    graph::{ArcId, RoutableGraph},
    snap::Snap,
    weighting::Weighting,
};

use super::search_control::SearchControl;

/// A traversed arc, or the part of it between two offsets in meters from its start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathArc {
    pub arc_id: ArcId,
    pub start_offset: f64,
    pub end_offset: f64,
}

impl PathArc {
    pub fn new(arc_id: ArcId, start_offset: f64, end_offset: f64) -> Self {
        PathArc {
            arc_id,
            start_offset,
            end_offset,
        }
    }

    pub fn full(graph: &impl RoutableGraph, arc_id: ArcId) -> Self {
        PathArc::new(arc_id, 0.0, graph.arc(arc_id).length())
    }

    pub fn length(&self) -> f64 {
        (self.end_offset - self.start_offset).max(0.0)
    }

    pub fn is_full(&self, graph: &impl RoutableGraph) -> bool {
        self.start_offset <= 0.0 && self.end_offset >= graph.arc(self.arc_id).length()
    }
}

/// The arcs of one leg between consecutive waypoints and their search weight.
#[derive(Debug, Clone, PartialEq)]
pub struct LegPath {
    pub arcs: Vec<PathArc>,
    pub weight: f64,
}

/// Output of a path search: one arc list per leg, in waypoint order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArcSequence {
    pub legs: Vec<Vec<PathArc>>,
}

impl ArcSequence {
    pub fn new(legs: Vec<Vec<PathArc>>) -> Self {
        ArcSequence { legs }
    }

    pub fn is_empty(&self) -> bool {
        self.legs.iter().all(|leg| leg.is_empty())
    }

    pub fn arc_count(&self) -> usize {
        self.legs.iter().map(|leg| leg.len()).sum()
    }
}

/// A shortest-path engine.
///
/// Given snapped waypoints it must return arcs forming a connected path from
/// each waypoint to the next, minimising the summed `Weighting::arc_cost`
/// weight. Arcs that are inadmissible at their position in the leg must not
/// be used. Long searches must poll `control` and give up with
/// `RouteError::Cancelled` once it is cancelled.
pub trait PathSearch {
    /// Best path between two snapped positions, or `None` if they are not connected.
    fn search_leg(
        &self,
        graph: &impl RoutableGraph,
        weighting: &dyn Weighting,
        from: &Snap,
        to: &Snap,
        control: &SearchControl,
    ) -> Result<Option<LegPath>, RouteError>;

    fn search(
        &self,
        graph: &impl RoutableGraph,
        weighting: &dyn Weighting,
        waypoints: &[Snap],
        control: &SearchControl,
    ) -> Result<ArcSequence, RouteError> {
        let mut legs = Vec::with_capacity(waypoints.len().saturating_sub(1));

        for (index, pair) in waypoints.windows(2).enumerate() {
            control.check()?;
            match self.search_leg(graph, weighting, &pair[0], &pair[1], control)? {
                Some(leg) => legs.push(leg.arcs),
                None => {
                    return Err(RouteError::NoRouteConnectivity {
                        from: index,
                        to: index + 1,
                    });
                }
            }
        }

        Ok(ArcSequence::new(legs))
    }
}
