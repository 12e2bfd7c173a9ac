use fxhash::FxHashSet;
use rstar::primitives::{GeomWithData, Line};
use rstar::{RStarInsertionStrategy, RTree, RTreeParams};
use tracing::info;

use crate::{
    geometry::nearest_point_on_polyline,
    geopoint::GeoPoint,
    graph::{ArcId, RoutableGraph},
    snap::Snap,
};

const METERS_PER_DEGREE: f64 = 111_320.0;

type IndexedLine = GeomWithData<Line<[f64; 2]>, ArcId>;

struct LocationIndexTreeParams;

impl RTreeParams for LocationIndexTreeParams {
    type DefaultInsertionStrategy = RStarInsertionStrategy;

    const MAX_SIZE: usize = 64;
    const MIN_SIZE: usize = 28;
    const REINSERTION_COUNT: usize = 5;
}

/// Spatial index over the lines of every road, one direction per road.
pub struct LocationIndex {
    tree: RTree<IndexedLine, LocationIndexTreeParams>,
}

impl LocationIndex {
    pub fn build_from_graph(graph: &impl RoutableGraph) -> LocationIndex {
        let lines: Vec<IndexedLine> = (0..graph.arc_count())
            .filter(|&arc_id| graph.reverse_arc(arc_id).is_none_or(|reverse| reverse > arc_id))
            .flat_map(|arc_id| {
                graph.arc_geometry(arc_id).windows(2).map(move |line| {
                    IndexedLine::new(
                        Line::new([line[0].lng, line[0].lat], [line[1].lng, line[1].lat]),
                        arc_id,
                    )
                })
            })
            .collect();

        let tree = RTree::bulk_load_with_params(lines);
        info!(lines = tree.size(), "Built location index");

        LocationIndex { tree }
    }

    /// Snaps `point` onto every road within `max_distance` meters, in both
    /// directions of travel where the road has two.
    pub fn snap_candidates(
        &self,
        graph: &impl RoutableGraph,
        point: &GeoPoint,
        max_distance: f64,
    ) -> Vec<Snap> {
        // Degrees of longitude shrink towards the poles, so widen the search to match.
        let lat_scale = point.lat.to_radians().cos().abs().max(0.01);
        let radius = max_distance / (METERS_PER_DEGREE * lat_scale);

        let arcs: FxHashSet<ArcId> = self
            .tree
            .locate_within_distance([point.lng, point.lat], radius * radius)
            .map(|line| line.data)
            .collect();

        let mut candidates = Vec::with_capacity(arcs.len() * 2);
        for arc_id in arcs {
            let Some(position) = nearest_point_on_polyline(graph.arc_geometry(arc_id), point) else {
                continue;
            };
            if position.distance > max_distance {
                continue;
            }

            let snap = Snap::new(arc_id, position);
            candidates.extend(snap.reversed(graph));
            candidates.push(snap);
        }

        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.arc_id.cmp(&b.arc_id)));
        candidates
    }
}
