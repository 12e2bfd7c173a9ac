use tracing::debug;

use crate::{
    arc_attributes::ArcAttributes,
    error::RouteError,
    geometry::{dedup_points, slice_polyline},
    geopoint::GeoPoint,
    graph::RoutableGraph,
    profile::RouteProfile,
    routing::path_search::{ArcSequence, PathArc},
    turn::{RoundaboutState, Turn, TurnType},
    weighting::{ArcPosition, ProfileWeighting, Weighting},
};

use super::{
    junction::{JunctionArc, analyze_junction},
    route::Route,
    route_segment::RouteSegment,
};

const OFFSET_EPSILON: f64 = 1e-6;

struct AssembledArc<'g> {
    arc: PathArc,
    attributes: ArcAttributes,
    restricted: bool,
    path: Vec<GeoPoint>,
    name: &'g str,
    reference: &'g str,
}

impl AssembledArc<'_> {
    fn junction_arc(&self) -> JunctionArc<'_> {
        JunctionArc {
            arc_id: self.arc.arc_id,
            attributes: self.attributes,
            path: &self.path,
            name: self.name,
            reference: self.reference,
        }
    }

    fn same_segment_as(&self, segment: &RouteSegment) -> bool {
        self.name == segment.name
            && self.reference == segment.reference
            && self.attributes.road_class == segment.road_class
            && self.attributes.known_speed_limit().unwrap_or(0.0) == segment.max_speed
            && self.attributes.toll == segment.toll
            && self.attributes.roundabout == segment.roundabout
            && self.restricted == segment.restricted
    }
}

/// Builds a route from the arcs found by a path search. Each leg becomes a
/// section; consecutive arcs of the same road with no other way to go are
/// joined into one segment.
pub fn assemble_route(
    graph: &impl RoutableGraph,
    profile: &RouteProfile,
    sequence: &ArcSequence,
) -> Result<Route, RouteError> {
    if sequence.is_empty() {
        return Ok(Route::empty(profile.clone()));
    }

    let weighting = ProfileWeighting::new(profile);
    let mut segments: Vec<RouteSegment> = Vec::new();
    let mut previous: Option<AssembledArc> = None;

    for (section, leg) in sequence.legs.iter().enumerate() {
        for (index, path_arc) in leg.iter().enumerate() {
            let position = ArcPosition::new(index == 0, index + 1 == leg.len());
            if path_arc.length() <= 0.0 {
                continue;
            }

            let arc = graph.arc(path_arc.arc_id);
            let attributes = arc.attributes();
            let cost = weighting.arc_cost(&attributes, path_arc.length(), position);
            if !cost.admissible {
                return Err(RouteError::InvalidInput(format!(
                    "arc {} cannot be used by profile {}",
                    path_arc.arc_id, profile.name
                )));
            }

            let geometry = graph.arc_geometry(path_arc.arc_id);
            let path = if path_arc.is_full(graph) {
                geometry.to_vec()
            } else {
                slice_polyline(geometry, path_arc.start_offset, path_arc.end_offset)
            };
            if path.len() < 2 {
                continue;
            }

            let current = AssembledArc {
                arc: *path_arc,
                attributes,
                restricted: cost.restricted,
                path,
                name: arc.name(),
                reference: arc.reference(),
            };

            let (turn, junction_time, alternatives) = match &previous {
                Some(previous) => {
                    let previous_arc = graph.arc(previous.arc.arc_id);
                    let at_node = previous.arc.end_offset >= previous_arc.length() - OFFSET_EPSILON
                        && path_arc.start_offset <= OFFSET_EPSILON
                        && previous_arc.to_node() == arc.from_node();
                    let node = at_node.then(|| arc.from_node());

                    let junction = analyze_junction(
                        graph,
                        &weighting,
                        &previous.junction_arc(),
                        &current.junction_arc(),
                        node,
                    );
                    let traffic_light = junction.node.is_some_and(|node| graph.has_traffic_light(node));
                    let junction_time =
                        weighting.junction_time(&junction.turn, attributes.drive_on_left(), traffic_light);

                    (junction.turn, junction_time, junction.alternatives)
                }
                None => (Turn::default(), 0.0, 0),
            };

            let joins_last = segments.last().is_some_and(|last| {
                last.section == section
                    && alternatives == 0
                    && turn.turn_type != TurnType::Around
                    && current.same_segment_as(last)
            });

            match segments.last_mut() {
                Some(last) if joins_last => {
                    last.distance += path_arc.length();
                    last.time += cost.time + junction_time;
                    last.path.extend_from_slice(&current.path);
                    dedup_points(&mut last.path);
                }
                _ => segments.push(RouteSegment {
                    road_class: attributes.road_class,
                    max_speed: attributes.known_speed_limit().unwrap_or(0.0),
                    name: current.name.to_string(),
                    reference: current.reference.to_string(),
                    distance: path_arc.length(),
                    time: cost.time + junction_time,
                    turn_time: junction_time,
                    path: current.path.clone(),
                    section,
                    turn,
                    restricted: current.restricted,
                    toll: attributes.toll,
                    roundabout: attributes.roundabout,
                }),
            }

            previous = Some(current);
        }
    }

    if let Some(first) = segments.first_mut() {
        first.time -= first.turn_time;
        first.turn_time = 0.0;
        first.turn = Turn::default();
    }
    number_roundabout_exits(&mut segments);

    debug!(segments = segments.len(), "Assembled route");

    Route::from_segments(segments, profile.clone())
}

/// Sets the exit to take on the turns entering and leaving each roundabout,
/// counting the exits passed at the junctions in between.
fn number_roundabout_exits(segments: &mut [RouteSegment]) {
    let mut enter_index = None;
    let mut passed_exits = 0;

    for index in 0..segments.len() {
        let turn = &segments[index].turn;
        match turn.roundabout_state {
            RoundaboutState::Enter => {
                enter_index = Some(index);
                passed_exits = 0;
            }
            RoundaboutState::Continue => {
                passed_exits += turn.left_alternatives + turn.right_alternatives;
            }
            RoundaboutState::Exit => {
                let exit_number = passed_exits + 1;
                segments[index].turn.exit_number = exit_number;
                if let Some(enter_index) = enter_index.take() {
                    segments[enter_index].turn.exit_number = exit_number;
                }
                passed_exits = 0;
            }
            RoundaboutState::None => {}
        }
    }
}
