use crate::{
    arc_attributes::ArcAttributes,
    constants::FORK_ANGLE,
    geometry::{end_direction, normalize_angle, start_direction},
    geopoint::GeoPoint,
    graph::{ArcId, NodeId, RoutableGraph},
    turn::{RoundaboutState, Turn, TurnType},
    weighting::{ArcPosition, Weighting},
};

/// One side of a junction: the arc and the geometry actually travelled on it.
pub(crate) struct JunctionArc<'a> {
    pub arc_id: ArcId,
    pub attributes: ArcAttributes,
    pub path: &'a [GeoPoint],
    pub name: &'a str,
    pub reference: &'a str,
}

/// The junction between two consecutive arcs of a route.
pub(crate) struct Junction {
    pub turn: Turn,
    /// Other exits the traveler could have taken.
    pub alternatives: u32,
    pub node: Option<NodeId>,
}

/// Analyzes the junction from `incoming` to `outgoing`. `node` is the graph
/// node joining them, or `None` when they meet part-way along an arc at a
/// waypoint, where there are no alternatives.
pub(crate) fn analyze_junction(
    graph: &impl RoutableGraph,
    weighting: &dyn Weighting,
    incoming: &JunctionArc,
    outgoing: &JunctionArc,
    node: Option<NodeId>,
) -> Junction {
    let in_direction = end_direction(incoming.path).unwrap_or(0.0);
    let out_direction = start_direction(outgoing.path).unwrap_or(in_direction);
    let chosen_angle = normalize_angle(in_direction - out_direction);

    let in_status = incoming.attributes.road_class.status();
    let out_status = outgoing.attributes.road_class.status();

    let mut left_alternatives = 0;
    let mut right_alternatives = 0;
    let mut is_fork = false;
    let mut continues_on_major_road = false;

    if let Some(node) = node {
        let reverse_incoming = graph.reverse_arc(incoming.arc_id);

        for &arc_id in graph.node_arcs(node) {
            if arc_id == outgoing.arc_id || Some(arc_id) == reverse_incoming {
                continue;
            }
            let attributes = graph.arc(arc_id).attributes();
            if !weighting.can_access(&attributes, ArcPosition::Interior) {
                continue;
            }
            let Some(direction) = start_direction(graph.arc_geometry(arc_id)) else {
                continue;
            };

            let angle = normalize_angle(in_direction - direction);
            if angle < chosen_angle {
                left_alternatives += 1;
            } else {
                right_alternatives += 1;
            }
            if normalize_angle(angle - chosen_angle).abs() <= FORK_ANGLE {
                is_fork = true;
            }
            if attributes.road_class.status() <= in_status {
                continues_on_major_road = true;
            }
        }
    }

    let alternatives = left_alternatives + right_alternatives;
    let turn_off = out_status > in_status && continues_on_major_road;

    let mut turn = Turn::classify(
        in_direction,
        out_direction,
        alternatives + 1,
        left_alternatives,
        right_alternatives,
        is_fork,
        turn_off,
    );
    turn.roundabout_state =
        RoundaboutState::from_flags(incoming.attributes.roundabout, outgoing.attributes.roundabout);

    let same_road = incoming.name == outgoing.name && incoming.reference == outgoing.reference;
    turn.continuation = alternatives == 0
        || (turn.turn_type == TurnType::Ahead
            && same_road
            && !is_fork
            && !turn_off
            && turn.roundabout_state == RoundaboutState::None);

    Junction {
        turn,
        alternatives,
        node,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::RoadGraph,
        profile::{RouteProfile, RouteProfileType},
        test_utils::{crossroads_graph, fork_graph, turn_off_graph},
        weighting::ProfileWeighting,
    };

    fn junction_arc<'a>(graph: &'a RoadGraph, arc_id: ArcId) -> JunctionArc<'a> {
        let arc = graph.arc(arc_id);
        JunctionArc {
            arc_id,
            attributes: arc.attributes(),
            path: graph.arc_geometry(arc_id),
            name: arc.name(),
            reference: arc.reference(),
        }
    }

    fn arc_between(graph: &RoadGraph, from: NodeId, to: NodeId) -> ArcId {
        graph
            .node_arcs(from)
            .iter()
            .copied()
            .find(|&arc_id| graph.arc(arc_id).to_node() == to)
            .unwrap()
    }

    #[test]
    fn test_crossroads_left_turn() {
        let crossroads = crossroads_graph();
        let graph = &crossroads.graph;
        let profile = RouteProfile::new(RouteProfileType::Car);
        let weighting = ProfileWeighting::new(&profile);

        let incoming = arc_between(graph, crossroads.west, crossroads.center);
        let outgoing = arc_between(graph, crossroads.center, crossroads.north);

        let junction = analyze_junction(
            graph,
            &weighting,
            &junction_arc(graph, incoming),
            &junction_arc(graph, outgoing),
            Some(crossroads.center),
        );

        assert_eq!(junction.turn.turn_type, TurnType::Left);
        assert_eq!(junction.alternatives, 2);
        assert_eq!(junction.turn.choices, 3);
        assert_eq!(junction.turn.left_alternatives, 0);
        assert_eq!(junction.turn.right_alternatives, 2);
        assert!(!junction.turn.continuation);
        assert!(!junction.turn.is_fork);
    }

    #[test]
    fn test_fork_becomes_bear() {
        let fork = fork_graph();
        let graph = &fork.graph;
        let profile = RouteProfile::new(RouteProfileType::Car);
        let weighting = ProfileWeighting::new(&profile);

        let incoming = arc_between(graph, fork.start, fork.junction);
        let outgoing = arc_between(graph, fork.junction, fork.left);

        let junction = analyze_junction(
            graph,
            &weighting,
            &junction_arc(graph, incoming),
            &junction_arc(graph, outgoing),
            Some(fork.junction),
        );

        assert!(junction.turn.is_fork);
        assert_eq!(junction.turn.choices, 2);
        assert_eq!(junction.turn.turn_type, TurnType::BearLeft);
    }

    #[test]
    fn test_turn_off_major_road() {
        let turn_off = turn_off_graph();
        let graph = &turn_off.graph;
        let profile = RouteProfile::new(RouteProfileType::Car);
        let weighting = ProfileWeighting::new(&profile);

        let incoming = arc_between(graph, turn_off.start, turn_off.junction);
        let slip = arc_between(graph, turn_off.junction, turn_off.slip_end);
        let main = arc_between(graph, turn_off.junction, turn_off.main_end);

        let junction = analyze_junction(
            graph,
            &weighting,
            &junction_arc(graph, incoming),
            &junction_arc(graph, slip),
            Some(turn_off.junction),
        );
        assert!(junction.turn.turn_off);
        assert!(!junction.turn.is_fork);
        assert_eq!(junction.turn.turn_type, TurnType::BearRight);

        let junction = analyze_junction(
            graph,
            &weighting,
            &junction_arc(graph, incoming),
            &junction_arc(graph, main),
            Some(turn_off.junction),
        );
        assert!(!junction.turn.turn_off);
        assert_eq!(junction.turn.turn_type, TurnType::Ahead);
        assert!(junction.turn.continuation);
    }
}
