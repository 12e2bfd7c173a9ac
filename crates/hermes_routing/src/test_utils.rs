use crate::{
    arc_attributes::{ArcAttributes, RoadClass, RoadDirection},
    geometry::compute_geometry_distance,
    geopoint::GeoPoint,
    graph::{NodeId, Road, RoadGraph, RoutableGraph},
    location_index::LocationIndex,
    route::RouteSegment,
    snap::Snap,
    turn::Turn,
};

pub(crate) fn point(lng: f64, lat: f64) -> GeoPoint {
    GeoPoint::new(lng, lat)
}

/// A single one-way primary road running east along the equator for about 556 m.
pub(crate) fn straight_one_way_graph() -> RoadGraph {
    let mut graph = RoadGraph::new();
    let a = graph.add_node(point(0.0, 0.0));
    let b = graph.add_node(point(0.005, 0.0));
    graph.add_road(
        Road::new(
            a,
            b,
            ArcAttributes::new(RoadClass::PrimaryRoad).with_direction(RoadDirection::OneWayForward),
        )
        .named("Long Road"),
    );
    graph
}

pub(crate) struct Crossroads {
    pub graph: RoadGraph,
    pub center: NodeId,
    pub west: NodeId,
    pub east: NodeId,
    pub north: NodeId,
    pub south: NodeId,
}

/// Main Street running west to east, crossed by Cross Street running south to north.
pub(crate) fn crossroads_graph() -> Crossroads {
    let mut graph = RoadGraph::new();
    let center = graph.add_node(point(0.0, 0.0));
    let west = graph.add_node(point(-0.004, 0.0));
    let east = graph.add_node(point(0.004, 0.0));
    let north = graph.add_node(point(0.0, 0.004));
    let south = graph.add_node(point(0.0, -0.004));

    let main = ArcAttributes::new(RoadClass::PrimaryRoad);
    let cross = ArcAttributes::new(RoadClass::ResidentialRoad);
    graph.add_road(Road::new(west, center, main).named("Main Street"));
    graph.add_road(Road::new(center, east, main).named("Main Street"));
    graph.add_road(Road::new(south, center, cross).named("Cross Street"));
    graph.add_road(Road::new(center, north, cross).named("Cross Street"));

    Crossroads {
        graph,
        center,
        west,
        east,
        north,
        south,
    }
}

pub(crate) struct Fork {
    pub graph: RoadGraph,
    pub start: NodeId,
    pub junction: NodeId,
    pub left: NodeId,
    pub right: NodeId,
}

/// A road heading east that splits into two branches ten degrees either side.
pub(crate) fn fork_graph() -> Fork {
    let mut graph = RoadGraph::new();
    let start = graph.add_node(point(-0.004, 0.0));
    let junction = graph.add_node(point(0.0, 0.0));
    let angle = 10.0_f64.to_radians();
    let left = graph.add_node(point(0.004 * angle.cos(), 0.004 * angle.sin()));
    let right = graph.add_node(point(0.004 * angle.cos(), -0.004 * angle.sin()));

    let attributes = ArcAttributes::new(RoadClass::SecondaryRoad);
    graph.add_road(Road::new(start, junction, attributes).named("Forest Road"));
    graph.add_road(Road::new(junction, left, attributes).named("Forest Road"));
    graph.add_road(Road::new(junction, right, attributes).named("Quarry Lane"));

    Fork {
        graph,
        start,
        junction,
        left,
        right,
    }
}

pub(crate) struct TurnOff {
    pub graph: RoadGraph,
    pub start: NodeId,
    pub junction: NodeId,
    pub main_end: NodeId,
    pub slip_end: NodeId,
}

/// A one-way motorway heading east with a slip road leaving 30 degrees to the right.
pub(crate) fn turn_off_graph() -> TurnOff {
    let mut graph = RoadGraph::new();
    let start = graph.add_node(point(-0.004, 0.0));
    let junction = graph.add_node(point(0.0, 0.0));
    let main_end = graph.add_node(point(0.004, 0.0));
    let angle = 30.0_f64.to_radians();
    let slip_end = graph.add_node(point(0.004 * angle.cos(), -0.004 * angle.sin()));

    let motorway = ArcAttributes::new(RoadClass::Motorway).with_direction(RoadDirection::OneWayForward);
    let link = ArcAttributes::new(RoadClass::MotorwayLink).with_direction(RoadDirection::OneWayForward);
    graph.add_road(Road::new(start, junction, motorway).with_reference("M1"));
    graph.add_road(Road::new(junction, main_end, motorway).with_reference("M1"));
    graph.add_road(Road::new(junction, slip_end, link));

    TurnOff {
        graph,
        start,
        junction,
        main_end,
        slip_end,
    }
}

pub(crate) struct Roundabout {
    pub graph: RoadGraph,
    pub south: NodeId,
    pub east: NodeId,
    pub north: NodeId,
    pub west: NodeId,
}

/// A square anticlockwise roundabout with a two-way road leaving each corner.
pub(crate) fn roundabout_graph() -> Roundabout {
    let mut graph = RoadGraph::new();
    let south = graph.add_node(point(0.0, -0.001));
    let east = graph.add_node(point(0.001, 0.0));
    let north = graph.add_node(point(0.0, 0.001));
    let west = graph.add_node(point(-0.001, 0.0));

    let circle = ArcAttributes::new(RoadClass::PrimaryRoad)
        .with_direction(RoadDirection::OneWayForward)
        .with_roundabout(true);
    for (from, to) in [(south, east), (east, north), (north, west), (west, south)] {
        graph.add_road(Road::new(from, to, circle).named("Circus"));
    }

    let arm = ArcAttributes::new(RoadClass::ResidentialRoad);
    let arms = [
        (south, point(0.0, -0.004), "South Road"),
        (east, point(0.004, 0.0), "East Road"),
        (north, point(0.0, 0.004), "North Road"),
        (west, point(-0.004, 0.0), "West Road"),
    ];
    for (node, end, name) in arms {
        let end = graph.add_node(end);
        let road = if node == south {
            Road::new(end, node, arm)
        } else {
            Road::new(node, end, arm)
        };
        graph.add_road(road.named(name));
    }

    Roundabout {
        graph,
        south,
        east,
        north,
        west,
    }
}

/// Nearest snap within 100 m. Panics when there is none.
pub(crate) fn snap_nearest(graph: &impl RoutableGraph, index: &LocationIndex, at: GeoPoint) -> Snap {
    index
        .snap_candidates(graph, &at, 100.0)
        .into_iter()
        .next()
        .expect("no road near test point")
}

pub(crate) fn segment_on(section: usize, points: &[(f64, f64)], time: f64) -> RouteSegment {
    let path: Vec<GeoPoint> = points.iter().map(|&(lng, lat)| point(lng, lat)).collect();
    RouteSegment {
        road_class: RoadClass::PrimaryRoad,
        distance: compute_geometry_distance(&path),
        time,
        path,
        section,
        ..Default::default()
    }
}

/// East along High Street, right onto the toll road Mill Lane, then after a
/// waypoint east again along Church Road.
pub(crate) fn sample_route_segments() -> Vec<RouteSegment> {
    let mut first = segment_on(0, &[(0.0, 0.0), (0.001, 0.0)], 10.0);
    first.name = "High Street".to_string();

    let mut turn_right = segment_on(0, &[(0.001, 0.0), (0.001, -0.001)], 14.0);
    turn_right.name = "Mill Lane".to_string();
    turn_right.reference = "B12".to_string();
    turn_right.road_class = RoadClass::SecondaryRoad;
    turn_right.turn_time = 4.0;
    turn_right.turn = Turn::classify(0.0, -90.0, 2, 1, 0, false, false);
    turn_right.toll = true;

    let mut last = segment_on(1, &[(0.001, -0.001), (0.002, -0.001)], 10.0);
    last.name = "Church Road".to_string();
    last.turn = Turn::classify(-90.0, 0.0, 2, 1, 0, false, false);

    vec![first, turn_right, last]
}
