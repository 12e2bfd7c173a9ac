use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    arc_attributes::{AccessFlags, ArcAttributes, RoadDirection},
    error::GraphError,
    geometry::compute_geometry_distance,
    geopoint::GeoPoint,
};

pub type NodeId = usize;
pub type ArcId = usize;

/// One directed traversable arc. The attributes stay packed at the graph boundary.
#[derive(Debug, Clone)]
pub struct GraphArc {
    from: NodeId,
    to: NodeId,
    attributes: u32,
    length: f64,
    name: String,
    reference: String,
}

impl GraphArc {
    pub fn from_node(&self) -> NodeId {
        self.from
    }

    pub fn to_node(&self) -> NodeId {
        self.to
    }

    pub fn packed_attributes(&self) -> u32 {
        self.attributes
    }

    pub fn attributes(&self) -> ArcAttributes {
        ArcAttributes::decode(self.attributes)
    }

    /// Length in meters.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// The routable graph provider.
pub trait RoutableGraph {
    fn node_count(&self) -> usize;
    fn arc_count(&self) -> usize;

    /// Arcs leaving `node`.
    fn node_arcs(&self, node: NodeId) -> &[ArcId];
    fn arc(&self, arc: ArcId) -> &GraphArc;
    /// Geometry of the arc in its direction of travel.
    fn arc_geometry(&self, arc: ArcId) -> &[GeoPoint];
    /// The arc covering the same road in the opposite direction.
    fn reverse_arc(&self, arc: ArcId) -> Option<ArcId>;
    fn node_point(&self, node: NodeId) -> GeoPoint;
    fn has_traffic_light(&self, node: NodeId) -> bool;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoadNode {
    pub point: GeoPoint,
    #[serde(default)]
    pub traffic_light: bool,
}

/// A road between two nodes, added to the graph as a pair of arcs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Road {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default)]
    pub attributes: ArcAttributes,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "ref")]
    pub reference: String,
    /// Intermediate points between the two nodes.
    #[serde(default)]
    pub points: Vec<GeoPoint>,
}

impl Road {
    pub fn new(from: NodeId, to: NodeId, attributes: ArcAttributes) -> Self {
        Road {
            from,
            to,
            attributes,
            ..Default::default()
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_reference(mut self, reference: &str) -> Self {
        self.reference = reference.to_string();
        self
    }

    pub fn through(mut self, points: Vec<GeoPoint>) -> Self {
        self.points = points;
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GraphFile {
    nodes: Vec<RoadNode>,
    roads: Vec<Road>,
}

/// In-memory road graph with Vec-based adjacency.
#[derive(Debug, Default)]
pub struct RoadGraph {
    nodes: Vec<RoadNode>,
    arcs: Vec<GraphArc>,
    geometry: Vec<Vec<GeoPoint>>,
    adjacency_list: Vec<Vec<ArcId>>,
    reverse: Vec<Option<ArcId>>,
}

impl RoadGraph {
    pub fn new() -> Self {
        RoadGraph::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<RoadGraph, GraphError> {
        let file = File::open(path)?;
        let graph_file: GraphFile = serde_json::from_reader(BufReader::new(file))?;
        let graph = RoadGraph::from_parts(graph_file.nodes, graph_file.roads)?;

        info!(
            nodes = graph.node_count(),
            arcs = graph.arc_count(),
            "Loaded road graph"
        );

        Ok(graph)
    }

    pub fn from_json(json: &str) -> Result<RoadGraph, GraphError> {
        let graph_file: GraphFile = serde_json::from_str(json)?;
        RoadGraph::from_parts(graph_file.nodes, graph_file.roads)
    }

    pub fn from_parts(nodes: Vec<RoadNode>, roads: Vec<Road>) -> Result<RoadGraph, GraphError> {
        let mut graph = RoadGraph::new();
        for node in nodes {
            let id = graph.add_node(node.point);
            graph.set_traffic_light(id, node.traffic_light);
        }

        for (index, road) in roads.into_iter().enumerate() {
            for node in [road.from, road.to] {
                if node >= graph.node_count() {
                    return Err(GraphError::UnknownNode { road: index, node });
                }
            }
            if road.from == road.to && road.points.is_empty() {
                return Err(GraphError::DegenerateRoad(index));
            }
            graph.add_road(road);
        }

        Ok(graph)
    }

    pub fn add_node(&mut self, point: GeoPoint) -> NodeId {
        self.nodes.push(RoadNode {
            point,
            traffic_light: false,
        });
        self.adjacency_list.push(Vec::new());
        self.nodes.len() - 1
    }

    pub fn set_traffic_light(&mut self, node: NodeId, traffic_light: bool) {
        self.nodes[node].traffic_light = traffic_light;
    }

    /// Adds both directions of the road. The direction against a one-way road
    /// carries the wrong-way restriction so that only travellers ignoring
    /// one-way rules may use it.
    pub fn add_road(&mut self, road: Road) -> (ArcId, ArcId) {
        let mut geometry = Vec::with_capacity(road.points.len() + 2);
        geometry.push(self.nodes[road.from].point);
        geometry.extend_from_slice(&road.points);
        geometry.push(self.nodes[road.to].point);

        let mut forward = road.attributes;
        let mut backward = road
            .attributes
            .with_direction(road.attributes.direction.reversed())
            .with_gradient(road.attributes.gradient.reversed());

        match road.attributes.direction {
            RoadDirection::OneWayForward => backward.restrictions |= AccessFlags::WRONG_WAY,
            RoadDirection::OneWayBackward => forward.restrictions |= AccessFlags::WRONG_WAY,
            _ => {}
        }

        let reversed_geometry: Vec<GeoPoint> = geometry.iter().rev().copied().collect();
        let forward_id = self.push_arc(road.from, road.to, forward, &road.name, &road.reference, geometry);
        let backward_id = self.push_arc(
            road.to,
            road.from,
            backward,
            &road.name,
            &road.reference,
            reversed_geometry,
        );

        self.reverse[forward_id] = Some(backward_id);
        self.reverse[backward_id] = Some(forward_id);

        (forward_id, backward_id)
    }

    fn push_arc(
        &mut self,
        from: NodeId,
        to: NodeId,
        attributes: ArcAttributes,
        name: &str,
        reference: &str,
        geometry: Vec<GeoPoint>,
    ) -> ArcId {
        let arc_id = self.arcs.len();
        self.arcs.push(GraphArc {
            from,
            to,
            attributes: attributes.encode(),
            length: compute_geometry_distance(&geometry),
            name: name.to_string(),
            reference: reference.to_string(),
        });
        self.geometry.push(geometry);
        self.reverse.push(None);
        self.adjacency_list[from].push(arc_id);
        arc_id
    }
}

impl RoutableGraph for RoadGraph {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    fn node_arcs(&self, node: NodeId) -> &[ArcId] {
        &self.adjacency_list[node]
    }

    fn arc(&self, arc: ArcId) -> &GraphArc {
        &self.arcs[arc]
    }

    fn arc_geometry(&self, arc: ArcId) -> &[GeoPoint] {
        &self.geometry[arc]
    }

    fn reverse_arc(&self, arc: ArcId) -> Option<ArcId> {
        self.reverse[arc]
    }

    fn node_point(&self, node: NodeId) -> GeoPoint {
        self.nodes[node].point
    }

    fn has_traffic_light(&self, node: NodeId) -> bool {
        self.nodes[node].traffic_light
    }
}
