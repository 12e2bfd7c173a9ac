use std::cmp::Ordering;
use std::collections::BinaryHeap;

use fxhash::FxHashMap;
use tracing::trace;

use crate::{
    constants::SEARCH_CANCEL_CHECK_INTERVAL,
    error::RouteError,
    graph::{NodeId, RoutableGraph},
    snap::Snap,
    weighting::{ArcPosition, Weighting},
};

use super::{
    path_search::{LegPath, PathArc, PathSearch},
    search_control::SearchControl,
};

#[derive(Copy, Clone, Debug)]
struct HeapItem {
    node_id: NodeId,
    weight: f64,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &HeapItem) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &HeapItem) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Flip weight to make this a min-heap
        other
            .weight
            .total_cmp(&self.weight)
            .then_with(|| self.node_id.cmp(&other.node_id))
    }
}

struct NodeData {
    weight: f64,
    settled: bool,
    parent: Option<NodeId>,
    // Arc from the parent (or from the start snap) to this node
    arc: PathArc,
}

/// Arc reaching the destination from its start node.
struct Arrival {
    arc: PathArc,
    weight: f64,
}

struct Best {
    weight: f64,
    // Node the arrival arc leaves from; `None` for a path along a single arc
    node: Option<NodeId>,
    arc: PathArc,
}

/// Plain Dijkstra between two snapped positions, starting and ending part-way along arcs.
#[derive(Debug, Default, Clone, Copy)]
pub struct DijkstraSearch;

impl DijkstraSearch {
    pub fn new() -> Self {
        DijkstraSearch
    }

    fn build_path(data: &FxHashMap<NodeId, NodeData>, best: Best) -> LegPath {
        let mut arcs = vec![best.arc];

        let mut node = best.node;
        while let Some(node_id) = node {
            let Some(node_data) = data.get(&node_id) else {
                break;
            };
            arcs.push(node_data.arc);
            node = node_data.parent;
        }

        arcs.reverse();

        LegPath {
            arcs,
            weight: best.weight,
        }
    }
}

impl PathSearch for DijkstraSearch {
    fn search_leg(
        &self,
        graph: &impl RoutableGraph,
        weighting: &dyn Weighting,
        from: &Snap,
        to: &Snap,
        control: &SearchControl,
    ) -> Result<Option<LegPath>, RouteError> {
        let mut heap: BinaryHeap<HeapItem> = BinaryHeap::with_capacity(1024);
        // Use a HashMap instead of a vector: most searches touch a small part of the graph.
        let mut data: FxHashMap<NodeId, NodeData> = FxHashMap::default();
        let mut arrivals: FxHashMap<NodeId, Vec<Arrival>> = FxHashMap::default();
        let mut best: Option<Best> = None;

        let departures = from.directed(graph);
        let destinations = to.directed(graph);

        for destination in &destinations {
            let arc = graph.arc(destination.arc_id);
            let cost = weighting.arc_cost(&arc.attributes(), destination.offset, ArcPosition::Last);
            if !cost.admissible {
                continue;
            }
            arrivals.entry(arc.from_node()).or_default().push(Arrival {
                arc: PathArc::new(destination.arc_id, 0.0, destination.offset),
                weight: cost.weight,
            });
        }

        for departure in &departures {
            let arc = graph.arc(departure.arc_id);
            let attributes = arc.attributes();

            // Both positions on the same arc, the destination further along it
            for destination in &destinations {
                if destination.arc_id != departure.arc_id || destination.offset < departure.offset {
                    continue;
                }
                let cost = weighting.arc_cost(
                    &attributes,
                    destination.offset - departure.offset,
                    ArcPosition::Only,
                );
                if cost.admissible && best.as_ref().is_none_or(|b| cost.weight < b.weight) {
                    best = Some(Best {
                        weight: cost.weight,
                        node: None,
                        arc: PathArc::new(departure.arc_id, departure.offset, destination.offset),
                    });
                }
            }

            let remaining = (arc.length() - departure.offset).max(0.0);
            let cost = weighting.arc_cost(&attributes, remaining, ArcPosition::First);
            if !cost.admissible {
                continue;
            }

            let node = arc.to_node();
            let improves = data.get(&node).is_none_or(|d| cost.weight < d.weight);
            if improves {
                data.insert(
                    node,
                    NodeData {
                        weight: cost.weight,
                        settled: false,
                        parent: None,
                        arc: PathArc::new(departure.arc_id, departure.offset, arc.length()),
                    },
                );
                heap.push(HeapItem {
                    node_id: node,
                    weight: cost.weight,
                });
            }
        }

        let mut iterations = 0;

        while let Some(HeapItem { node_id, weight }) = heap.pop() {
            iterations += 1;
            if iterations % SEARCH_CANCEL_CHECK_INTERVAL == 0 {
                control.check()?;
            }

            if best.as_ref().is_some_and(|b| weight >= b.weight) {
                break;
            }

            let Some(node_data) = data.get_mut(&node_id) else {
                continue;
            };
            // Node is already settled or was improved after being queued, skip
            if node_data.settled || weight > node_data.weight {
                continue;
            }
            node_data.settled = true;

            if let Some(node_arrivals) = arrivals.get(&node_id) {
                for arrival in node_arrivals {
                    let total = weight + arrival.weight;
                    if best.as_ref().is_none_or(|b| total < b.weight) {
                        best = Some(Best {
                            weight: total,
                            node: Some(node_id),
                            arc: arrival.arc,
                        });
                    }
                }
            }

            for &arc_id in graph.node_arcs(node_id) {
                let arc = graph.arc(arc_id);
                let adj_node = arc.to_node();

                if data.get(&adj_node).is_some_and(|d| d.settled) {
                    continue;
                }

                let cost = weighting.arc_cost(&arc.attributes(), arc.length(), ArcPosition::Interior);
                if !cost.admissible {
                    continue;
                }

                let adj_weight = weight + cost.weight;
                if data.get(&adj_node).is_none_or(|d| adj_weight < d.weight) {
                    data.insert(
                        adj_node,
                        NodeData {
                            weight: adj_weight,
                            settled: false,
                            parent: Some(node_id),
                            arc: PathArc::full(graph, arc_id),
                        },
                    );
                    heap.push(HeapItem {
                        node_id: adj_node,
                        weight: adj_weight,
                    });
                }
            }
        }

        trace!(iterations, visited = data.len(), "Dijkstra leg search finished");

        Ok(best.map(|best| Self::build_path(&data, best)))
    }
}
