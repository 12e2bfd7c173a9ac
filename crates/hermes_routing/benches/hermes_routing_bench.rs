use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use hermes_routing::{
    arc_attributes::{ArcAttributes, RoadClass},
    geopoint::GeoPoint,
    graph::{Road, RoadGraph},
    profile::{RouteProfile, RouteProfileType},
    router::Router,
    routing::{route_point::RouteCoordSet, search_control::SearchControl},
};

const GRID_SIZE: usize = 40;
const GRID_SPACING: f64 = 0.001;

/// A square street grid with primary roads every tenth line.
fn grid_graph() -> RoadGraph {
    let mut graph = RoadGraph::new();
    let mut nodes = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
    for row in 0..GRID_SIZE {
        for column in 0..GRID_SIZE {
            nodes.push(graph.add_node(GeoPoint::new(
                column as f64 * GRID_SPACING,
                row as f64 * GRID_SPACING,
            )));
        }
    }

    let class = |line: usize| {
        if line % 10 == 0 {
            RoadClass::PrimaryRoad
        } else {
            RoadClass::ResidentialRoad
        }
    };

    for row in 0..GRID_SIZE {
        for column in 0..GRID_SIZE {
            let node = nodes[row * GRID_SIZE + column];
            if column + 1 < GRID_SIZE {
                let attributes = ArcAttributes::new(class(row));
                graph.add_road(Road::new(node, nodes[row * GRID_SIZE + column + 1], attributes));
            }
            if row + 1 < GRID_SIZE {
                let attributes = ArcAttributes::new(class(column));
                graph.add_road(Road::new(node, nodes[(row + 1) * GRID_SIZE + column], attributes));
            }
        }
    }
    graph
}

fn route_benchmark(c: &mut Criterion) {
    let router = Router::new(grid_graph());
    let profile = RouteProfile::new(RouteProfileType::Car);
    let far = (GRID_SIZE - 1) as f64 * GRID_SPACING;

    let across = RouteCoordSet::from_points([
        GeoPoint::new(0.0005, 0.0),
        GeoPoint::new(far - 0.0005, far),
    ]);
    c.bench_function("create_route across grid", |b| {
        b.iter(|| {
            router
                .create_route(black_box(&profile), black_box(&across), &SearchControl::new())
                .unwrap()
        })
    });

    let tour = RouteCoordSet::from_points([
        GeoPoint::new(0.0005, 0.0),
        GeoPoint::new(far, 0.0205),
        GeoPoint::new(0.0105, far),
        GeoPoint::new(0.0305, 0.0105),
        GeoPoint::new(0.0, 0.0305),
        GeoPoint::new(far - 0.0005, far),
    ]);
    c.bench_function("create_best_route six waypoints", |b| {
        b.iter(|| {
            router
                .create_best_route(black_box(&profile), black_box(&tour), true, true, 0, &SearchControl::new())
                .unwrap()
        })
    });
}

criterion_group!(benches, route_benchmark);
criterion_main!(benches);
