use tracing::{info, instrument};

use crate::{
    arc_attributes::RoadClass,
    error::RouteError,
    geometry::normalize_angle,
    geopoint::{GeoPoint, compass_to_direction, direction_to_compass},
    graph::RoutableGraph,
    location_index::LocationIndex,
    location_match::{LocationMatchParam, MatchCandidate, best_match},
    profile::RouteProfile,
    route::{Route, route_assembler::assemble_route},
    routing::{
        best_route::{BestRouteParams, LegWeights, best_waypoint_order},
        dijkstra::DijkstraSearch,
        path_search::PathSearch,
        route_point::{RouteCoordSet, RoutePoint},
        search_control::SearchControl,
    },
    snap::Snap,
    stopwatch::Stopwatch,
    weighting::{ArcPosition, ProfileWeighting, Weighting},
};

/// The road nearest to a point, as returned by [`Router::nearest_road`].
#[derive(Debug, Clone, PartialEq)]
pub struct NearestRoadInfo {
    pub road_class: RoadClass,
    /// Known speed limit in km/h; zero when unknown.
    pub max_speed: f64,
    pub name: String,
    pub reference: String,
    pub nearest_point: GeoPoint,
    pub distance: f64,
    /// Compass bearing of the road at the nearest point, in the direction of travel.
    pub heading: f64,
    pub path: Vec<GeoPoint>,
    pub one_way: bool,
}

/// Anything that can build routes; the navigator re-routes through this.
pub trait RouteSource: Send + Sync {
    fn create_route(
        &self,
        profile: &RouteProfile,
        points: &RouteCoordSet,
        control: &SearchControl,
    ) -> Result<Route, RouteError>;

    fn create_best_route(
        &self,
        profile: &RouteProfile,
        points: &RouteCoordSet,
        start_fixed: bool,
        end_fixed: bool,
        iterations: usize,
        control: &SearchControl,
    ) -> Result<Route, RouteError>;
}

/// Owns a road graph with its spatial index and builds routes over it.
pub struct Router<G: RoutableGraph, S: PathSearch = DijkstraSearch> {
    graph: G,
    index: LocationIndex,
    search: S,
    best_route_params: BestRouteParams,
}

impl<G: RoutableGraph> Router<G> {
    pub fn new(graph: G) -> Self {
        Router::with_search(graph, DijkstraSearch::new())
    }
}

impl<G: RoutableGraph, S: PathSearch> Router<G, S> {
    pub fn with_search(graph: G, search: S) -> Self {
        let index = LocationIndex::build_from_graph(&graph);

        Router {
            graph,
            index,
            search,
            best_route_params: BestRouteParams::default(),
        }
    }

    pub fn with_best_route_params(mut self, params: BestRouteParams) -> Self {
        self.best_route_params = params;
        self
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn index(&self) -> &LocationIndex {
        &self.index
    }

    /// Routes through `points` in the given order.
    #[instrument(skip_all, fields(profile = %profile.name, points = points.len()))]
    pub fn create_route(
        &self,
        profile: &RouteProfile,
        points: &RouteCoordSet,
        control: &SearchControl,
    ) -> Result<Route, RouteError> {
        let profile = profile.clone().normalized();

        let mut stopwatch = Stopwatch::start("snap waypoints");
        let snaps = self.snap_waypoints(&profile, points)?;

        stopwatch.lap("path search");
        let weighting = ProfileWeighting::new(&profile);
        let sequence = self.search.search(&self.graph, &weighting, &snaps, control)?;

        stopwatch.lap("assemble route");
        let route = assemble_route(&self.graph, &profile, &sequence)?;
        stopwatch.report();

        info!(
            distance = route.distance(),
            time = route.time(),
            segments = route.segments().len(),
            "Route created"
        );
        Ok(route)
    }

    /// Finds a nearby road usable by `profile`. `heading` is a compass bearing.
    pub fn nearest_road(
        &self,
        profile: &RouteProfile,
        point: &GeoPoint,
        heading: Option<f64>,
        params: &LocationMatchParam,
    ) -> Option<NearestRoadInfo> {
        let profile = profile.clone().normalized();
        let weighting = ProfileWeighting::new(&profile);
        let params = params.normalized();

        let matched = best_match(
            self.accessible_candidates(&weighting, point, &params),
            heading.map(compass_to_direction),
            &params,
        )?;

        let snap = matched.item;
        let arc = self.graph.arc(snap.arc_id);
        let attributes = arc.attributes();

        Some(NearestRoadInfo {
            road_class: attributes.road_class,
            max_speed: attributes.known_speed_limit().unwrap_or(0.0),
            name: arc.name().to_string(),
            reference: arc.reference().to_string(),
            nearest_point: snap.coordinates,
            distance: snap.distance,
            heading: direction_to_compass(snap.direction),
            path: self.graph.arc_geometry(snap.arc_id).to_vec(),
            one_way: attributes.direction.is_one_way(),
        })
    }

    fn accessible_candidates(
        &self,
        weighting: &dyn Weighting,
        point: &GeoPoint,
        params: &LocationMatchParam,
    ) -> Vec<MatchCandidate<Snap>> {
        self.index
            .snap_candidates(&self.graph, point, params.max_road_distance)
            .into_iter()
            .filter(|snap| {
                let attributes = self.graph.arc(snap.arc_id).attributes();
                weighting.can_access(&attributes, ArcPosition::Only)
            })
            .map(|snap| MatchCandidate {
                distance: snap.distance,
                direction: snap.direction,
                item: snap,
            })
            .collect()
    }

    fn snap_waypoint(&self, weighting: &dyn Weighting, point: &RoutePoint) -> Option<Snap> {
        let params = point.match_param.normalized();
        let heading = point.heading.map(compass_to_direction);

        let matched = best_match(
            self.accessible_candidates(weighting, &point.point, &params),
            heading,
            &params,
        )?;

        let mut snap = matched.item;
        // A heading that agrees with the road pins the direction of travel.
        if let Some(heading) = heading {
            let difference = normalize_angle(snap.direction - heading).abs();
            snap.fixed_direction = difference <= params.heading_accuracy;
        }
        Some(snap)
    }

    fn snap_waypoints(&self, profile: &RouteProfile, points: &RouteCoordSet) -> Result<Vec<Snap>, RouteError> {
        if points.len() < 2 {
            return Err(RouteError::InvalidInput(format!(
                "a route needs at least two points, got {}",
                points.len()
            )));
        }
        if let Some(index) = points.points.iter().position(|point| !point.point.is_valid()) {
            return Err(RouteError::InvalidInput(format!(
                "point {index} has invalid coordinates"
            )));
        }

        let weighting = ProfileWeighting::new(profile);
        let last = points.len() - 1;

        points
            .points
            .iter()
            .enumerate()
            .map(|(index, point)| {
                self.snap_waypoint(&weighting, point).ok_or(match index {
                    0 => RouteError::NoRoadsNearStart,
                    i if i == last => RouteError::NoRoadsNearEnd,
                    i => RouteError::NoRoadsNearWaypoint(i),
                })
            })
            .collect()
    }
}

impl<G, S> Router<G, S>
where
    G: RoutableGraph + Sync,
    S: PathSearch + Sync,
{
    /// Routes through `points`, visiting them in the order with the lowest
    /// total weight. Fixed ends stay first or last.
    #[instrument(skip_all, fields(profile = %profile.name, points = points.len()))]
    pub fn create_best_route(
        &self,
        profile: &RouteProfile,
        points: &RouteCoordSet,
        start_fixed: bool,
        end_fixed: bool,
        iterations: usize,
        control: &SearchControl,
    ) -> Result<Route, RouteError> {
        let profile = profile.clone().normalized();

        let mut stopwatch = Stopwatch::start("snap waypoints");
        let snaps = self.snap_waypoints(&profile, points)?;
        let weighting = ProfileWeighting::new(&profile);

        stopwatch.lap("leg weights");
        let weights = LegWeights::compute(&self.search, &self.graph, &weighting, &snaps, control)?;

        stopwatch.lap("waypoint order");
        let iterations = self.best_route_params.iterations_for(snaps.len(), iterations);
        let order = best_waypoint_order(
            &weights,
            start_fixed,
            end_fixed,
            iterations,
            &self.best_route_params,
            control,
        )?;
        info!(?order, iterations, "Waypoint order chosen");

        stopwatch.lap("path search");
        let ordered: Vec<Snap> = order.iter().map(|&index| snaps[index].clone()).collect();
        let sequence = self.search.search(&self.graph, &weighting, &ordered, control)?;

        stopwatch.lap("assemble route");
        let route = assemble_route(&self.graph, &profile, &sequence)?;
        stopwatch.report();

        Ok(route)
    }
}

impl<G, S> RouteSource for Router<G, S>
where
    G: RoutableGraph + Send + Sync,
    S: PathSearch + Send + Sync,
{
    fn create_route(
        &self,
        profile: &RouteProfile,
        points: &RouteCoordSet,
        control: &SearchControl,
    ) -> Result<Route, RouteError> {
        Router::create_route(self, profile, points, control)
    }

    fn create_best_route(
        &self,
        profile: &RouteProfile,
        points: &RouteCoordSet,
        start_fixed: bool,
        end_fixed: bool,
        iterations: usize,
        control: &SearchControl,
    ) -> Result<Route, RouteError> {
        Router::create_best_route(self, profile, points, start_fixed, end_fixed, iterations, control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        profile::RouteProfileType,
        test_utils::{crossroads_graph, point, straight_one_way_graph},
        turn::TurnType,
    };

    #[test]
    fn test_route_needs_two_points() {
        let router = Router::new(straight_one_way_graph());
        let points = RouteCoordSet::from_points([point(0.001, 0.0)]);
        let result = router.create_route(&RouteProfile::default(), &points, &SearchControl::new());

        assert!(matches!(result, Err(RouteError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_coordinates() {
        let router = Router::new(straight_one_way_graph());
        let points = RouteCoordSet::from_points([point(0.001, 0.0), point(0.002, 95.0)]);
        let result = router.create_route(&RouteProfile::default(), &points, &SearchControl::new());

        assert!(matches!(result, Err(RouteError::InvalidInput(_))));
    }

    #[test]
    fn test_no_roads_near_ends() {
        let router = Router::new(straight_one_way_graph());
        let profile = RouteProfile::default();
        let control = SearchControl::new();

        let far_start = RouteCoordSet::from_points([point(0.001, 0.5), point(0.004, 0.0)]);
        assert_eq!(
            router.create_route(&profile, &far_start, &control),
            Err(RouteError::NoRoadsNearStart)
        );

        let far_end = RouteCoordSet::from_points([point(0.001, 0.0), point(0.004, 0.5)]);
        assert_eq!(
            router.create_route(&profile, &far_end, &control),
            Err(RouteError::NoRoadsNearEnd)
        );

        let far_middle = RouteCoordSet::from_points([point(0.001, 0.0), point(0.002, 0.5), point(0.004, 0.0)]);
        assert_eq!(
            router.create_route(&profile, &far_middle, &control),
            Err(RouteError::NoRoadsNearWaypoint(1))
        );
    }

    #[test]
    fn test_one_way_road_cannot_be_driven_backwards() {
        let router = Router::new(straight_one_way_graph());
        let points = RouteCoordSet::from_points([point(0.004, 0.0), point(0.001, 0.0)]);

        let result = router.create_route(
            &RouteProfile::new(RouteProfileType::Car),
            &points,
            &SearchControl::new(),
        );
        assert_eq!(result, Err(RouteError::NoRouteConnectivity { from: 0, to: 1 }));

        let walked = router
            .create_route(
                &RouteProfile::new(RouteProfileType::Walk),
                &points,
                &SearchControl::new(),
            )
            .unwrap();
        assert_eq!(walked.segments().len(), 1);
    }

    #[test]
    fn test_straight_road_route() {
        let router = Router::new(straight_one_way_graph());
        let points = RouteCoordSet::from_points([point(0.001, 0.0), point(0.004, 0.0)]);
        let route = router
            .create_route(&RouteProfile::new(RouteProfileType::Car), &points, &SearchControl::new())
            .unwrap();

        assert_eq!(route.segments().len(), 1);
        assert_eq!(route.section_count(), 1);
        assert_eq!(route.segments()[0].turn.turn_type, TurnType::None);
        assert_eq!(route.segments()[0].name, "Long Road");
        assert!(route.time() > 0.0);
    }

    #[test]
    fn test_cancelled_route() {
        let router = Router::new(straight_one_way_graph());
        let points = RouteCoordSet::from_points([point(0.001, 0.0), point(0.004, 0.0)]);
        let control = SearchControl::new();
        control.cancel();

        let result = router.create_route(&RouteProfile::default(), &points, &control);
        assert_eq!(result, Err(RouteError::Cancelled));
    }

    #[test]
    fn test_nearest_road() {
        let crossroads = crossroads_graph();
        let router = Router::new(crossroads.graph);
        let profile = RouteProfile::new(RouteProfileType::Car);

        // Heading north, next to Cross Street.
        let info = router
            .nearest_road(
                &profile,
                &point(0.0001, 0.002),
                Some(0.0),
                &LocationMatchParam::default(),
            )
            .unwrap();

        assert_eq!(info.name, "Cross Street");
        assert_eq!(info.road_class, RoadClass::ResidentialRoad);
        assert!((info.distance - 11.1).abs() < 0.5);
        assert!(info.heading.abs() < 1e-6 || (info.heading - 360.0).abs() < 1e-6);
        assert!(!info.one_way);
        assert_eq!(info.path.len(), 2);

        assert!(
            router
                .nearest_road(&profile, &point(0.5, 0.5), None, &LocationMatchParam::default())
                .is_none()
        );
    }

    #[test]
    fn test_best_route_visits_waypoints_in_order_along_road() {
        let router = Router::new(straight_one_way_graph());
        // Listed out of order; the road only runs east.
        let points = RouteCoordSet::from_points([
            point(0.0005, 0.0),
            point(0.004, 0.0),
            point(0.002, 0.0),
            point(0.0045, 0.0),
        ]);

        let route = router
            .create_best_route(
                &RouteProfile::new(RouteProfileType::Car),
                &points,
                true,
                true,
                0,
                &SearchControl::new(),
            )
            .unwrap();

        assert_eq!(route.section_count(), 3);
        assert!((route.distance() - 444.8).abs() < 1.0);
        assert!(route.path().windows(2).all(|pair| pair[0].lng <= pair[1].lng));
    }
}
