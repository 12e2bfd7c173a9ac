use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use hermes_routing::{
    arc_attributes::{ArcAttributes, RoadClass, RoadDirection},
    error::RouteError,
    geopoint::GeoPoint,
    graph::{Road, RoadGraph},
    profile::RouteProfile,
    route::Route,
    router::{RouteSource, Router},
    routing::{route_point::RouteCoordSet, search_control::SearchControl},
    turn::Turn,
};
use jiff::{SignedDuration, Timestamp};
use parking_lot::Mutex;

use crate::{
    navigation_fix::NavigationFix, navigation_state::NavigationState, navigator_turn::NavigatorTurn,
    observer::NavigatorObserver,
};

pub(crate) fn point(lng: f64, lat: f64) -> GeoPoint {
    GeoPoint::new(lng, lat)
}

/// A fix `seconds` after a fixed start time.
pub(crate) fn fix_at(lng: f64, lat: f64, seconds: i64) -> NavigationFix {
    let start = Timestamp::from_second(1_700_000_000).unwrap();
    NavigationFix::new(point(lng, lat)).at(start + SignedDuration::from_secs(seconds))
}

pub(crate) fn turn_onto(turn: Turn, name: &str, distance: f64) -> NavigatorTurn {
    NavigatorTurn {
        turn,
        distance,
        to_name: name.to_string(),
        ..Default::default()
    }
}

/// A one-way primary road running east along the equator for about 556 m.
pub(crate) fn straight_router() -> Arc<dyn RouteSource> {
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
    Arc::new(Router::new(graph))
}

/// Main Road along the equator from 0 to 0.01 degrees east, with Mill Lane
/// leaving north from its middle. Back Lane runs parallel 500 m north and
/// is joined to Main Road at both ends.
pub(crate) fn network_router() -> Arc<dyn RouteSource> {
    let mut graph = RoadGraph::new();
    let main_west = graph.add_node(point(0.0, 0.0));
    let main_middle = graph.add_node(point(0.005, 0.0));
    let main_east = graph.add_node(point(0.01, 0.0));
    let mill_end = graph.add_node(point(0.005, 0.003));
    let back_west = graph.add_node(point(0.0, 0.0045));
    let back_east = graph.add_node(point(0.01, 0.0045));

    let primary = ArcAttributes::new(RoadClass::PrimaryRoad);
    let residential = ArcAttributes::new(RoadClass::ResidentialRoad);
    graph.add_road(Road::new(main_west, main_middle, primary).named("Main Road"));
    graph.add_road(Road::new(main_middle, main_east, primary).named("Main Road"));
    graph.add_road(Road::new(main_middle, mill_end, residential).named("Mill Lane"));
    graph.add_road(Road::new(back_west, back_east, residential).named("Back Lane"));
    graph.add_road(Road::new(main_west, back_west, residential).named("West Link"));
    graph.add_road(Road::new(main_east, back_east, residential).named("East Link"));

    Arc::new(Router::new(graph))
}

/// Records everything it is told.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    states: Mutex<Vec<NavigationState>>,
    routes: Mutex<Vec<bool>>,
    turns: Mutex<Vec<(NavigatorTurn, Option<NavigatorTurn>, Option<NavigatorTurn>)>>,
}

impl RecordingObserver {
    pub(crate) fn states(&self) -> Vec<NavigationState> {
        self.states.lock().clone()
    }

    /// Routes installed, not counting clears.
    pub(crate) fn route_count(&self) -> usize {
        self.routes.lock().iter().filter(|installed| **installed).count()
    }

    pub(crate) fn last_turns(&self) -> Option<(NavigatorTurn, Option<NavigatorTurn>, Option<NavigatorTurn>)> {
        self.turns.lock().last().cloned()
    }
}

impl NavigatorObserver for RecordingObserver {
    fn on_route(&self, route: Option<&Route>) {
        self.routes.lock().push(route.is_some());
    }

    fn on_turn(&self, first: &NavigatorTurn, second: Option<&NavigatorTurn>, continuation: Option<&NavigatorTurn>) {
        self.turns
            .lock()
            .push((first.clone(), second.cloned(), continuation.cloned()));
    }

    fn on_state(&self, state: NavigationState) {
        self.states.lock().push(state);
    }
}

/// A route source that blocks until released or cancelled, then returns an
/// empty route.
#[derive(Default)]
pub(crate) struct GatedSource {
    released: AtomicBool,
    calls: AtomicUsize,
}

impl GatedSource {
    pub(crate) fn release(&self) {
        self.released.store(true, Ordering::Release);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }

    fn wait(&self, profile: &RouteProfile, control: &SearchControl) -> Result<Route, RouteError> {
        self.calls.fetch_add(1, Ordering::AcqRel);
        while !self.released.load(Ordering::Acquire) {
            control.check()?;
            thread::sleep(Duration::from_millis(1));
        }
        Ok(Route::empty(profile.clone()))
    }
}

impl RouteSource for GatedSource {
    fn create_route(
        &self,
        profile: &RouteProfile,
        _points: &RouteCoordSet,
        control: &SearchControl,
    ) -> Result<Route, RouteError> {
        self.wait(profile, control)
    }

    fn create_best_route(
        &self,
        profile: &RouteProfile,
        _points: &RouteCoordSet,
        _start_fixed: bool,
        _end_fixed: bool,
        _iterations: usize,
        control: &SearchControl,
    ) -> Result<Route, RouteError> {
        self.wait(profile, control)
    }
}
