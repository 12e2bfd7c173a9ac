use std::sync::Arc;

use hermes_routing::{
    error::RouteError,
    geometry::normalize_angle,
    geopoint::{GeoPoint, compass_to_direction},
    location_match::LocationMatchParam,
    profile::RouteProfile,
    route::{NearestSegmentInfo, Route},
    router::RouteSource,
    routing::{
        route_point::{RouteCoordSet, RoutePoint},
        search_control::SearchControl,
    },
};
use tracing::{debug, info, warn};

use crate::{
    instructions::{InstructionOptions, turn_instructions},
    navigation_fix::NavigationFix,
    navigation_state::{NavigationEvent, NavigationState},
    navigator_param::NavigatorParam,
    navigator_turn::NavigatorTurn,
    observer::{NavigatorObserver, ObserverList},
    route_handle::RouteHandle,
};

/// A second turn is only reported when it follows the first this closely.
pub const SECOND_TURN_DISTANCE: f64 = 100.0;
/// Heading this far from the route direction means travelling against it.
const TURN_ROUND_ANGLE: f64 = 135.0;

/// Where the traveller is along the active route.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePosition {
    pub section: usize,
    pub segment_index: usize,
    pub nearest_point: GeoPoint,
    pub distance_to_route: f64,
    pub distance_along_route: f64,
    pub time_along_route: f64,
}

impl RoutePosition {
    fn new(route: &Route, info: &NearestSegmentInfo) -> Self {
        RoutePosition {
            section: route.segments()[info.segment_index].section,
            segment_index: info.segment_index,
            nearest_point: info.nearest_point,
            distance_to_route: info.distance_to_route,
            distance_along_route: info.distance_along_route,
            time_along_route: info.time_along_route,
        }
    }
}

/// The turns ahead of the traveller, as last sent to observers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavigatorTurns {
    /// The next significant turn, or the arrival when there is none.
    pub first: NavigatorTurn,
    /// A significant turn within [`SECOND_TURN_DISTANCE`] after `first`,
    /// with its distance measured from `first`.
    pub second: Option<NavigatorTurn>,
    /// An ahead or continue turn before `first`.
    pub continuation: Option<NavigatorTurn>,
}

/// Tracks a traveller along a route, announcing turns and re-routing when
/// they leave it.
pub struct Navigator {
    router: Arc<dyn RouteSource>,
    profile: RouteProfile,
    params: NavigatorParam,
    match_param: LocationMatchParam,
    instruction_options: InstructionOptions,
    route: Arc<RouteHandle>,
    waypoints: RouteCoordSet,
    state: NavigationState,
    observers: ObserverList,
    last_fix: Option<NavigationFix>,
    last_matched_fix: Option<NavigationFix>,
    /// The fix an off-route period is measured from.
    off_route_since: Option<NavigationFix>,
    position: Option<RoutePosition>,
    turns: Option<NavigatorTurns>,
}

impl Navigator {
    pub fn new(router: Arc<dyn RouteSource>, profile: RouteProfile) -> Self {
        Navigator {
            router,
            profile: profile.normalized(),
            params: NavigatorParam::default(),
            match_param: LocationMatchParam::default(),
            instruction_options: InstructionOptions::default(),
            route: Arc::new(RouteHandle::new()),
            waypoints: RouteCoordSet::default(),
            state: NavigationState::None,
            observers: ObserverList::default(),
            last_fix: None,
            last_matched_fix: None,
            off_route_since: None,
            position: None,
            turns: None,
        }
    }

    pub fn with_params(mut self, params: NavigatorParam) -> Self {
        self.params = params;
        self
    }

    pub fn with_match_param(mut self, match_param: LocationMatchParam) -> Self {
        self.match_param = match_param;
        self
    }

    pub fn with_instruction_options(mut self, options: InstructionOptions) -> Self {
        self.instruction_options = options;
        self
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn params(&self) -> &NavigatorParam {
        &self.params
    }

    pub fn profile(&self) -> &RouteProfile {
        &self.profile
    }

    pub fn route(&self) -> Option<Arc<Route>> {
        self.route.load()
    }

    /// A handle other threads can read the active route through.
    pub fn route_handle(&self) -> Arc<RouteHandle> {
        Arc::clone(&self.route)
    }

    pub fn position(&self) -> Option<&RoutePosition> {
        self.position.as_ref()
    }

    pub fn turns(&self) -> Option<&NavigatorTurns> {
        self.turns.as_ref()
    }

    pub fn last_fix(&self) -> Option<&NavigationFix> {
        self.last_fix.as_ref()
    }

    pub fn add_observer(&mut self, observer: &Arc<dyn NavigatorObserver>) {
        self.observers.add(observer);
    }

    pub fn remove_observer(&mut self, observer: &Arc<dyn NavigatorObserver>) {
        self.observers.remove(observer);
    }

    /// Creates a route through `waypoints` and starts navigating along it.
    pub fn start_navigation(&mut self, waypoints: RouteCoordSet) -> Result<(), RouteError> {
        let route = self
            .router
            .create_route(&self.profile, &waypoints, &SearchControl::new())?;
        self.set_route(route, waypoints);
        Ok(())
    }

    /// Installs a route made elsewhere. `waypoints` are used when re-routing;
    /// when empty the end of the route is the only destination.
    pub fn set_route(&mut self, route: Route, waypoints: RouteCoordSet) {
        self.waypoints = waypoints;
        self.install_route(Some(route));

        if self.params.navigation_enabled {
            self.apply(NavigationEvent::RouteInstalled);
        }
    }

    pub fn end_navigation(&mut self) {
        self.waypoints = RouteCoordSet::default();
        self.install_route(None);
        self.apply(NavigationEvent::RouteCleared);
    }

    pub fn set_navigation_enabled(&mut self, enabled: bool) {
        if self.params.navigation_enabled == enabled {
            return;
        }
        self.params.navigation_enabled = enabled;

        if !enabled {
            self.position = None;
            self.turns = None;
            self.apply(NavigationEvent::RouteCleared);
        } else if !self.route.is_empty() {
            self.apply(NavigationEvent::RouteInstalled);
        }
    }

    /// Feeds a position fix. Fixes too close to the last accepted one are
    /// ignored; a fix that matches nothing counts towards being off the route.
    pub fn navigate(&mut self, fix: NavigationFix) -> NavigationState {
        let fix = fix.completed(self.last_fix.as_ref());

        let too_close = self
            .last_fix
            .as_ref()
            .is_some_and(|last| last.position.haversine_distance(&fix.position) < self.params.minimum_fix_distance);
        if too_close {
            debug!("Ignoring fix closer than the minimum fix distance");
            return self.state;
        }
        self.last_fix = Some(fix.clone());

        if !self.params.navigation_enabled {
            return self.state;
        }
        let Some(route) = self.route.load() else {
            return self.state;
        };

        if self.state == NavigationState::ReRouteNeeded {
            // Failures are logged and retried on the next fix.
            let _ = self.reroute_from(&fix);
            return self.state;
        }

        match self.match_fix(&route, &fix) {
            Some(info) => self.on_route_fix(&route, &fix, &info),
            None => self.off_route_fix(&fix),
        }

        self.state
    }

    /// Replaces the route with one from the last fix to the remaining waypoints.
    pub fn reroute(&mut self) -> Result<(), RouteError> {
        let fix = self
            .last_fix
            .clone()
            .ok_or_else(|| RouteError::InvalidInput("no position to re-route from".to_string()))?;
        self.reroute_from(&fix)
    }

    fn match_fix(&self, route: &Route, fix: &NavigationFix) -> Option<NearestSegmentInfo> {
        let params = LocationMatchParam {
            max_road_distance: self.params.route_distance_tolerance,
            ..self.match_param
        };
        let heading = fix.course.map(compass_to_direction);
        let (min_section, previous_distance) = match &self.position {
            Some(position) => (position.section, Some(position.distance_along_route)),
            None => (0, None),
        };

        route.match_location(&fix.position, heading, &params, min_section, previous_distance)
    }

    fn on_route_fix(&mut self, route: &Route, fix: &NavigationFix, info: &NearestSegmentInfo) {
        self.off_route_since = None;
        self.last_matched_fix = Some(fix.clone());
        self.position = Some(RoutePosition::new(route, info));

        let remaining = route.distance() - info.distance_along_route;
        let wrong_way = fix.course.is_some_and(|course| {
            normalize_angle(info.direction - compass_to_direction(course)).abs() > TURN_ROUND_ANGLE
        });

        let event = if remaining <= self.params.arrival_distance {
            NavigationEvent::Arrived
        } else if wrong_way {
            NavigationEvent::WrongWay
        } else {
            NavigationEvent::OnRoute
        };
        self.apply(event);

        if !self.state.has_turns() {
            self.turns = None;
            return;
        }

        let turns = self.compute_turns(route, info);
        self.observers.notify(|observer| {
            observer.on_turn(&turns.first, turns.second.as_ref(), turns.continuation.as_ref())
        });
        self.turns = Some(turns);
    }

    fn off_route_fix(&mut self, fix: &NavigationFix) {
        if self.off_route_since.is_none() {
            self.off_route_since = Some(self.last_matched_fix.clone().unwrap_or_else(|| fix.clone()));
        }
        let (off_time, off_distance) = match &self.off_route_since {
            Some(since) => (
                fix.seconds_since(since.time),
                since.position.haversine_distance(&fix.position),
            ),
            None => (0.0, 0.0),
        };

        if off_time > self.params.route_time_tolerance && off_distance > self.params.route_distance_tolerance {
            info!(off_time, off_distance, "Left the route");
            self.turns = None;
            self.apply(NavigationEvent::LeftRoute);

            if self.params.auto_reroute {
                // Failures leave the state at off route; the next fix retries.
                let _ = self.reroute_from(fix);
            } else {
                self.apply(NavigationEvent::ReRouteRequired);
            }
        } else if self.state == NavigationState::ReRouteDone {
            self.apply(NavigationEvent::PositionUnmatched);
        }
    }

    fn reroute_from(&mut self, fix: &NavigationFix) -> Result<(), RouteError> {
        let section = self.position.as_ref().map_or(0, |position| position.section);

        let mut start = RoutePoint::new(fix.position).with_match_param(self.match_param);
        if let Some(course) = fix.course {
            start = start.with_heading(course);
        }

        let mut points = RouteCoordSet::new(vec![start]);
        if self.waypoints.len() > section + 1 {
            points.points.extend(self.waypoints.points.iter().skip(section + 1).cloned());
        } else if let Some(end) = self.route.load().and_then(|route| route.end()) {
            points.push(RoutePoint::new(end).with_match_param(self.match_param));
        }

        let route = match self.router.create_route(&self.profile, &points, &SearchControl::new()) {
            Ok(route) => route,
            Err(error) => {
                warn!(%error, "Re-route failed");
                return Err(error);
            }
        };
        info!(distance = route.distance(), time = route.time(), "Re-routed");

        self.waypoints = points;
        self.install_route(Some(route));

        let event = if self.state.transition(NavigationEvent::ReRouted).is_some() {
            NavigationEvent::ReRouted
        } else {
            NavigationEvent::RouteInstalled
        };
        self.apply(event);
        Ok(())
    }

    fn install_route(&mut self, route: Option<Route>) {
        let route = route.map(Arc::new);
        self.route.replace(route.clone());

        self.position = None;
        self.turns = None;
        self.last_matched_fix = None;
        self.off_route_since = None;

        self.observers.notify(|observer| observer.on_route(route.as_deref()));
    }

    fn apply(&mut self, event: NavigationEvent) {
        let Some(next) = self.state.transition(event) else {
            debug!(state = %self.state, %event, "Navigation event not allowed in this state");
            return;
        };
        if next == self.state {
            return;
        }

        debug!(from = %self.state, to = %next, %event, "Navigation state changed");
        self.state = next;
        self.observers.notify(|observer| observer.on_state(next));
    }

    fn compute_turns(&self, route: &Route, info: &NearestSegmentInfo) -> NavigatorTurns {
        let segments = route.segments();
        let current = &segments[info.segment_index];

        let mut distance = current.distance - info.distance_along_segment;
        let mut time = current.time - info.time_along_segment;
        let mut first: Option<NavigatorTurn> = None;
        let mut second = None;
        let mut continuation = None;

        for index in info.segment_index + 1..segments.len() {
            let turn = NavigatorTurn::between(&segments[index - 1], Some(&segments[index]), distance, time);

            match first.as_mut() {
                None if turn.is_significant() => first = Some(turn),
                None => {
                    if continuation.is_none() && !turn.is_arrival() {
                        continuation = Some(turn);
                    }
                }
                Some(first) => {
                    let following = NavigatorTurn {
                        distance: distance - first.distance,
                        time: time - first.time,
                        ..turn
                    };
                    if following.distance > SECOND_TURN_DISTANCE {
                        break;
                    }
                    if following.is_significant() {
                        second = Some(following);
                        break;
                    }
                    first.merge_if_possible(&following, &self.profile);
                }
            }

            distance += segments[index].distance;
            time += segments[index].time;
        }

        let mut first = match first {
            Some(first) => first,
            None => {
                let last = segments.len() - 1;
                NavigatorTurn::between(&segments[last], None, distance, time)
            }
        };

        first.instructions = turn_instructions(
            &first,
            &self.profile,
            &self.instruction_options,
            self.state,
            second.as_ref(),
        );
        for turn in second.iter_mut().chain(continuation.iter_mut()) {
            turn.instructions = turn_instructions(
                turn,
                &self.profile,
                &self.instruction_options,
                NavigationState::Turn,
                None,
            );
        }

        NavigatorTurns {
            first,
            second,
            continuation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_routing::turn::TurnType;

    use crate::test_utils::{
        RecordingObserver, fix_at, network_router, point, straight_router,
    };

    fn observed(navigator: &mut Navigator) -> Arc<RecordingObserver> {
        let recorder = Arc::new(RecordingObserver::default());
        let observer: Arc<dyn NavigatorObserver> = recorder.clone();
        navigator.add_observer(&observer);
        recorder
    }

    fn car() -> RouteProfile {
        RouteProfile::new(hermes_routing::profile::RouteProfileType::Car)
    }

    fn waypoints(points: &[(f64, f64)]) -> RouteCoordSet {
        RouteCoordSet::from_points(points.iter().map(|&(lng, lat)| point(lng, lat)))
    }

    #[test]
    fn test_straight_road_stays_on_route() {
        let mut navigator = Navigator::new(straight_router(), car());
        navigator
            .start_navigation(waypoints(&[(0.0005, 0.0), (0.0045, 0.0)]))
            .unwrap();

        let route = navigator.route().unwrap();
        assert_eq!(route.segments().len(), 1);
        assert_eq!(route.section_count(), 1);
        assert_eq!(route.segments()[0].turn.turn_type, TurnType::None);
        assert_eq!(navigator.state(), NavigationState::NoPosition);

        for (step, lng) in [0.001, 0.0015, 0.002, 0.0025, 0.003].into_iter().enumerate() {
            let state = navigator.navigate(fix_at(lng, 0.0, step as i64 * 5));
            assert!(
                matches!(state, NavigationState::Turn | NavigationState::NoPosition),
                "unexpected {state} at {lng}"
            );
        }
        assert_eq!(navigator.state(), NavigationState::Turn);

        let turns = navigator.turns().unwrap();
        assert!(turns.first.is_arrival());
        assert!((turns.first.distance - 166.8).abs() < 1.0);
        assert_eq!(turns.first.instructions, "In 170 m arrive at your destination");
    }

    #[test]
    fn test_rejected_fix_changes_nothing() {
        let mut navigator = Navigator::new(straight_router(), car());
        navigator
            .start_navigation(waypoints(&[(0.0005, 0.0), (0.0045, 0.0)]))
            .unwrap();
        navigator.navigate(fix_at(0.001, 0.0, 0));

        let state = navigator.state();
        let position = navigator.position().cloned();
        let last_fix = navigator.last_fix().cloned();

        for _ in 0..2 {
            // About 2 m from the accepted fix.
            navigator.navigate(fix_at(0.00102, 0.0, 3));
            assert_eq!(navigator.state(), state);
            assert_eq!(navigator.position().cloned(), position);
            assert_eq!(navigator.last_fix().cloned(), last_fix);
        }
    }

    #[test]
    fn test_off_route_triggers_reroute() {
        let mut navigator = Navigator::new(network_router(), car());
        let recorder = observed(&mut navigator);
        navigator
            .start_navigation(waypoints(&[(0.001, 0.0), (0.009, 0.0)]))
            .unwrap();
        let original = navigator.route().unwrap();

        assert_eq!(navigator.navigate(fix_at(0.002, 0.0, 0)), NavigationState::Turn);
        // 500 m north, on the back lane, 40 s later.
        assert_eq!(
            navigator.navigate(fix_at(0.003, 0.0045, 40)),
            NavigationState::ReRouteDone
        );

        let states = recorder.states();
        assert_eq!(
            states[states.len() - 3..],
            [
                NavigationState::Turn,
                NavigationState::OffRoute,
                NavigationState::ReRouteDone
            ]
        );

        let rerouted = navigator.route().unwrap();
        assert!(!rerouted.is_empty());
        assert!(!Arc::ptr_eq(&original, &rerouted));
        let start = rerouted.start().unwrap();
        assert!(start.haversine_distance(&point(0.003, 0.0045)) < 1.0);
        assert_eq!(recorder.route_count(), 2);
    }

    #[test]
    fn test_short_excursion_stays_on_route() {
        let mut navigator = Navigator::new(network_router(), car());
        navigator
            .start_navigation(waypoints(&[(0.001, 0.0), (0.009, 0.0)]))
            .unwrap();

        navigator.navigate(fix_at(0.002, 0.0, 0));
        // Far away but only briefly.
        assert_eq!(navigator.navigate(fix_at(0.003, 0.0045, 10)), NavigationState::Turn);
        assert_eq!(navigator.navigate(fix_at(0.0035, 0.0, 20)), NavigationState::Turn);
    }

    #[test]
    fn test_manual_reroute_waits_for_next_fix() {
        let params = NavigatorParam {
            auto_reroute: false,
            ..Default::default()
        };
        let mut navigator = Navigator::new(network_router(), car()).with_params(params);
        navigator
            .start_navigation(waypoints(&[(0.001, 0.0), (0.009, 0.0)]))
            .unwrap();

        navigator.navigate(fix_at(0.002, 0.0, 0));
        assert_eq!(
            navigator.navigate(fix_at(0.003, 0.0045, 40)),
            NavigationState::ReRouteNeeded
        );
        assert_eq!(
            navigator.navigate(fix_at(0.004, 0.0045, 50)),
            NavigationState::ReRouteDone
        );
    }

    #[test]
    fn test_arrival() {
        let mut navigator = Navigator::new(network_router(), car());
        navigator
            .start_navigation(waypoints(&[(0.001, 0.0), (0.009, 0.0)]))
            .unwrap();

        navigator.navigate(fix_at(0.002, 0.0, 0));
        assert_eq!(navigator.navigate(fix_at(0.00885, 0.0, 60)), NavigationState::Arrival);
        assert_eq!(
            navigator.turns().unwrap().first.instructions,
            "You have arrived at your destination"
        );
    }

    #[test]
    fn test_heading_against_route_needs_turn_round() {
        let mut navigator = Navigator::new(network_router(), car());
        navigator
            .start_navigation(waypoints(&[(0.001, 0.0), (0.009, 0.0)]))
            .unwrap();

        navigator.navigate(fix_at(0.003, 0.0, 0));
        let state = navigator.navigate(fix_at(0.0036, 0.0, 5).with_course(270.0));

        assert_eq!(state, NavigationState::TurnRound);
        assert!(navigator.turns().is_none());
    }

    #[test]
    fn test_turn_reported_to_observers() {
        let mut navigator = Navigator::new(network_router(), car());
        let recorder = observed(&mut navigator);
        navigator
            .start_navigation(waypoints(&[(0.001, 0.0), (0.005, 0.002)]))
            .unwrap();

        navigator.navigate(fix_at(0.002, 0.0, 0));

        let (first, second, _) = recorder.last_turns().unwrap();
        assert_eq!(first.turn.turn_type, TurnType::Left);
        assert_eq!(first.to_name, "Mill Lane");
        assert_eq!(first.from_name, "Main Road");
        assert!((first.distance - 333.6).abs() < 1.0);
        assert_eq!(first.instructions, "In 330 m turn left onto Mill Lane");
        assert!(second.is_none());
    }

    #[test]
    fn test_end_navigation() {
        let mut navigator = Navigator::new(straight_router(), car());
        let recorder = observed(&mut navigator);
        navigator
            .start_navigation(waypoints(&[(0.0005, 0.0), (0.0045, 0.0)]))
            .unwrap();
        navigator.navigate(fix_at(0.001, 0.0, 0));

        navigator.end_navigation();

        assert_eq!(navigator.state(), NavigationState::None);
        assert!(navigator.route().is_none());
        assert!(navigator.position().is_none());
        assert_eq!(recorder.states().last(), Some(&NavigationState::None));
        assert_eq!(recorder.route_count(), 1);
        // Further fixes do nothing without a route.
        assert_eq!(navigator.navigate(fix_at(0.002, 0.0, 10)), NavigationState::None);
    }

    #[test]
    fn test_navigation_disabled_only_tracks_position() {
        let params = NavigatorParam {
            navigation_enabled: false,
            ..Default::default()
        };
        let mut navigator = Navigator::new(straight_router(), car()).with_params(params);
        navigator
            .start_navigation(waypoints(&[(0.0005, 0.0), (0.0045, 0.0)]))
            .unwrap();

        assert_eq!(navigator.navigate(fix_at(0.001, 0.0, 0)), NavigationState::None);
        assert!(navigator.last_fix().is_some());
        assert!(navigator.position().is_none());

        navigator.set_navigation_enabled(true);
        assert_eq!(navigator.state(), NavigationState::NoPosition);
        assert_eq!(navigator.navigate(fix_at(0.002, 0.0, 10)), NavigationState::Turn);
    }

    #[test]
    fn test_route_failure_is_an_error() {
        let mut navigator = Navigator::new(straight_router(), car());
        let result = navigator.start_navigation(waypoints(&[(0.0005, 0.5), (0.0045, 0.0)]));

        assert_eq!(result, Err(RouteError::NoRoadsNearStart));
        assert_eq!(navigator.state(), NavigationState::None);
    }
}
