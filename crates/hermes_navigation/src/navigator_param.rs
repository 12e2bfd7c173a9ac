use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorParam {
    /// Fixes closer than this many meters to the last accepted fix are ignored.
    pub minimum_fix_distance: f64,
    /// Meters from the route before a fix counts as off the route.
    pub route_distance_tolerance: f64,
    /// Seconds off the route before re-routing.
    pub route_time_tolerance: f64,
    /// Re-route as soon as the traveller is off the route. When false the
    /// navigator waits in [`NavigationState::ReRouteNeeded`](crate::navigation_state::NavigationState::ReRouteNeeded)
    /// and re-routes on the next fix.
    pub auto_reroute: bool,
    /// When false fixes only update the position, as if there were no route.
    pub navigation_enabled: bool,
    /// Meters from the end of the route at which the traveller has arrived.
    pub arrival_distance: f64,
}

impl Default for NavigatorParam {
    fn default() -> Self {
        NavigatorParam {
            minimum_fix_distance: 5.0,
            route_distance_tolerance: 20.0,
            route_time_tolerance: 30.0,
            auto_reroute: true,
            navigation_enabled: true,
            arrival_distance: 20.0,
        }
    }
}
