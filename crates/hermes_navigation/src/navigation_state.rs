use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NavigationState {
    /// No route, or navigation is disabled.
    #[default]
    None,
    /// A route is installed but no position has been matched to it yet.
    NoPosition,
    /// On the route, with turn information available.
    Turn,
    OffRoute,
    /// Off the route and waiting for the caller to re-route.
    ReRouteNeeded,
    /// A new route was installed after a period off the route.
    ReRouteDone,
    /// On the route but travelling the wrong way along it.
    TurnRound,
    /// On the route and within the arrival radius of its end.
    Arrival,
}

/// What happened to the navigator, used to drive [`NavigationState`] changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NavigationEvent {
    RouteInstalled,
    RouteCleared,
    /// A fix matched the route, heading along it.
    OnRoute,
    /// A fix matched the route, heading against it.
    WrongWay,
    Arrived,
    /// Off the route for longer than both tolerances.
    LeftRoute,
    /// A fix did not match a freshly installed route.
    PositionUnmatched,
    ReRouteRequired,
    ReRouted,
}

impl NavigationState {
    /// The state reached from `self` on `event`, or `None` when the transition
    /// is not allowed.
    pub fn transition(self, event: NavigationEvent) -> Option<NavigationState> {
        use NavigationEvent as E;
        use NavigationState as S;

        let next = match (self, event) {
            (_, E::RouteCleared) => S::None,
            (_, E::RouteInstalled) => S::NoPosition,

            (S::None, _) => return None,

            (S::ReRouteNeeded, E::ReRouteRequired) => S::ReRouteNeeded,
            (S::ReRouteNeeded, E::ReRouted) => S::ReRouteDone,
            (S::ReRouteNeeded, _) => return None,

            (S::OffRoute, E::ReRouteRequired) => S::ReRouteNeeded,
            (S::OffRoute, E::ReRouted) => S::ReRouteDone,
            (S::ReRouteDone, E::PositionUnmatched) => S::NoPosition,

            (_, E::OnRoute) => S::Turn,
            (_, E::WrongWay) => S::TurnRound,
            (_, E::Arrived) => S::Arrival,
            (_, E::LeftRoute) => S::OffRoute,

            _ => return None,
        };

        Some(next)
    }

    /// States in which the navigator reports turns.
    pub fn has_turns(self) -> bool {
        matches!(self, NavigationState::Turn | NavigationState::Arrival)
    }
}
