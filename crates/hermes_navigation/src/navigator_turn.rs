use hermes_routing::{
    arc_attributes::RoadClass,
    constants::KMH_TO_MS,
    geopoint::GeoPoint,
    profile::RouteProfile,
    route::RouteSegment,
    turn::{RoundaboutState, Turn, TurnType},
};
use serde::{Deserialize, Serialize};

/// Two turns closer than this are always merged when they can be.
const MIN_MERGE_DISTANCE: f64 = 10.0;
/// Otherwise turns are merged when the second comes within this many
/// seconds of the first at the profile's speed on the road between them.
const MERGE_TIME: f64 = 2.0;

/// A turn as announced to the traveller: the junction plus the roads on
/// either side and how far away it is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorTurn {
    pub turn: Turn,
    /// Meters from the current position, or from the previous turn for a second turn.
    pub distance: f64,
    /// Seconds, measured like `distance`.
    pub time: f64,
    pub from_name: String,
    pub from_ref: String,
    pub from_road_class: RoadClass,
    pub to_name: String,
    pub to_ref: String,
    pub to_road_class: RoadClass,
    pub position: GeoPoint,
    pub instructions: String,
}

impl NavigatorTurn {
    /// The turn from `previous` onto `next`. Without `next` this is the arrival
    /// at the end of `previous`.
    pub fn between(previous: &RouteSegment, next: Option<&RouteSegment>, distance: f64, time: f64) -> Self {
        let mut turn = NavigatorTurn {
            distance,
            time,
            from_name: previous.name.clone(),
            from_ref: previous.reference.clone(),
            from_road_class: previous.road_class,
            position: previous.path.last().copied().unwrap_or_default(),
            ..Default::default()
        };

        if let Some(next) = next {
            turn.turn = next.turn.clone();
            turn.to_name = next.name.clone();
            turn.to_ref = next.reference.clone();
            turn.to_road_class = next.road_class;
        }

        turn
    }

    pub fn is_arrival(&self) -> bool {
        self.turn.turn_type == TurnType::None
    }

    /// A turn the traveller needs to be told about. Going ahead, staying on
    /// a roundabout and plain continuations are not.
    pub fn is_significant(&self) -> bool {
        !self.turn.continuation
            && !matches!(self.turn.turn_type, TurnType::None | TurnType::Ahead)
            && self.turn.roundabout_state != RoundaboutState::Continue
    }

    fn merge_distance(&self, profile: &RouteProfile) -> f64 {
        let speed = profile.speed[self.to_road_class.index()] * KMH_TO_MS;
        (speed * MERGE_TIME).max(MIN_MERGE_DISTANCE)
    }

    /// Whether `following`, `following.distance` meters after this turn, adds
    /// nothing worth announcing separately.
    pub fn can_merge(&self, following: &NavigatorTurn, profile: &RouteProfile) -> bool {
        if self.turn.turn_off || following.turn.turn_off {
            return false;
        }
        if self.turn.roundabout_state == RoundaboutState::Continue
            || following.turn.roundabout_state == RoundaboutState::Continue
        {
            return false;
        }

        following.turn.turn_type == TurnType::Ahead
            && following.to_name == self.to_name
            && following.to_ref == self.to_ref
            && following.distance <= self.merge_distance(profile)
    }

    pub fn merge_if_possible(&mut self, following: &NavigatorTurn, profile: &RouteProfile) -> bool {
        if !self.can_merge(following, profile) {
            return false;
        }
        self.merge(following);
        true
    }

    /// Absorbs `following` into this turn. The turn keeps its classification
    /// and leaves on the road `following` leaves on.
    pub fn merge(&mut self, following: &NavigatorTurn) {
        self.turn.out_direction = following.turn.out_direction;
        self.turn.choices = self.turn.choices.max(following.turn.choices);
        self.to_name = following.to_name.clone();
        self.to_ref = following.to_ref.clone();
        self.to_road_class = following.to_road_class;
    }
}
