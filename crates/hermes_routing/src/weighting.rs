use crate::{
    arc_attributes::{AccessFlags, ArcAttributes},
    constants::{KMH_TO_MS, MIN_DESIRABILITY_KMH},
    profile::RouteProfile,
    turn::{Turn, TurnType},
};

/// Where an arc lies within a route leg. Roads closed to through traffic
/// may still be used to leave the start or reach the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcPosition {
    First,
    Interior,
    Last,
    Only,
}

impl ArcPosition {
    pub fn new(is_first: bool, is_last: bool) -> Self {
        match (is_first, is_last) {
            (true, true) => ArcPosition::Only,
            (true, false) => ArcPosition::First,
            (false, true) => ArcPosition::Last,
            (false, false) => ArcPosition::Interior,
        }
    }

    pub fn is_route_end(self) -> bool {
        self != ArcPosition::Interior
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcCost {
    pub admissible: bool,
    /// Usable only because the arc starts or ends the route.
    pub restricted: bool,
    /// Traversal time in seconds.
    pub time: f64,
    /// Search weight; equal to the time unless bonuses or penalties apply.
    pub weight: f64,
}

impl ArcCost {
    pub const INADMISSIBLE: ArcCost = ArcCost {
        admissible: false,
        restricted: false,
        time: f64::INFINITY,
        weight: f64::INFINITY,
    };
}

/// Cost of traversing an arc of `length` meters with the given profile.
pub fn cost(
    attributes: &ArcAttributes,
    length: f64,
    profile: &RouteProfile,
    position: ArcPosition,
) -> ArcCost {
    let class = attributes.road_class;
    let mut restricted = false;

    let blocking = attributes.restrictions
        & profile.vehicle.access_flags
        & !profile.restriction_override[class.index()];
    if !blocking.is_empty() {
        // Private roads may start or end a route; driving against a one-way road never may.
        if blocking.contains(AccessFlags::WRONG_WAY) || !position.is_route_end() {
            return ArcCost::INADMISSIBLE;
        }
        restricted = true;
    }

    let (mut speed, bonus) = profile.speed_and_bonus(class, attributes.gradient);
    if let Some(limit) = attributes.known_speed_limit() {
        speed = speed.min(limit);
    }
    if speed <= 0.0 {
        return ArcCost::INADMISSIBLE;
    }

    let mut desirability = speed + bonus;
    if desirability <= 0.0 && !profile.shortest {
        if !position.is_route_end() {
            return ArcCost::INADMISSIBLE;
        }
        restricted = true;
        desirability = MIN_DESIRABILITY_KMH;
    }

    let time = length / (speed * KMH_TO_MS);

    let weight = if profile.shortest {
        if profile.shortest_by_time { time } else { length }
    } else {
        let mut weight = length / (desirability * KMH_TO_MS);
        if attributes.toll {
            if profile.toll_penalty >= 1.0 {
                return ArcCost::INADMISSIBLE;
            }
            weight /= 1.0 - profile.toll_penalty;
        }
        weight
    };

    ArcCost {
        admissible: true,
        restricted,
        time,
        weight,
    }
}

pub trait Weighting {
    fn arc_cost(&self, attributes: &ArcAttributes, length: f64, position: ArcPosition) -> ArcCost;

    fn can_access(&self, attributes: &ArcAttributes, position: ArcPosition) -> bool {
        self.arc_cost(attributes, 0.0, position).admissible
    }

    /// Seconds spent at a junction making `turn`.
    fn junction_time(&self, turn: &Turn, drive_on_left: bool, traffic_light: bool) -> f64;
}

pub struct ProfileWeighting<'a> {
    profile: &'a RouteProfile,
}

impl<'a> ProfileWeighting<'a> {
    pub fn new(profile: &'a RouteProfile) -> Self {
        ProfileWeighting { profile }
    }

    pub fn profile(&self) -> &RouteProfile {
        self.profile
    }
}

impl Weighting for ProfileWeighting<'_> {
    fn arc_cost(&self, attributes: &ArcAttributes, length: f64, position: ArcPosition) -> ArcCost {
        cost(attributes, length, self.profile, position)
    }

    fn junction_time(&self, turn: &Turn, drive_on_left: bool, traffic_light: bool) -> f64 {
        let crosses_traffic = if drive_on_left {
            turn.turn_type.is_right()
        } else {
            turn.turn_type.is_left()
        };

        let turn_time = match turn.turn_type {
            TurnType::Around => self.profile.u_turn_time,
            turn_type if turn_type.is_slight() => 0.0,
            _ if crosses_traffic => self.profile.cross_traffic_turn_time,
            _ => self.profile.turn_time,
        };

        if traffic_light {
            turn_time + self.profile.traffic_light_time
        } else {
            turn_time
        }
    }
}
