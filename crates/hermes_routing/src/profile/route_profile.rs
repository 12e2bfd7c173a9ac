use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    arc_attributes::{AccessFlags, Gradient, RoadClass},
    constants::{GRADIENT_COUNT, ROAD_CLASS_COUNT},
};

use super::vehicle_type::VehicleType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RouteProfileType {
    #[default]
    #[strum(to_string = "car", serialize = "drive")]
    Car,
    Walk,
    #[strum(to_string = "cycle", serialize = "bicycle")]
    Cycle,
    Hike,
}

// Speeds in km/h, indexed by road class.
#[rustfmt::skip]
const CAR_SPEEDS: [f64; ROAD_CLASS_COUNT] = [
    110.0, 70.0, 90.0, 60.0, 70.0, 50.0, 60.0, 50.0,
    50.0, 40.0, 30.0, 10.0, 20.0, 0.0, 10.0, 0.0,
    10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 30.0, 20.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

#[rustfmt::skip]
const CAR_BONUSES: [f64; ROAD_CLASS_COUNT] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    0.0, 0.0, 0.0, -10.0, -5.0, 0.0, 0.0, 0.0,
    -5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

#[rustfmt::skip]
const WALK_SPEEDS: [f64; ROAD_CLASS_COUNT] = [
    0.0, 0.0, 0.0, 0.0, 4.5, 4.5, 4.5, 4.5,
    4.5, 4.5, 4.5, 4.5, 4.5, 4.5, 10.0, 10.0,
    4.5, 4.5, 4.5, 4.5, 4.5, 3.0, 4.5, 4.5,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

// Walking along quieter roads is pleasanter than along major ones.
#[rustfmt::skip]
const WALK_BONUSES: [f64; ROAD_CLASS_COUNT] = [
    0.0, 0.0, 0.0, 0.0, -1.0, -1.0, -1.0, -1.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0,
    0.5, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

#[rustfmt::skip]
const CYCLE_SPEEDS: [f64; ROAD_CLASS_COUNT] = [
    0.0, 0.0, 0.0, 0.0, 16.0, 16.0, 16.0, 16.0,
    16.0, 16.0, 16.0, 12.0, 16.0, 0.0, 10.0, 10.0,
    14.0, 18.0, 12.0, 0.0, 0.0, 0.0, 16.0, 12.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

#[rustfmt::skip]
const CYCLE_BONUSES: [f64; ROAD_CLASS_COUNT] = [
    0.0, 0.0, 0.0, 0.0, -3.0, -3.0, -2.0, -2.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

#[rustfmt::skip]
const CYCLE_GRADIENT_SPEEDS: [f64; GRADIENT_COUNT] = [16.0, 12.0, 8.0, 5.0, 18.0, 20.0, 22.0, 22.0];

#[rustfmt::skip]
const HIKE_SPEEDS: [f64; ROAD_CLASS_COUNT] = [
    0.0, 0.0, 0.0, 0.0, 4.0, 4.0, 4.0, 4.0,
    4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 10.0, 10.0,
    4.0, 4.0, 4.0, 4.0, 4.0, 2.0, 4.0, 4.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

#[rustfmt::skip]
const HIKE_BONUSES: [f64; ROAD_CLASS_COUNT] = [
    0.0, 0.0, 0.0, 0.0, -2.0, -2.0, -1.0, -1.0,
    -0.5, 0.0, -0.5, 1.0, 0.0, 0.0, 0.0, 0.0,
    0.0, 0.0, 2.0, 1.0, 1.0, 0.0, 0.0, 1.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

#[rustfmt::skip]
const HIKE_GRADIENT_SPEEDS: [f64; GRADIENT_COUNT] = [4.5, 3.5, 2.5, 1.5, 4.5, 4.0, 3.0, 2.0];

/// Cost and admissibility settings for a class of traveler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteProfile {
    pub name: String,
    pub vehicle: VehicleType,
    /// Speeds in km/h per road class.
    pub speed: [f64; ROAD_CLASS_COUNT],
    /// Notional km/h added to the speed to make a road class more or less desirable.
    pub bonus: [f64; ROAD_CLASS_COUNT],
    /// Restrictions ignored per road class.
    pub restriction_override: [AccessFlags; ROAD_CLASS_COUNT],
    /// Seconds for any turn that is not slight or ahead.
    pub turn_time: f64,
    /// Seconds for a turn within 11.75 degrees of 180.
    pub u_turn_time: f64,
    /// Seconds for a turn across the traffic.
    pub cross_traffic_turn_time: f64,
    /// Seconds of delay at traffic lights.
    pub traffic_light_time: f64,
    pub shortest: bool,
    pub shortest_by_time: bool,
    /// Between 0 (no penalty) and 1 (toll roads are never used).
    pub toll_penalty: f64,
    pub gradient_speed: [f64; GRADIENT_COUNT],
    pub gradient_bonus: [f64; GRADIENT_COUNT],
    /// One bit per road class affected by gradient speeds and bonuses.
    pub gradient_flags: u32,
}

impl Default for RouteProfile {
    fn default() -> Self {
        RouteProfile::new(RouteProfileType::Car)
    }
}

fn default_gradient_flags() -> u32 {
    u32::MAX
        & !(RoadClass::Steps.mask()
            | RoadClass::PassengerFerry.mask()
            | RoadClass::VehicularFerry.mask())
}

impl RouteProfile {
    pub fn new(profile_type: RouteProfileType) -> Self {
        let base = RouteProfile {
            name: profile_type.to_string(),
            vehicle: VehicleType::default(),
            speed: CAR_SPEEDS,
            bonus: CAR_BONUSES,
            restriction_override: [AccessFlags::empty(); ROAD_CLASS_COUNT],
            turn_time: 4.0,
            u_turn_time: 300.0,
            cross_traffic_turn_time: 12.0,
            traffic_light_time: 10.0,
            shortest: false,
            shortest_by_time: false,
            toll_penalty: 0.0,
            gradient_speed: [0.0; GRADIENT_COUNT],
            gradient_bonus: [0.0; GRADIENT_COUNT],
            gradient_flags: default_gradient_flags(),
        };

        match profile_type {
            RouteProfileType::Car => base,
            RouteProfileType::Walk => RouteProfile {
                vehicle: VehicleType::pedestrian(),
                speed: WALK_SPEEDS,
                bonus: WALK_BONUSES,
                turn_time: 0.0,
                u_turn_time: 0.0,
                cross_traffic_turn_time: 0.0,
                ..base
            },
            RouteProfileType::Cycle => RouteProfile {
                vehicle: VehicleType::bicycle(),
                speed: CYCLE_SPEEDS,
                bonus: CYCLE_BONUSES,
                turn_time: 2.0,
                u_turn_time: 10.0,
                cross_traffic_turn_time: 6.0,
                gradient_speed: CYCLE_GRADIENT_SPEEDS,
                ..base
            },
            RouteProfileType::Hike => RouteProfile {
                vehicle: VehicleType::pedestrian(),
                speed: HIKE_SPEEDS,
                bonus: HIKE_BONUSES,
                turn_time: 0.0,
                u_turn_time: 0.0,
                cross_traffic_turn_time: 0.0,
                gradient_speed: HIKE_GRADIENT_SPEEDS,
                ..base
            },
        }
    }

    /// Clamps out-of-range values instead of rejecting them.
    pub fn normalize(&mut self) {
        self.vehicle.normalize();

        for value in self
            .speed
            .iter_mut()
            .chain(self.gradient_speed.iter_mut())
        {
            if !value.is_finite() || *value < 0.0 {
                *value = 0.0;
            }
        }
        for value in self.bonus.iter_mut().chain(self.gradient_bonus.iter_mut()) {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
        for value in [
            &mut self.turn_time,
            &mut self.u_turn_time,
            &mut self.cross_traffic_turn_time,
            &mut self.traffic_light_time,
        ] {
            if !value.is_finite() || *value < 0.0 {
                *value = 0.0;
            }
        }

        self.toll_penalty = if self.toll_penalty.is_finite() {
            self.toll_penalty.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn is_gradient_sensitive(&self, road_class: RoadClass) -> bool {
        self.gradient_flags & road_class.mask() != 0
    }

    /// Speed and bonus for an arc. A class with no speed of its own stays
    /// unusable; otherwise non-zero gradient entries replace the class values
    /// on gradient-sensitive classes.
    pub fn speed_and_bonus(&self, road_class: RoadClass, gradient: Gradient) -> (f64, f64) {
        let mut speed = self.speed[road_class.index()];
        let mut bonus = self.bonus[road_class.index()];

        if speed > 0.0 && self.is_gradient_sensitive(road_class) {
            let gradient_speed = self.gradient_speed[gradient.index()];
            let gradient_bonus = self.gradient_bonus[gradient.index()];
            if gradient_speed != 0.0 {
                speed = gradient_speed;
            }
            if gradient_bonus != 0.0 {
                bonus = gradient_bonus;
            }
        }

        (speed, bonus)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_profile_types() {
        assert_eq!(RouteProfileType::from_str("drive").unwrap(), RouteProfileType::Car);
        assert_eq!(RouteProfileType::from_str("Bicycle").unwrap(), RouteProfileType::Cycle);

        let walk = RouteProfile::new(RouteProfileType::Walk);
        assert_eq!(walk.name, "walk");
        assert!(!walk.vehicle.obeys_one_way());
        assert_eq!(walk.speed[RoadClass::Motorway.index()], 0.0);
    }

    #[test]
    fn test_normalize_clamps_values() {
        let mut profile = RouteProfile {
            toll_penalty: 3.0,
            turn_time: -2.0,
            ..Default::default()
        };
        profile.speed[0] = f64::NAN;
        profile.normalize();

        assert_eq!(profile.toll_penalty, 1.0);
        assert_eq!(profile.turn_time, 0.0);
        assert_eq!(profile.speed[0], 0.0);
    }

    #[test]
    fn test_gradient_replaces_class_speed() {
        let cycle = RouteProfile::new(RouteProfileType::Cycle);

        assert_eq!(
            cycle.speed_and_bonus(RoadClass::ResidentialRoad, Gradient::Up2),
            (8.0, 0.0)
        );
        assert_eq!(
            cycle.speed_and_bonus(RoadClass::PrimaryRoad, Gradient::Down1),
            (20.0, -3.0)
        );
        // Classes with no speed and classes outside the gradient flags keep their own values.
        assert_eq!(
            cycle.speed_and_bonus(RoadClass::Motorway, Gradient::Up0),
            (0.0, 0.0)
        );
        assert_eq!(
            cycle.speed_and_bonus(RoadClass::VehicularFerry, Gradient::Up3),
            (10.0, 0.0)
        );
    }
}
