use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, FromRepr};

use crate::constants::{GRADIENT_COUNT, ROAD_CLASS_COUNT};

// Layout of the packed attribute word supplied by the graph provider.
const ROAD_CLASS_MASK: u32 = 0x1F;
const GRADIENT_MASK: u32 = 0xE0;
const GRADIENT_SHIFT: u32 = 5;
const DIRECTION_MASK: u32 = 0x300;
const DIRECTION_SHIFT: u32 = 8;
const ROUNDABOUT_FLAG: u32 = 0x400;
const TOLL_FLAG: u32 = 0x800;
const SPEED_LIMIT_MASK: u32 = 0xFF000;
const SPEED_LIMIT_SHIFT: u32 = 12;
const ACCESS_MASK: u32 = 0xFFF0_0000;

bitflags! {
    /// Vehicle categories. On an arc these are the categories that may not use
    /// it; on a vehicle they are the categories the vehicle belongs to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AccessFlags: u32 {
        /// On an arc: travel against a one-way direction. On a vehicle: obeys one-way rules.
        const WRONG_WAY = 0x0010_0000;
        const BICYCLE = 0x0020_0000;
        const MOTORCYCLE = 0x0040_0000;
        const CAR = 0x0080_0000;
        const HIGH_OCCUPANCY = 0x0100_0000;
        const LIGHT_GOODS = 0x0200_0000;
        const HEAVY_GOODS = 0x0400_0000;
        const BUS = 0x0800_0000;
        const TAXI = 0x1000_0000;
        const PEDESTRIAN = 0x2000_0000;
        const EMERGENCY = 0x4000_0000;
        /// Weight, dimension or hazardous-material restrictions.
        const OTHER = 0x8000_0000;

        const MOTOR_VEHICLE = Self::MOTORCYCLE.bits()
            | Self::CAR.bits()
            | Self::HIGH_OCCUPANCY.bits()
            | Self::LIGHT_GOODS.bits()
            | Self::HEAVY_GOODS.bits()
            | Self::BUS.bits()
            | Self::TAXI.bits()
            | Self::EMERGENCY.bits();
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum RoadClass {
    Motorway = 0,
    MotorwayLink,
    TrunkRoad,
    TrunkRoadLink,
    PrimaryRoad,
    PrimaryRoadLink,
    SecondaryRoad,
    SecondaryRoadLink,
    TertiaryRoad,
    UnclassifiedRoad,
    ResidentialRoad,
    Track,
    ServiceRoad,
    PedestrianRoad,
    VehicularFerry,
    PassengerFerry,
    LivingStreet,
    Cycleway,
    Path,
    Footway,
    Bridleway,
    Steps,
    #[default]
    UnknownRoadType,
    UnpavedRoad,
    OtherRoadType0,
    OtherRoadType1,
    OtherRoadType2,
    OtherRoadType3,
    OtherRoadType4,
    OtherRoadType5,
    OtherRoadType6,
    OtherRoadType7,
}

impl RoadClass {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<RoadClass> {
        u8::try_from(index).ok().and_then(RoadClass::from_repr)
    }

    /// Bit of this class in a per-class mask such as the profile's gradient flags.
    pub fn mask(self) -> u32 {
        1 << self.index()
    }

    pub fn is_link(self) -> bool {
        matches!(
            self,
            RoadClass::MotorwayLink
                | RoadClass::TrunkRoadLink
                | RoadClass::PrimaryRoadLink
                | RoadClass::SecondaryRoadLink
        )
    }

    pub fn is_ferry(self) -> bool {
        matches!(self, RoadClass::VehicularFerry | RoadClass::PassengerFerry)
    }

    /// Importance of the road: lower is more important. Leaving a road for one
    /// with a higher status value is a turn-off.
    pub fn status(self) -> u8 {
        match self {
            RoadClass::Motorway => 0,
            RoadClass::MotorwayLink | RoadClass::TrunkRoad => 1,
            RoadClass::TrunkRoadLink | RoadClass::PrimaryRoad => 2,
            RoadClass::PrimaryRoadLink | RoadClass::SecondaryRoad => 3,
            RoadClass::SecondaryRoadLink | RoadClass::TertiaryRoad => 4,
            RoadClass::UnclassifiedRoad
            | RoadClass::ResidentialRoad
            | RoadClass::LivingStreet
            | RoadClass::UnknownRoadType => 5,
            RoadClass::ServiceRoad
            | RoadClass::Track
            | RoadClass::UnpavedRoad
            | RoadClass::VehicularFerry
            | RoadClass::PassengerFerry => 6,
            RoadClass::PedestrianRoad
            | RoadClass::Cycleway
            | RoadClass::Path
            | RoadClass::Footway
            | RoadClass::Bridleway
            | RoadClass::Steps => 7,
            RoadClass::OtherRoadType0
            | RoadClass::OtherRoadType1
            | RoadClass::OtherRoadType2
            | RoadClass::OtherRoadType3
            | RoadClass::OtherRoadType4
            | RoadClass::OtherRoadType5
            | RoadClass::OtherRoadType6
            | RoadClass::OtherRoadType7 => 8,
        }
    }
}

const _: () = assert!(RoadClass::OtherRoadType7 as usize + 1 == ROAD_CLASS_COUNT);

/// Average gradient of an arc: four steepness levels uphill and downhill.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Gradient {
    #[default]
    Up0 = 0,
    Up1,
    Up2,
    Up3,
    Down0,
    Down1,
    Down2,
    Down3,
}

const _: () = assert!(Gradient::Down3 as usize + 1 == GRADIENT_COUNT);

impl Gradient {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_downhill(self) -> bool {
        self.index() >= 4
    }

    /// The same steepness seen from the other end of the road.
    pub fn reversed(self) -> Gradient {
        Gradient::from_repr(((self.index() + 4) % GRADIENT_COUNT) as u8).unwrap_or_default()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum RoadDirection {
    #[default]
    DriveOnRight = 0,
    OneWayForward = 1,
    OneWayBackward = 2,
    DriveOnLeft = 3,
}

impl RoadDirection {
    pub fn is_one_way(self) -> bool {
        matches!(self, RoadDirection::OneWayForward | RoadDirection::OneWayBackward)
    }

    pub fn reversed(self) -> RoadDirection {
        match self {
            RoadDirection::OneWayForward => RoadDirection::OneWayBackward,
            RoadDirection::OneWayBackward => RoadDirection::OneWayForward,
            other => other,
        }
    }
}

/// Decoded form of the packed arc attribute word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcAttributes {
    pub road_class: RoadClass,
    pub gradient: Gradient,
    pub direction: RoadDirection,
    pub roundabout: bool,
    pub toll: bool,
    /// Known speed limit in km/h; zero when unknown.
    pub speed_limit: u8,
    pub restrictions: AccessFlags,
}

impl ArcAttributes {
    pub fn new(road_class: RoadClass) -> Self {
        ArcAttributes {
            road_class,
            ..Default::default()
        }
    }

    pub fn decode(word: u32) -> Self {
        ArcAttributes {
            road_class: RoadClass::from_repr((word & ROAD_CLASS_MASK) as u8).unwrap_or_default(),
            gradient: Gradient::from_repr(((word & GRADIENT_MASK) >> GRADIENT_SHIFT) as u8)
                .unwrap_or_default(),
            direction: RoadDirection::from_repr(((word & DIRECTION_MASK) >> DIRECTION_SHIFT) as u8)
                .unwrap_or_default(),
            roundabout: word & ROUNDABOUT_FLAG != 0,
            toll: word & TOLL_FLAG != 0,
            speed_limit: ((word & SPEED_LIMIT_MASK) >> SPEED_LIMIT_SHIFT) as u8,
            restrictions: AccessFlags::from_bits_truncate(word & ACCESS_MASK),
        }
    }

    pub fn encode(&self) -> u32 {
        let mut word = self.road_class as u32 & ROAD_CLASS_MASK;
        word |= ((self.gradient as u32) << GRADIENT_SHIFT) & GRADIENT_MASK;
        word |= ((self.direction as u32) << DIRECTION_SHIFT) & DIRECTION_MASK;
        if self.roundabout {
            word |= ROUNDABOUT_FLAG;
        }
        if self.toll {
            word |= TOLL_FLAG;
        }
        word |= ((self.speed_limit as u32) << SPEED_LIMIT_SHIFT) & SPEED_LIMIT_MASK;
        word | (self.restrictions.bits() & ACCESS_MASK)
    }

    pub fn known_speed_limit(&self) -> Option<f64> {
        (self.speed_limit > 0).then_some(self.speed_limit as f64)
    }

    pub fn drive_on_left(&self) -> bool {
        self.direction == RoadDirection::DriveOnLeft
    }

    pub fn with_direction(mut self, direction: RoadDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_gradient(mut self, gradient: Gradient) -> Self {
        self.gradient = gradient;
        self
    }

    pub fn with_speed_limit(mut self, speed_limit: u8) -> Self {
        self.speed_limit = speed_limit;
        self
    }

    pub fn with_toll(mut self, toll: bool) -> Self {
        self.toll = toll;
        self
    }

    pub fn with_roundabout(mut self, roundabout: bool) -> Self {
        self.roundabout = roundabout;
        self
    }

    pub fn with_restrictions(mut self, restrictions: AccessFlags) -> Self {
        self.restrictions = restrictions;
        self
    }
}
