use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{
    constants::{AHEAD_MAX_ANGLE, AROUND_TOLERANCE, BEAR_MAX_ANGLE, TURN_MAX_ANGLE},
    geometry::normalize_angle,
};

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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TurnType {
    #[default]
    None,
    Ahead,
    BearRight,
    Right,
    SharpRight,
    Around,
    SharpLeft,
    Left,
    BearLeft,
}

impl TurnType {
    /// Classifies a turn angle in degrees; negative angles turn left.
    pub fn from_angle(angle: f64) -> TurnType {
        let angle = normalize_angle(angle);
        let magnitude = angle.abs();
        let left = angle < 0.0;

        if magnitude >= 180.0 - AROUND_TOLERANCE {
            TurnType::Around
        } else if magnitude <= AHEAD_MAX_ANGLE {
            TurnType::Ahead
        } else if magnitude <= BEAR_MAX_ANGLE {
            if left { TurnType::BearLeft } else { TurnType::BearRight }
        } else if magnitude <= TURN_MAX_ANGLE {
            if left { TurnType::Left } else { TurnType::Right }
        } else if left {
            TurnType::SharpLeft
        } else {
            TurnType::SharpRight
        }
    }

    pub fn is_left(self) -> bool {
        matches!(self, TurnType::BearLeft | TurnType::Left | TurnType::SharpLeft)
    }

    pub fn is_right(self) -> bool {
        matches!(self, TurnType::BearRight | TurnType::Right | TurnType::SharpRight)
    }

    /// Slight turns and going ahead take no extra junction time.
    pub fn is_slight(self) -> bool {
        matches!(
            self,
            TurnType::None | TurnType::Ahead | TurnType::BearLeft | TurnType::BearRight
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoundaboutState {
    #[default]
    None,
    Enter,
    Continue,
    Exit,
}

impl RoundaboutState {
    pub fn from_flags(incoming_roundabout: bool, outgoing_roundabout: bool) -> Self {
        match (incoming_roundabout, outgoing_roundabout) {
            (false, false) => RoundaboutState::None,
            (false, true) => RoundaboutState::Enter,
            (true, true) => RoundaboutState::Continue,
            (true, false) => RoundaboutState::Exit,
        }
    }
}

/// The navigation decision at a junction: the turn taken from the incoming
/// road onto the outgoing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Turn {
    pub turn_type: TurnType,
    /// The turn continues the current road and needs no announcement.
    pub continuation: bool,
    pub roundabout_state: RoundaboutState,
    /// Degrees in (-180, 180]: 0 is straight ahead, negative is left.
    pub angle: f64,
    /// Incoming direction in degrees anticlockwise from map east.
    pub in_direction: f64,
    /// Outgoing direction in degrees anticlockwise from map east.
    pub out_direction: f64,
    /// Exit to take on a roundabout, counting from 1.
    pub exit_number: u32,
    /// Number of choices at the junction; zero when unknown.
    pub choices: u32,
    pub left_alternatives: u32,
    pub right_alternatives: u32,
    /// Another exit lies within 22.5 degrees of the one taken.
    pub is_fork: bool,
    /// The turn leaves for a lower-status road.
    pub turn_off: bool,
    pub junction_name: String,
    pub junction_ref: String,
}

impl Default for Turn {
    fn default() -> Self {
        Turn {
            turn_type: TurnType::None,
            continuation: true,
            roundabout_state: RoundaboutState::None,
            angle: 0.0,
            in_direction: 0.0,
            out_direction: 0.0,
            exit_number: 0,
            choices: 0,
            left_alternatives: 0,
            right_alternatives: 0,
            is_fork: false,
            turn_off: false,
            junction_name: String::new(),
            junction_ref: String::new(),
        }
    }
}

impl Turn {
    /// Builds a turn from the incoming and outgoing directions (degrees
    /// anticlockwise from map east) and the junction layout.
    pub fn classify(
        in_direction: f64,
        out_direction: f64,
        choices: u32,
        left_alternatives: u32,
        right_alternatives: u32,
        is_fork: bool,
        turn_off: bool,
    ) -> Turn {
        let mut turn = Turn {
            in_direction,
            out_direction,
            choices,
            left_alternatives,
            right_alternatives,
            is_fork,
            turn_off,
            continuation: false,
            ..Default::default()
        };
        turn.set_angle(in_direction - out_direction);

        if turn.turn_type == TurnType::Ahead && (turn_off || (is_fork && choices == 2)) {
            turn.turn_type = turn.bear_towards_fewer_alternatives();
        }

        turn
    }

    /// Sets the angle and the classification it implies, leaving the rest unchanged.
    pub fn set_angle(&mut self, angle: f64) {
        self.angle = normalize_angle(angle);
        self.turn_type = TurnType::from_angle(self.angle);
    }

    fn bear_towards_fewer_alternatives(&self) -> TurnType {
        match self.left_alternatives.cmp(&self.right_alternatives) {
            std::cmp::Ordering::Greater => TurnType::BearRight,
            std::cmp::Ordering::Less => TurnType::BearLeft,
            std::cmp::Ordering::Equal if self.angle < 0.0 => TurnType::BearLeft,
            std::cmp::Ordering::Equal => TurnType::BearRight,
        }
    }

    pub fn is_none(&self) -> bool {
        self.turn_type == TurnType::None
    }
}
