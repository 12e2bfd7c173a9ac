use hermes_routing::geopoint::GeoPoint;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

const MS_TO_KMH: f64 = 3.6;

/// A position report from a receiver. Only the position is required.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationFix {
    pub time: Option<Timestamp>,
    pub position: GeoPoint,
    /// km/h
    pub speed: Option<f64>,
    /// Compass course in degrees clockwise from north.
    pub course: Option<f64>,
    /// Meters above sea level.
    pub height: Option<f64>,
}

impl NavigationFix {
    pub fn new(position: GeoPoint) -> Self {
        NavigationFix {
            position,
            ..Default::default()
        }
    }

    pub fn at(mut self, time: Timestamp) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_course(mut self, course: f64) -> Self {
        self.course = Some(course);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Fills in what the receiver left out: the time defaults to now, and
    /// course and speed come from the move since `previous`.
    pub fn completed(mut self, previous: Option<&NavigationFix>) -> NavigationFix {
        let time = *self.time.get_or_insert_with(Timestamp::now);

        let Some(previous) = previous else {
            return self;
        };
        let distance = previous.position.haversine_distance(&self.position);
        if distance <= 0.0 {
            return self;
        }

        if self.course.is_none() {
            self.course = Some(previous.position.bearing_to(&self.position));
        }
        if let (None, Some(previous_time)) = (self.speed, previous.time) {
            let seconds = time.duration_since(previous_time).as_secs_f64();
            if seconds > 0.0 {
                self.speed = Some(distance / seconds * MS_TO_KMH);
            }
        }

        self
    }

    /// Seconds from `earlier` to this fix; zero when either time is unknown.
    pub fn seconds_since(&self, earlier: Option<Timestamp>) -> f64 {
        match (self.time, earlier) {
            (Some(time), Some(earlier)) => time.duration_since(earlier).as_secs_f64(),
            _ => 0.0,
        }
    }
}
