pub const ROAD_CLASS_COUNT: usize = 32;
pub const GRADIENT_COUNT: usize = 8;

pub const KMH_TO_MS: f64 = 1.0 / 3.6;

// Turn classification boundaries, in degrees of absolute turn angle.
pub(crate) const AHEAD_MAX_ANGLE: f64 = 15.0;
pub(crate) const BEAR_MAX_ANGLE: f64 = 45.0;
pub(crate) const TURN_MAX_ANGLE: f64 = 120.0;
/// A turn within 1/32 of a circle of 180 degrees is a U-turn.
pub const AROUND_TOLERANCE: f64 = 11.75;

/// An alternative within this many degrees of the chosen exit makes the junction a fork.
pub(crate) const FORK_ANGLE: f64 = 22.5;

/// Speed used to weight arcs whose speed plus bonus is not positive but which
/// are allowed at the start or end of a route.
pub(crate) const MIN_DESIRABILITY_KMH: f64 = 1.0;

pub(crate) const MAX_ROUTE_DISTANCE: f64 = u32::MAX as f64;
pub(crate) const MAX_ROUTE_TIME: f64 = u32::MAX as f64;

/// A position this far behind the previous position along the route is still
/// matched to the route.
pub(crate) const BACKTRACK_TOLERANCE: f64 = 10.0;

pub const MIN_BEST_ROUTE_ITERATIONS: usize = 16;
pub const MAX_BEST_ROUTE_ITERATIONS: usize = 256;

pub(crate) const SEARCH_CANCEL_CHECK_INTERVAL: usize = 1024;
