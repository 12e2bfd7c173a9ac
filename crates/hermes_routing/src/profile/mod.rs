pub mod route_profile;
pub mod vehicle_type;

pub use route_profile::{RouteProfile, RouteProfileType};
pub use vehicle_type::VehicleType;
