pub(crate) mod junction;
#[allow(clippy::module_inception)]
pub mod route;
pub mod route_assembler;
pub mod route_gpx;
pub mod route_segment;
pub mod route_xml;

pub use route::Route;
pub use route_segment::{NearestSegmentInfo, RouteSegment};
