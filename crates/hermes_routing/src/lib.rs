pub mod arc_attributes;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod geopoint;
pub mod graph;
pub mod location_index;
pub mod location_match;
pub mod profile;
pub mod route;
pub mod router;
pub mod routing;
pub mod snap;
pub mod stopwatch;
pub mod turn;
pub mod weighting;

#[cfg(test)]
pub(crate) mod test_utils;
