use std::path::PathBuf;

use clap::Args;
use hermes_routing::{
    geopoint::GeoPoint, location_match::LocationMatchParam, profile::RouteProfileType, router::Router,
};
use tracing::info;

use crate::{inputs, parsers};

#[derive(Args)]
pub struct NearestRoadArgs {
    /// Road graph JSON file
    #[arg(short, long)]
    graph: PathBuf,

    /// The point as `lng,lat`
    #[arg(short, long, value_parser = parsers::parse_point, allow_hyphen_values = true)]
    point: GeoPoint,

    /// Compass heading in degrees, preferring roads running this way
    #[arg(long)]
    heading: Option<f64>,

    /// Ignore roads farther than this many meters
    #[arg(long, default_value_t = 100.0)]
    max_distance: f64,

    #[arg(long, default_value = "car")]
    profile: RouteProfileType,

    /// Profile JSON file, used instead of --profile
    #[arg(long)]
    profile_file: Option<PathBuf>,
}

pub fn run(args: NearestRoadArgs) -> anyhow::Result<()> {
    let profile = inputs::load_profile(args.profile, args.profile_file.as_deref())?;
    let router = Router::new(inputs::load_graph(&args.graph)?);
    let params = LocationMatchParam {
        max_road_distance: args.max_distance,
        ..LocationMatchParam::default()
    };

    let Some(road) = router.nearest_road(&profile, &args.point, args.heading, &params) else {
        info!("No road within {} m", args.max_distance);
        return Ok(());
    };

    let name = match (road.name.is_empty(), road.reference.is_empty()) {
        (false, false) => format!("{} ({})", road.name, road.reference),
        (false, true) => road.name.clone(),
        (true, false) => road.reference.clone(),
        (true, true) => "unnamed road".to_string(),
    };
    println!(
        "{name}: {} at {:.1} m, heading {:.0}, nearest point {:.6},{:.6}{}",
        road.road_class,
        road.distance,
        road.heading,
        road.nearest_point.lng,
        road.nearest_point.lat,
        if road.one_way { ", one way" } else { "" },
    );

    Ok(())
}
