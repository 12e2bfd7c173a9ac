use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Args, ValueEnum};
use comfy_table::{Table, presets::UTF8_FULL};
use hermes_navigation::{
    async_router::{AsyncRouter, RouteRequest},
    instructions::route_instructions,
};
use hermes_routing::{
    geopoint::GeoPoint,
    profile::RouteProfileType,
    route::{Route, route_gpx::write_route_gpx, route_xml::write_route_xml},
    router::Router,
    routing::route_point::RouteCoordSet,
};
use tracing::info;

use crate::{inputs, parsers};

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Table,
    Xml,
    Gpx,
    Json,
}

#[derive(Args)]
pub struct RouteArgs {
    /// Road graph JSON file
    #[arg(short, long)]
    graph: PathBuf,

    /// Waypoint as `lng,lat`; repeat for each waypoint in order
    #[arg(short, long = "point", value_parser = parsers::parse_point, allow_hyphen_values = true, required = true)]
    points: Vec<GeoPoint>,

    #[arg(long, default_value = "car")]
    profile: RouteProfileType,

    /// Profile JSON file, used instead of --profile
    #[arg(long)]
    profile_file: Option<PathBuf>,

    /// Visit the waypoints in the order giving the lowest cost
    #[arg(long)]
    best: bool,

    /// Let the first waypoint move when reordering
    #[arg(long, requires = "best")]
    free_start: bool,

    /// Let the last waypoint move when reordering
    #[arg(long, requires = "best")]
    free_end: bool,

    /// Reordering iterations; 0 scales with the number of waypoints
    #[arg(long, short = 'n', default_value_t = 0)]
    iterations: usize,

    /// Give up on the search after this long (e.g., "30s", "PT1M")
    #[arg(short, long, value_parser = parsers::parse_duration, default_value = "30s")]
    timeout: jiff::SignedDuration,

    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Language for directions, such as `en`, `fr` or `de_CH`
    #[arg(long, default_value = "en")]
    locale: String,

    #[arg(long)]
    imperial: bool,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: RouteArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.points.len() >= 2, "At least two waypoints are needed");

    let profile = inputs::load_profile(args.profile, args.profile_file.as_deref())?;
    let graph = inputs::load_graph(&args.graph)?;
    let router = AsyncRouter::new(Arc::new(Router::new(graph)));

    let points = RouteCoordSet::from_points(args.points);
    let request = if args.best {
        RouteRequest::BestRoute {
            profile,
            points,
            start_fixed: !args.free_start,
            end_fixed: !args.free_end,
            iterations: args.iterations,
        }
    } else {
        RouteRequest::Route { profile, points }
    };

    let timeout = Duration::try_from(args.timeout).context("Invalid timeout")?;
    let route = match tokio::time::timeout(timeout, router.request(request, true)).await {
        Ok(route) => route?,
        Err(_) => {
            router.cancel();
            anyhow::bail!("No route found within {}", args.timeout);
        }
    };

    info!(
        distance = route.distance(),
        time = route.time(),
        segments = route.segments().len(),
        "Route found"
    );

    let output = match args.format {
        OutputFormat::Text => route_instructions(&route, &inputs::instruction_options(&args.locale, args.imperial)),
        OutputFormat::Table => segment_table(&route).to_string(),
        OutputFormat::Xml => write_route_xml(&route)?,
        OutputFormat::Gpx => write_route_gpx(&route)?,
        OutputFormat::Json => serde_json::to_string_pretty(&route)?,
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, output).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Route written to {}", path.display());
        }
        None => println!("{output}"),
    }

    Ok(())
}

fn segment_table(route: &Route) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "#", "Section", "Turn", "Road", "Class", "Distance (m)", "Time (s)",
    ]);

    for (index, segment) in route.segments().iter().enumerate() {
        let road = match (segment.name.is_empty(), segment.reference.is_empty()) {
            (false, false) => format!("{} ({})", segment.name, segment.reference),
            (false, true) => segment.name.clone(),
            _ => segment.reference.clone(),
        };
        table.add_row(vec![
            index.to_string(),
            segment.section.to_string(),
            segment.turn.turn_type.to_string(),
            road,
            segment.road_class.to_string(),
            format!("{:.0}", segment.distance),
            format!("{:.0}", segment.time),
        ]);
    }

    table.add_row(vec![
        String::new(),
        String::new(),
        String::new(),
        "Total".to_string(),
        String::new(),
        format!("{:.0}", route.distance()),
        format!("{:.0}", route.time()),
    ]);

    table
}
