use std::{path::PathBuf, sync::Arc};

use clap::Args;
use hermes_navigation::{
    navigation_fix::NavigationFix,
    navigation_state::NavigationState,
    navigator::Navigator,
    navigator_param::NavigatorParam,
    navigator_turn::NavigatorTurn,
    observer::NavigatorObserver,
};
use hermes_routing::{
    geopoint::GeoPoint, profile::RouteProfileType, route::Route, router::Router,
    routing::route_point::RouteCoordSet,
};
use parking_lot::Mutex;
use tracing::info;

use crate::{inputs, parsers};

#[derive(Args)]
pub struct NavigateArgs {
    /// Road graph JSON file
    #[arg(short, long)]
    graph: PathBuf,

    /// Waypoint as `lng,lat`; repeat for each waypoint in order
    #[arg(short, long = "point", value_parser = parsers::parse_point, allow_hyphen_values = true, required = true)]
    points: Vec<GeoPoint>,

    /// JSON array of fixes, each with a `position` and optional `time`, `speed`, `course` and `height`
    #[arg(short, long)]
    fixes: PathBuf,

    #[arg(long, default_value = "car")]
    profile: RouteProfileType,

    /// Profile JSON file, used instead of --profile
    #[arg(long)]
    profile_file: Option<PathBuf>,

    /// Navigator parameters JSON file
    #[arg(long)]
    params: Option<PathBuf>,

    /// Language for directions, such as `en`, `fr` or `de_CH`
    #[arg(long, default_value = "en")]
    locale: String,

    #[arg(long)]
    imperial: bool,
}

/// Prints each new instruction and logs everything else.
#[derive(Default)]
struct ConsoleObserver {
    last_instructions: Mutex<String>,
}

impl NavigatorObserver for ConsoleObserver {
    fn on_route(&self, route: Option<&Route>) {
        match route {
            Some(route) => info!(distance = route.distance(), time = route.time(), "New route"),
            None => info!("Route cleared"),
        }
    }

    fn on_turn(&self, first: &NavigatorTurn, second: Option<&NavigatorTurn>, _continuation: Option<&NavigatorTurn>) {
        let mut last = self.last_instructions.lock();
        if *last != first.instructions {
            println!("{}", first.instructions);
            last.clone_from(&first.instructions);
        }
        if let Some(second) = second {
            info!(turn = %second.turn.turn_type, distance = second.distance, "Followed by");
        }
    }

    fn on_state(&self, state: NavigationState) {
        info!(%state, "Navigation state");
    }
}

pub fn run(args: NavigateArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.points.len() >= 2, "At least two waypoints are needed");

    let profile = inputs::load_profile(args.profile, args.profile_file.as_deref())?;
    let params = match &args.params {
        Some(path) => inputs::load_json(path)?,
        None => NavigatorParam::default(),
    };
    let fixes: Vec<NavigationFix> = inputs::load_json(&args.fixes)?;
    let graph = inputs::load_graph(&args.graph)?;

    let observer: Arc<dyn NavigatorObserver> = Arc::new(ConsoleObserver::default());
    let mut navigator = Navigator::new(Arc::new(Router::new(graph)), profile)
        .with_params(params)
        .with_instruction_options(inputs::instruction_options(&args.locale, args.imperial));
    navigator.add_observer(&observer);

    navigator.start_navigation(RouteCoordSet::from_points(args.points))?;

    info!(fixes = fixes.len(), "Replaying fixes");
    for fix in fixes {
        if navigator.navigate(fix) == NavigationState::Arrival {
            break;
        }
    }

    info!(state = %navigator.state(), "Replay finished");
    Ok(())
}
