use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{navigate::NavigateArgs, nearest_road::NearestRoadArgs, route::RouteArgs};

mod inputs;
mod navigate;
mod nearest_road;
mod parsers;
mod route;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a route through waypoints and print its directions
    #[command(visible_alias = "r")]
    Route {
        #[command(flatten)]
        args: RouteArgs,
    },
    /// Replay a log of position fixes along a route
    #[command(visible_alias = "n")]
    Navigate {
        #[command(flatten)]
        args: NavigateArgs,
    },
    /// Find the road nearest to a point
    NearestRoad {
        #[command(flatten)]
        args: NearestRoadArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Some(Commands::Route { args }) => route::run(args).await?,
        Some(Commands::Navigate { args }) => navigate::run(args)?,
        Some(Commands::NearestRoad { args }) => nearest_road::run(args)?,
        None => {}
    }

    Ok(())
}
