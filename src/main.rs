//! Command-line entry point for the trip planner.

use clap::Parser;
use log::{error, info};
use std::fs::File;
use std::io::BufReader;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use trip_planner::config::PlannerConfig;
use trip_planner::error::PlanError;
use trip_planner::network::RoadNetwork;
use trip_planner::oracle::{DistanceOracle, StraightLineOracle};
use trip_planner::problem::{Coordinate, TripRequest};
use trip_planner::solution::Itinerary;
use trip_planner::utils::{format_itinerary, save_itinerary};
use trip_planner::TripPlanner;

#[derive(Debug, Parser)]
#[command(
    name = "trip-planner",
    version,
    about = "Plan a multi-day trip itinerary",
    long_about = "Spread destinations over the days of a trip and order each day's \
                  visits. The trip is read from a JSON request; distances come from a \
                  road network file, or from straight lines when none is given."
)]
struct Args {
    /// JSON file with the trip request
    #[arg(short, long, value_name = "path")]
    request: PathBuf,

    /// JSON road network (nodes and edges)
    #[arg(short, long, value_name = "path")]
    network: Option<PathBuf>,

    /// JSON planner configuration; defaults apply when omitted
    #[arg(short, long, value_name = "path")]
    config: Option<PathBuf>,

    /// Write the itinerary here instead of standard output
    #[arg(short, long, value_name = "path")]
    output: Option<PathBuf>,

    /// Override the clustering seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print a readable summary to standard error
    #[arg(long)]
    summary: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(err) = run(&args) {
        error!("{}", err);
        let detail = serde_json::json!({ "detail": err.to_string() });
        eprintln!("{}", detail);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => PlannerConfig::new(),
    };
    if let Some(seed) = args.seed {
        config = config.with_cluster_seed(seed);
    }

    info!("Loading request from: {}", args.request.display());
    let request: TripRequest = serde_json::from_reader(BufReader::new(File::open(&args.request)?))?;

    let itinerary = match &args.network {
        Some(path) => {
            info!("Loading road network from: {}", path.display());
            let network = RoadNetwork::from_file(path, config.max_snap_distance_m)?;
            info!(
                "Loaded network with {} nodes and {} edges",
                network.node_count(),
                network.edge_count()
            );
            plan_guarded(request, config, &network)?
        }
        None => {
            info!("No road network given, using straight-line distances");
            let points: Vec<Coordinate> = request.places().into_iter().map(|(_, c)| c).collect();
            let oracle = StraightLineOracle::new(points);
            plan_guarded(request, config, &oracle)?
        }
    };

    if args.summary {
        eprint!("{}", format_itinerary(&itinerary));
    }

    match &args.output {
        Some(path) => {
            info!("Saving itinerary to: {}", path.display());
            save_itinerary(&itinerary, path)?;
        }
        None => println!("{}", serde_json::to_string_pretty(&itinerary)?),
    }

    Ok(())
}

/// Plan a trip, turning a panic anywhere in the pipeline into an internal error.
fn plan_guarded<O: DistanceOracle + ?Sized>(
    request: TripRequest,
    config: PlannerConfig,
    oracle: &O,
) -> Result<Itinerary, PlanError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        TripPlanner::new(request, config, oracle)?.run()
    }));

    match outcome {
        Ok(result) => result,
        Err(_) => Err(PlanError::Internal("planner aborted unexpectedly".to_string())),
    }
}
