//! CLI entry point for route-traffic.
//!
//! Plans or loads a route, matches live traffic against it, and prints the
//! traffic-adjusted estimate as JSON on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use route_traffic::analysis::{AnalysisRequest, Analyzer};
use route_traffic::config::Config;
use route_traffic::error::AnalysisError;
use route_traffic::osrm::OsrmClient;
use route_traffic::report::{AnalysisReport, SimpleSummary};
use route_traffic::store::PostgisNetwork;
use route_traffic::traffic::ItsTrafficClient;
use route_traffic::types::Waypoint;
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "route-traffic")]
#[command(about = "Estimate route travel time from live traffic", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Full,
    Simple,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a route given as waypoints or as a saved route document
    Analyze {
        /// Stop as LAT,LNG or LAT,LNG,NAME (repeat, at least two)
        #[arg(short, long = "waypoint", value_name = "LAT,LNG[,NAME]", value_parser = parse_waypoint)]
        waypoints: Vec<Waypoint>,

        /// JSON route document to analyze instead of planning one
        #[arg(long, value_name = "PATH", conflicts_with = "waypoints")]
        route_file: Option<PathBuf>,

        /// Name reported for the route
        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_enum, default_value_t = ReportFormat::Full)]
        format: ReportFormat,
    },
    /// Compare planned and traffic-adjusted time between two points
    Compare {
        #[arg(allow_negative_numbers = true)]
        start_lat: f64,
        #[arg(allow_negative_numbers = true)]
        start_lng: f64,
        #[arg(allow_negative_numbers = true)]
        end_lat: f64,
        #[arg(allow_negative_numbers = true)]
        end_lng: f64,

        #[arg(long, default_value = "Start")]
        start_name: String,

        #[arg(long, default_value = "End")]
        end_name: String,
    },
}

fn parse_waypoint(raw: &str) -> Result<Waypoint, String> {
    let mut parts = raw.splitn(3, ',').map(str::trim);
    let latitude = parts
        .next()
        .and_then(|lat| lat.parse::<f64>().ok())
        .ok_or_else(|| format!("'{}' has no valid latitude", raw))?;
    let longitude = parts
        .next()
        .and_then(|lng| lng.parse::<f64>().ok())
        .ok_or_else(|| format!("'{}' has no valid longitude", raw))?;
    Ok(match parts.next().filter(|name| !name.is_empty()) {
        Some(name) => Waypoint::named(latitude, longitude, name),
        None => Waypoint::new(latitude, longitude),
    })
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => match err.downcast::<AnalysisError>() {
            Ok(err) => {
                error!(error = %err, "Analysis failed");
                println!("{}", serde_json::to_string_pretty(&err.to_body())?);
                std::process::exit(1);
            }
            Err(other) => Err(other),
        },
    }
}

fn build_analyzer(config: &Config) -> Result<Analyzer<OsrmClient, ItsTrafficClient>> {
    let router = OsrmClient::new(config.osrm.clone()).context("building OSRM client")?;
    let feed = ItsTrafficClient::new(config.traffic.clone()).context("building traffic client")?;
    let network = PostgisNetwork::new(&config.store)?;

    Ok(Analyzer::new(router, feed, config.analysis.clone()).with_lookups(network.lookups()))
}

/// A route file that cannot be read or parsed is bad input, not a crash.
fn load_route_document(path: &Path) -> Result<Value, AnalysisError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AnalysisError::invalid_input(format!("reading {}: {}", path.display(), err)))?;
    serde_json::from_str(&content)
        .map_err(|err| AnalysisError::invalid_input(format!("route file is not JSON: {}", err)))
}

fn run(cli: Cli) -> Result<Value> {
    let config = Config::from_env()?;
    let analyzer = build_analyzer(&config)?;

    match cli.command {
        Commands::Analyze {
            waypoints,
            route_file,
            name,
            format,
        } => {
            let request = match route_file {
                Some(path) => AnalysisRequest::document(load_route_document(&path)?),
                None => AnalysisRequest::waypoints(waypoints),
            };
            let request = match name {
                Some(name) => request.named(name),
                None => request,
            };

            let analysis = analyzer.analyze(request)?;
            info!(
                route = %analysis.route_name,
                condition = analysis.condition().as_str(),
                "Analysis complete"
            );
            let output = match format {
                ReportFormat::Full => serde_json::to_value(AnalysisReport::from_analysis(&analysis))?,
                ReportFormat::Simple => serde_json::to_value(SimpleSummary::from_analysis(&analysis))?,
            };
            Ok(output)
        }
        Commands::Compare {
            start_lat,
            start_lng,
            end_lat,
            end_lng,
            start_name,
            end_name,
        } => {
            let comparison = analyzer.compare(
                Waypoint::named(start_lat, start_lng, start_name),
                Waypoint::named(end_lat, end_lng, end_name),
            )?;
            Ok(serde_json::to_value(comparison)?)
        }
    }
}
