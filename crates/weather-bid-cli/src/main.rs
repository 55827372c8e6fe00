//! Weather Bid CLI
//!
//! Resolves weather stations for project sites and prices weather risk
//! into bids.
//!
//! Usage:
//!   weather-bid --stations noaa_stations_frontend.json nearest --lat 40.7128 --lng -74.0060
//!   weather-bid build-cities --seeds data/city_seeds.json --output us_cities_with_stations.json
//!   weather-bid bid --request bid_request.json

use anyhow::{Context, Result};
use bid_contingency::{BidContingencyEstimator, BidRequest};
use clap::{Parser, Subcommand};
use serde::Serialize;
use station_index::{
    CitySeed, IndexConfig, StationIndex, DEFAULT_COVERAGE_RADIUS_KM, DEFAULT_NEARBY_COUNT,
    DEFAULT_NEARBY_RADIUS_KM, DEFAULT_NEAREST_RADIUS_KM,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod source;

use source::{default_cities, CliSource, DEFAULT_STATIONS};

#[derive(Parser, Debug)]
#[command(
    name = "weather-bid",
    about = "Weather station lookup and bid contingency estimation"
)]
struct Args {
    /// Station dataset file or URL [env: STATION_DATASET]
    #[arg(short, long, global = true)]
    stations: Option<String>,

    /// City dataset file or URL [env: CITY_DATASET]
    #[arg(short, long, global = true)]
    cities: Option<String>,

    /// Dataset fetch timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout_sec: u64,

    /// Write JSON output to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Nearest station to a location
    Nearest {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value_t = DEFAULT_NEAREST_RADIUS_KM)]
        radius_km: f64,
    },
    /// Several nearest stations, closest first
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value_t = DEFAULT_NEARBY_COUNT)]
        count: usize,
        #[arg(long, default_value_t = DEFAULT_NEARBY_RADIUS_KM)]
        radius_km: f64,
    },
    /// Station coverage around a location
    Coverage {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value_t = DEFAULT_COVERAGE_RADIUS_KM)]
        radius_km: f64,
    },
    /// Look up a pre-mapped city by exact name (e.g. "New York, NY")
    City { name: String },
    /// List all pre-mapped cities
    Cities,
    /// Network statistics
    Stats,
    /// Map city seeds to their nearest stations and write a city dataset
    BuildCities {
        /// JSON array of {name, lat, lng, population?}
        #[arg(long)]
        seeds: PathBuf,
    },
    /// Estimate weather contingency for a bid request
    Bid {
        /// JSON {base_costs, project_params?, risk_analysis}
        #[arg(long)]
        request: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging (stderr, so JSON on stdout stays clean)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(args.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    let stations = args
        .stations
        .clone()
        .or_else(|| std::env::var("STATION_DATASET").ok())
        .unwrap_or_else(|| DEFAULT_STATIONS.to_string());
    let cities = args
        .cities
        .clone()
        .or_else(|| std::env::var("CITY_DATASET").ok())
        .or_else(|| default_cities(&stations).map(str::to_string));

    let index = StationIndex::with_config(
        CliSource::resolve(&stations, cities.as_deref()),
        IndexConfig {
            fetch_timeout: Duration::from_secs(args.timeout_sec),
        },
    );

    let estimator = BidContingencyEstimator::new();

    run(&index, &estimator, &args).await
}

/// Log directives used when `RUST_LOG` is unset
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "weather_bid=debug,station_index=debug,bid_contingency=debug"
    } else {
        "weather_bid=info,station_index=info,bid_contingency=info"
    }
}

/// The index loads lazily, so bid requests never touch the station datasets
async fn run(
    index: &StationIndex<CliSource>,
    estimator: &BidContingencyEstimator,
    args: &Args,
) -> Result<()> {
    let output = args.output.as_deref();

    match &args.command {
        Command::Nearest { lat, lng, radius_km } => {
            let found = index.find_nearest_station(*lat, *lng, *radius_km).await?;
            if found.is_none() {
                warn!("No station within {}km of {}, {}", radius_km, lat, lng);
            }
            emit(&found, output)
        }
        Command::Nearby {
            lat,
            lng,
            count,
            radius_km,
        } => {
            let found = index
                .find_nearest_stations(*lat, *lng, *count, *radius_km)
                .await?;
            info!("Found {} stations within {}km", found.len(), radius_km);
            emit(&found, output)
        }
        Command::Coverage { lat, lng, radius_km } => {
            let report = index.coverage_report(*lat, *lng, *radius_km).await?;
            emit(&report, output)
        }
        Command::City { name } => {
            let city = index.get_city(name).await?;
            if city.is_none() {
                warn!("City {:?} not found", name);
            }
            emit(&city, output)
        }
        Command::Cities => emit(&index.get_all_cities().await?, output),
        Command::Stats => {
            let stats = index.get_stats().await?;
            info!(
                "{} stations across {} countries, {} cities",
                stats.total_stations, stats.country_count, stats.total_cities
            );
            emit(&stats, output)
        }
        Command::BuildCities { seeds } => {
            let seeds: Vec<CitySeed> = read_json(seeds)?;
            let cities = index.map_cities(&seeds).await?;
            for city in &cities {
                if let Some(station) = &city.nearest_station {
                    info!(
                        "  {}: {} ({} km)",
                        city.name,
                        station.name,
                        station.distance_km.unwrap_or_default()
                    );
                }
            }
            emit(&cities, output)
        }
        Command::Bid { request } => {
            let request: BidRequest = read_json(request)?;
            let recommendation = estimator.compute(
                &request.base_costs,
                &request.project_params,
                &request.risk_analysis,
            )?;
            info!("{}", recommendation);
            emit(&recommendation, output)
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening {:?}", path))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing {:?}", path))
}

fn emit<T: Serialize + ?Sized>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            info!("Writing output to {:?}", path);
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, value)?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, value)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}
