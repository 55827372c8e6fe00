//! Weather Station Index
//!
//! Loads a worldwide weather station dataset (plus an optional city index)
//! once, and answers proximity queries against it. Resolved stations are the
//! upstream input to historical weather fetches and risk scoring.
//!
//! # Distance Model
//!
//! ```text
//! a = sin²(Δlat/2) + cos(lat₁)·cos(lat₂)·sin²(Δlng/2)
//! c = 2·atan2(√a, √(1−a))
//! d = R·c          R = 6371 km
//! ```
//!
//! | Query | Default | Result |
//! |-------|---------|--------|
//! | nearest station | 100 km radius | `Option<StationMatch>` |
//! | nearest stations | 5 within 200 km | `Vec<StationMatch>` |
//! | coverage report | 80 km radius | `CoverageReport` |
//!
//! Ties on exact distance always resolve to the station that appears first
//! in the loaded dataset.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::f64::consts::PI;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub mod cities;
pub mod coverage;
pub mod index;
pub mod loader;
pub mod search;
pub mod source;
pub mod stats;

pub use cities::CitySeed;
pub use coverage::CoverageReport;
pub use index::{IndexConfig, StationIndex};
pub use source::{DatasetKind, DatasetSource, FileSource, StaticSource};
#[cfg(feature = "http")]
pub use source::HttpSource;
pub use stats::{CountryCount, NetworkStats};

/// Mean Earth radius in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Search radius for a single nearest station
pub const DEFAULT_NEAREST_RADIUS_KM: f64 = 100.0;

/// Number of stations returned by a k-nearest query
pub const DEFAULT_NEARBY_COUNT: usize = 5;

/// Search radius for a k-nearest query
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 200.0;

/// Search radius for a coverage report (~50 miles)
pub const DEFAULT_COVERAGE_RADIUS_KM: f64 = 80.0;

#[derive(Error, Debug)]
pub enum StationError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error in {dataset} dataset: {source}")]
    Json {
        dataset: DatasetKind,
        #[source]
        source: serde_json::Error,
    },
    #[cfg(feature = "http")]
    #[error("Request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Dataset request for {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("Timed out after {timeout:?} loading {dataset} dataset")]
    Timeout {
        dataset: DatasetKind,
        timeout: Duration,
    },
    #[error("No station dataset configured")]
    MissingStations,
}

pub type Result<T> = std::result::Result<T, StationError>;

/// A weather station record. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub country: String,
    /// Extra dataset fields (elevation, data coverage, ...) passed through as-is
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// Station reference stored on a city record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityStation {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// A named city (e.g. "New York, NY") pre-mapped to its station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearest_station: Option<CityStation>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A station resolved by a proximity query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMatch {
    #[serde(flatten)]
    pub station: Station,
    /// Distance rounded to 0.1 km for display
    pub distance_km: f64,
    #[serde(skip)]
    exact_distance_km: f64,
}

impl StationMatch {
    pub(crate) fn new(station: &Station, exact_distance_km: f64) -> Self {
        Self {
            station: station.clone(),
            distance_km: round_to_tenth(exact_distance_km),
            exact_distance_km,
        }
    }

    /// Unrounded great-circle distance in km
    pub fn exact_distance_km(&self) -> f64 {
        self.exact_distance_km
    }
}

/// Validate latitude is in valid range
pub fn is_valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && lat.is_finite()
}

/// Validate longitude is in valid range
pub fn is_valid_longitude(lng: f64) -> bool {
    (-180.0..=180.0).contains(&lng) && lng.is_finite()
}

/// Haversine distance between two points in km
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1 * PI / 180.0;
    let lat2_rad = lat2 * PI / 180.0;
    let dlat = (lat2 - lat1) * PI / 180.0;
    let dlng = (lng2 - lng1) * PI / 180.0;

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Round a distance to one decimal place
pub fn round_to_tenth(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}
