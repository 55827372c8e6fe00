//! Station coverage around a location

use crate::search::nearest_n;
use crate::{GeoPoint, Station, StationMatch};
use serde::Serialize;

/// Number of closest stations listed in a report
pub const COVERAGE_LIST_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub location: GeoPoint,
    pub radius_km: f64,
    pub stations_found: usize,
    /// Rounded distance to the closest station, if any
    pub nearest_station_km: Option<f64>,
    pub stations: Vec<StationMatch>,
}

impl CoverageReport {
    pub fn build(stations: &[Station], lat: f64, lng: f64, radius_km: f64) -> Self {
        let mut within = nearest_n(stations, lat, lng, usize::MAX, radius_km);
        let stations_found = within.len();
        let nearest_station_km = within.first().map(|m| m.distance_km);
        within.truncate(COVERAGE_LIST_LIMIT);

        Self {
            location: GeoPoint { lat, lng },
            radius_km,
            stations_found,
            nearest_station_km,
            stations: within,
        }
    }

    pub fn is_covered(&self) -> bool {
        self.stations_found > 0
    }
}
