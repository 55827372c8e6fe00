//! City-to-station mapping
//!
//! Builds the city dataset consumed by [`crate::StationIndex::get_city`]:
//! each seed city is paired with its closest station, with no radius limit.

use crate::search::nearest;
use crate::{is_valid_latitude, is_valid_longitude, City, CityStation, Station};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::collections::HashSet;
use tracing::{debug, warn};

/// A city to be mapped onto the station network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitySeed {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub population: Option<u64>,
}

/// Pair every seed with its nearest station.
///
/// Seeds with invalid coordinates or duplicate names are skipped. With an
/// empty station list the cities are still emitted, without a station.
pub fn map_cities(stations: &[Station], seeds: &[CitySeed]) -> Vec<City> {
    let mut seen = HashSet::new();
    let mut cities = Vec::with_capacity(seeds.len());

    for seed in seeds {
        if !is_valid_latitude(seed.lat) || !is_valid_longitude(seed.lng) {
            warn!("Skipping city {:?}: invalid coordinates", seed.name);
            continue;
        }
        if !seen.insert(seed.name.as_str()) {
            warn!("Skipping duplicate city {:?}", seed.name);
            continue;
        }

        let nearest_station = nearest(stations, seed.lat, seed.lng, f64::INFINITY).map(|m| {
            debug!(
                "{}: {} ({} km)",
                seed.name, m.station.name, m.distance_km
            );
            CityStation {
                id: m.station.id,
                name: m.station.name,
                distance_km: Some(m.distance_km),
                lat: Some(m.station.lat),
                lng: Some(m.station.lng),
                metadata: Map::new(),
            }
        });

        cities.push(City {
            name: seed.name.clone(),
            lat: Some(seed.lat),
            lng: Some(seed.lng),
            population: seed.population,
            nearest_station,
            metadata: Map::new(),
        });
    }

    cities
}
