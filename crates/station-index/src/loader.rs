//! Dataset parsing and validation

use crate::{
    is_valid_latitude, is_valid_longitude, City, CityStation, DatasetKind, Result, Station,
    StationError,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{info, warn};

/// Raw station record from JSON
#[derive(Debug, Deserialize)]
struct RawStation {
    id: Option<String>,
    name: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    country: Option<String>,
    #[serde(flatten)]
    metadata: Map<String, Value>,
}

/// Raw city record from JSON
#[derive(Debug, Deserialize)]
struct RawCity {
    name: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    population: Option<u64>,
    nearest_station: Option<CityStation>,
    #[serde(flatten)]
    metadata: Map<String, Value>,
}

/// Parse a station dataset (JSON array of station objects)
///
/// Records without coordinates, or with coordinates outside the valid
/// range, are skipped.
pub fn parse_stations(bytes: &[u8]) -> Result<Vec<Station>> {
    let raw: Vec<RawStation> = serde_json::from_slice(bytes).map_err(|source| StationError::Json {
        dataset: DatasetKind::Stations,
        source,
    })?;

    let mut stations = Vec::with_capacity(raw.len());
    let mut skipped = 0;

    for (i, station) in raw.into_iter().enumerate() {
        let (lat, lng) = match (station.lat, station.lng) {
            (Some(lat), Some(lng)) if is_valid_latitude(lat) && is_valid_longitude(lng) => {
                (lat, lng)
            }
            _ => {
                skipped += 1;
                continue;
            }
        };

        stations.push(Station {
            id: station.id.unwrap_or_else(|| format!("st-{}", i)),
            name: station.name.unwrap_or_else(|| "Unknown".to_string()),
            lat,
            lng,
            country: station.country.unwrap_or_else(|| "Unknown".to_string()),
            metadata: station.metadata,
        });
    }

    info!(
        "Parsed {} stations ({} skipped for missing or invalid coords)",
        stations.len(),
        skipped
    );

    Ok(stations)
}

/// Parse a city dataset (JSON array of city objects)
///
/// City names are lookup keys: the first record with a given name wins.
pub fn parse_cities(bytes: &[u8]) -> Result<Vec<City>> {
    let raw: Vec<RawCity> = serde_json::from_slice(bytes).map_err(|source| StationError::Json {
        dataset: DatasetKind::Cities,
        source,
    })?;

    let mut seen = HashSet::with_capacity(raw.len());
    let mut cities = Vec::with_capacity(raw.len());
    let mut skipped = 0;

    for city in raw {
        let Some(name) = city.name.filter(|n| !n.is_empty()) else {
            skipped += 1;
            continue;
        };

        if !seen.insert(name.clone()) {
            warn!("Duplicate city {:?} in city dataset, keeping first", name);
            skipped += 1;
            continue;
        }

        cities.push(City {
            name,
            lat: city.lat,
            lng: city.lng,
            population: city.population,
            nearest_station: city.nearest_station,
            metadata: city.metadata,
        });
    }

    info!("Parsed {} cities ({} skipped)", cities.len(), skipped);

    Ok(cities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stations() {
        let json = br#"[
            {"id": "USW00094728", "name": "NY CITY CENTRAL PARK", "lat": 40.7789, "lng": -73.9692, "country": "US", "elevation": 42.7},
            {"id": "NO-COORDS", "name": "No Coords", "country": "US"},
            {"id": "BAD-LAT", "name": "Bad Lat", "lat": 95.0, "lng": 10.0, "country": "CA"},
            {"name": "Anonymous", "lat": 51.5, "lng": -0.12}
        ]"#;

        let stations = parse_stations(json).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].id, "USW00094728");
        assert_eq!(stations[0].metadata["elevation"], Value::from(42.7));

        // Fallback ids use the record position in the input array
        assert_eq!(stations[1].id, "st-3");
        assert_eq!(stations[1].country, "Unknown");
    }

    #[test]
    fn test_parse_stations_rejects_non_array() {
        let err = parse_stations(br#"{"stations": []}"#).unwrap_err();
        assert!(matches!(
            err,
            StationError::Json {
                dataset: DatasetKind::Stations,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_cities_dedupes_names() {
        let json = br#"[
            {"name": "Denver, CO", "lat": 39.7392, "lng": -104.9903, "population": 715522,
             "nearest_station": {"id": "USW00023062", "name": "DENVER", "distance_miles": 4.1}},
            {"name": "Denver, CO", "lat": 0.0, "lng": 0.0},
            {"lat": 1.0, "lng": 1.0}
        ]"#;

        let cities = parse_cities(json).unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].population, Some(715522));

        let station = cities[0].nearest_station.as_ref().unwrap();
        assert_eq!(station.id, "USW00023062");
        assert_eq!(station.metadata["distance_miles"], Value::from(4.1));
    }
}
