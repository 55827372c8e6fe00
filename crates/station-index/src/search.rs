//! Linear-scan proximity search over a station slice
//!
//! Comparisons use the unrounded distance. Ties keep input order.

use crate::{haversine_km, Station, StationMatch};
use std::cmp::Ordering;

/// Closest station within `max_distance_km`, first in input order on ties
pub fn nearest(
    stations: &[Station],
    lat: f64,
    lng: f64,
    max_distance_km: f64,
) -> Option<StationMatch> {
    let mut best: Option<(&Station, f64)> = None;
    let mut min_distance = f64::INFINITY;

    for station in stations {
        let distance = haversine_km(lat, lng, station.lat, station.lng);
        if distance < min_distance && distance <= max_distance_km {
            min_distance = distance;
            best = Some((station, distance));
        }
    }

    best.map(|(station, distance)| StationMatch::new(station, distance))
}

/// Up to `count` stations within `max_distance_km`, closest first
pub fn nearest_n(
    stations: &[Station],
    lat: f64,
    lng: f64,
    count: usize,
    max_distance_km: f64,
) -> Vec<StationMatch> {
    let mut within: Vec<(&Station, f64)> = stations
        .iter()
        .map(|s| (s, haversine_km(lat, lng, s.lat, s.lng)))
        .filter(|(_, distance)| *distance <= max_distance_km)
        .collect();

    // sort_by is stable, so equal distances stay in input order
    within.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    within
        .into_iter()
        .take(count)
        .map(|(station, distance)| StationMatch::new(station, distance))
        .collect()
}
