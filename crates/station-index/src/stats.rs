//! Network coverage statistics

use crate::Station;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of countries listed in [`NetworkStats::top_countries`]
pub const TOP_COUNTRY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCount {
    pub country: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkStats {
    pub total_stations: usize,
    pub total_cities: usize,
    pub country_count: usize,
    /// Descending by station count, ties in first-seen order
    pub top_countries: Vec<CountryCount>,
    pub loaded_at: DateTime<Utc>,
}

impl NetworkStats {
    pub fn from_stations(stations: &[Station], total_cities: usize, loaded_at: DateTime<Utc>) -> Self {
        let by_country = count_by_country(stations);
        let country_count = by_country.len();

        Self {
            total_stations: stations.len(),
            total_cities,
            country_count,
            top_countries: by_country.into_iter().take(TOP_COUNTRY_LIMIT).collect(),
            loaded_at,
        }
    }
}

/// Station counts per country, sorted by count descending.
/// Countries with equal counts keep the order they were first seen in.
fn count_by_country(stations: &[Station]) -> Vec<CountryCount> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<CountryCount> = Vec::new();

    for station in stations {
        match position.get(station.country.as_str()) {
            Some(&i) => counts[i].count += 1,
            None => {
                position.insert(station.country.as_str(), counts.len());
                counts.push(CountryCount {
                    country: station.country.clone(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}
