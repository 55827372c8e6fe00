//! Station index with single-flight loading
//!
//! The dataset lives behind a [`tokio::sync::OnceCell`]: the first caller
//! runs the load, concurrent callers wait on that same attempt, and once it
//! succeeds the collections are never touched again. A failed attempt
//! leaves the cell empty so the next caller retries.

use crate::cities::{map_cities, CitySeed};
use crate::coverage::CoverageReport;
use crate::loader::{parse_cities, parse_stations};
use crate::search::{nearest, nearest_n};
use crate::source::{DatasetKind, DatasetSource};
use crate::stats::NetworkStats;
use crate::{City, Result, Station, StationError, StationMatch};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Index configuration
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Upper bound on a single dataset fetch
    pub fetch_timeout: Duration,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Loaded, immutable collections
#[derive(Debug)]
struct Dataset {
    stations: Vec<Station>,
    cities: Vec<City>,
    city_lookup: HashMap<String, usize>,
    loaded_at: DateTime<Utc>,
}

/// Worldwide station index over an injected dataset source
pub struct StationIndex<S> {
    source: S,
    config: IndexConfig,
    dataset: OnceCell<Dataset>,
}

impl<S: DatasetSource> StationIndex<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, IndexConfig::default())
    }

    pub fn with_config(source: S, config: IndexConfig) -> Self {
        Self {
            source,
            config,
            dataset: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.initialized()
    }

    /// Load the datasets if not already loaded.
    ///
    /// Station data is mandatory; city data is best-effort and an
    /// unavailable city dataset leaves the index with no cities.
    pub async fn load(&self) -> Result<()> {
        self.dataset().await.map(|_| ())
    }

    async fn dataset(&self) -> Result<&Dataset> {
        self.dataset.get_or_try_init(|| self.fetch_dataset()).await
    }

    async fn fetch_dataset(&self) -> Result<Dataset> {
        info!("Loading station dataset...");

        let bytes = self
            .fetch(DatasetKind::Stations)
            .await?
            .ok_or(StationError::MissingStations)?;
        let stations = parse_stations(&bytes)?;

        let cities = match self.fetch_cities().await {
            Ok(Some(cities)) => cities,
            Ok(None) => {
                debug!("No city dataset configured");
                Vec::new()
            }
            Err(e) => {
                warn!("City dataset unavailable, continuing without cities: {}", e);
                Vec::new()
            }
        };

        let city_lookup = cities
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();

        info!(
            "Loaded {} stations and {} cities",
            stations.len(),
            cities.len()
        );

        Ok(Dataset {
            stations,
            cities,
            city_lookup,
            loaded_at: Utc::now(),
        })
    }

    async fn fetch_cities(&self) -> Result<Option<Vec<City>>> {
        match self.fetch(DatasetKind::Cities).await? {
            Some(bytes) => parse_cities(&bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn fetch(&self, kind: DatasetKind) -> Result<Option<Vec<u8>>> {
        let timeout = self.config.fetch_timeout;
        tokio::time::timeout(timeout, self.source.fetch(kind))
            .await
            .map_err(|_| StationError::Timeout {
                dataset: kind,
                timeout,
            })?
    }

    /// Closest station within `max_distance_km`.
    ///
    /// `Ok(None)` when nothing is in range or the index has no stations.
    pub async fn find_nearest_station(
        &self,
        lat: f64,
        lng: f64,
        max_distance_km: f64,
    ) -> Result<Option<StationMatch>> {
        let dataset = self.dataset().await?;

        if dataset.stations.is_empty() {
            warn!("No stations loaded");
            return Ok(None);
        }

        let found = nearest(&dataset.stations, lat, lng, max_distance_km);
        match &found {
            Some(m) => debug!("Found station: {} ({}km away)", m.station.name, m.distance_km),
            None => debug!("No station found within {}km", max_distance_km),
        }

        Ok(found)
    }

    /// Up to `count` stations within `max_distance_km`, closest first
    pub async fn find_nearest_stations(
        &self,
        lat: f64,
        lng: f64,
        count: usize,
        max_distance_km: f64,
    ) -> Result<Vec<StationMatch>> {
        let dataset = self.dataset().await?;
        let found = nearest_n(&dataset.stations, lat, lng, count, max_distance_km);
        debug!("Found {} stations within {}km", found.len(), max_distance_km);
        Ok(found)
    }

    /// Exact, case-sensitive city lookup
    pub async fn get_city(&self, name: &str) -> Result<Option<&City>> {
        let dataset = self.dataset().await?;
        Ok(dataset.city_lookup.get(name).map(|&i| &dataset.cities[i]))
    }

    pub async fn get_all_cities(&self) -> Result<&[City]> {
        Ok(&self.dataset().await?.cities)
    }

    pub async fn stations(&self) -> Result<&[Station]> {
        Ok(&self.dataset().await?.stations)
    }

    pub async fn get_stats(&self) -> Result<NetworkStats> {
        let dataset = self.dataset().await?;
        Ok(NetworkStats::from_stations(
            &dataset.stations,
            dataset.cities.len(),
            dataset.loaded_at,
        ))
    }

    pub async fn coverage_report(&self, lat: f64, lng: f64, radius_km: f64) -> Result<CoverageReport> {
        let dataset = self.dataset().await?;
        Ok(CoverageReport::build(&dataset.stations, lat, lng, radius_km))
    }

    /// Pair city seeds with their nearest loaded station
    pub async fn map_cities(&self, seeds: &[CitySeed]) -> Result<Vec<City>> {
        let dataset = self.dataset().await?;
        let cities = map_cities(&dataset.stations, seeds);
        info!("Mapped {} of {} cities to stations", cities.len(), seeds.len());
        Ok(cities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const STATIONS: &str = r#"[
        {"id": "A", "name": "Alpha", "lat": 40.0, "lng": -75.0, "country": "US"},
        {"id": "B", "name": "Bravo", "lat": 40.5, "lng": -75.0, "country": "US"},
        {"id": "C", "name": "Charlie", "lat": 45.5, "lng": -73.6, "country": "CA"}
    ]"#;

    const CITIES: &str = r#"[
        {"name": "Philadelphia, PA", "lat": 39.9526, "lng": -75.1652,
         "nearest_station": {"id": "A", "name": "Alpha", "distance_km": 15.0}}
    ]"#;

    /// Counts station fetches and stalls long enough for callers to pile up
    struct CountingSource {
        inner: StaticSource,
        station_fetches: Arc<AtomicUsize>,
        fail_first: bool,
        delay: Duration,
        city_delay: Duration,
    }

    impl CountingSource {
        fn new(inner: StaticSource) -> Self {
            Self {
                inner,
                station_fetches: Arc::new(AtomicUsize::new(0)),
                fail_first: false,
                delay: Duration::from_millis(50),
                city_delay: Duration::ZERO,
            }
        }
    }

    impl DatasetSource for CountingSource {
        async fn fetch(&self, kind: DatasetKind) -> Result<Option<Vec<u8>>> {
            if kind == DatasetKind::Stations {
                let n = self.station_fetches.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(self.delay).await;
                if self.fail_first && n == 0 {
                    return Err(StationError::Status {
                        url: "test://stations".to_string(),
                        status: 503,
                    });
                }
            } else {
                tokio::time::sleep(self.city_delay).await;
            }
            self.inner.fetch(kind).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_first_use_loads_once() {
        let source = CountingSource::new(StaticSource::new(STATIONS).with_cities(CITIES));
        let fetches = source.station_fetches.clone();
        let index = StationIndex::new(source);

        let (loaded, nearest, nearby, city) = tokio::join!(
            index.load(),
            index.find_nearest_station(40.01, -75.0, 5.0),
            index.find_nearest_stations(40.0, -75.0, 5, 200.0),
            index.get_city("Philadelphia, PA"),
        );

        loaded.unwrap();
        assert_eq!(nearest.unwrap().unwrap().station.id, "A");
        assert_eq!(nearby.unwrap().len(), 2);
        assert!(city.unwrap().is_some());
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        // Later calls are no-ops
        index.load().await.unwrap();
        index.get_stats().await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retryable() {
        let mut source = CountingSource::new(StaticSource::new(STATIONS));
        source.fail_first = true;
        let fetches = source.station_fetches.clone();
        let index = StationIndex::new(source);

        let err = index.load().await.unwrap_err();
        assert!(matches!(err, StationError::Status { status: 503, .. }));
        assert!(!index.is_loaded());

        let found = index.find_nearest_station(40.0, -75.0, 100.0).await.unwrap();
        assert_eq!(found.unwrap().station.id, "A");
        assert!(index.is_loaded());
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let mut source = CountingSource::new(StaticSource::new(STATIONS));
        source.delay = Duration::from_secs(5);
        let index = StationIndex::with_config(
            source,
            IndexConfig {
                fetch_timeout: Duration::from_millis(20),
            },
        );

        let err = index.load().await.unwrap_err();
        assert!(matches!(
            err,
            StationError::Timeout {
                dataset: DatasetKind::Stations,
                ..
            }
        ));
        assert!(!index.is_loaded());
    }

    #[tokio::test]
    async fn test_missing_station_dataset() {
        let index = StationIndex::new(StaticSource::default());
        let err = index.find_nearest_station(0.0, 0.0, 100.0).await.unwrap_err();
        assert!(matches!(err, StationError::MissingStations));
    }

    #[tokio::test]
    async fn test_bad_city_dataset_degrades() {
        let index = StationIndex::new(StaticSource::new(STATIONS).with_cities("<html>404</html>"));

        index.load().await.unwrap();
        assert!(index.get_all_cities().await.unwrap().is_empty());
        assert_eq!(index.stations().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_city_timeout_degrades() {
        let mut source = CountingSource::new(StaticSource::new(STATIONS).with_cities(CITIES));
        source.delay = Duration::ZERO;
        source.city_delay = Duration::from_secs(5);
        let index = StationIndex::with_config(
            source,
            IndexConfig {
                fetch_timeout: Duration::from_millis(200),
            },
        );

        index.load().await.unwrap();
        assert!(index.is_loaded());
        assert_eq!(index.stations().await.unwrap().len(), 3);
        assert!(index.get_all_cities().await.unwrap().is_empty());
        assert!(index.get_city("Philadelphia, PA").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_index() {
        let index = StationIndex::new(StaticSource::new("[]"));

        assert!(index.find_nearest_station(40.0, -75.0, 100.0).await.unwrap().is_none());
        assert!(index
            .find_nearest_station(0.0, 0.0, f64::INFINITY)
            .await
            .unwrap()
            .is_none());
        assert!(index
            .find_nearest_stations(40.0, -75.0, 5, 200.0)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_get_city_is_case_sensitive() {
        let index = StationIndex::new(StaticSource::new(STATIONS).with_cities(CITIES));

        let city = index.get_city("Philadelphia, PA").await.unwrap().unwrap();
        assert_eq!(city.nearest_station.as_ref().unwrap().id, "A");
        assert!(index.get_city("philadelphia, pa").await.unwrap().is_none());
        assert_eq!(index.get_all_cities().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stats_and_coverage() {
        let index = StationIndex::new(StaticSource::new(STATIONS).with_cities(CITIES));

        let stats = index.get_stats().await.unwrap();
        assert_eq!(stats.total_stations, 3);
        assert_eq!(stats.total_cities, 1);
        assert_eq!(stats.country_count, 2);
        assert_eq!(stats.top_countries[0].country, "US");
        assert_eq!(stats.top_countries[0].count, 2);

        let report = index.coverage_report(40.0, -75.0, 80.0).await.unwrap();
        assert_eq!(report.stations_found, 2);
        assert_eq!(report.nearest_station_km, Some(0.0));
    }

    #[tokio::test]
    async fn test_map_cities_through_index() {
        let index = StationIndex::new(StaticSource::new(STATIONS));
        let seeds = vec![CitySeed {
            name: "Montreal, QC".to_string(),
            lat: 45.5017,
            lng: -73.5673,
            population: Some(1_762_949),
        }];

        let cities = index.map_cities(&seeds).await.unwrap();
        assert_eq!(cities[0].nearest_station.as_ref().unwrap().id, "C");
    }
}
