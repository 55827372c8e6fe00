//! Dataset sources
//!
//! A source only delivers raw JSON bytes; parsing and validation live in
//! [`crate::loader`]. Sources are injected into [`crate::StationIndex`].

use crate::{Result, StationError};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which dataset is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Stations,
    Cities,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stations => write!(f, "station"),
            Self::Cities => write!(f, "city"),
        }
    }
}

/// Delivers the raw JSON payload of a dataset.
///
/// `Ok(None)` means the dataset is not configured for this source, which is
/// normal for cities and a load failure for stations.
pub trait DatasetSource: Send + Sync {
    fn fetch(&self, kind: DatasetKind) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;
}

/// JSON files on local disk
#[derive(Debug, Clone)]
pub struct FileSource {
    stations: PathBuf,
    cities: Option<PathBuf>,
}

impl FileSource {
    pub fn new(stations: impl Into<PathBuf>) -> Self {
        Self {
            stations: stations.into(),
            cities: None,
        }
    }

    pub fn with_cities(mut self, cities: impl Into<PathBuf>) -> Self {
        self.cities = Some(cities.into());
        self
    }

    fn path(&self, kind: DatasetKind) -> Option<&Path> {
        match kind {
            DatasetKind::Stations => Some(self.stations.as_path()),
            DatasetKind::Cities => self.cities.as_deref(),
        }
    }
}

impl DatasetSource for FileSource {
    async fn fetch(&self, kind: DatasetKind) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.path(kind) else {
            return Ok(None);
        };
        debug!("Reading {} dataset from {:?}", kind, path);

        let bytes = tokio::fs::read(path).await.map_err(|source| StationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(bytes))
    }
}

/// JSON documents served over HTTP(S)
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    stations_url: String,
    cities_url: Option<String>,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new(stations_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), stations_url)
    }

    pub fn with_client(client: reqwest::Client, stations_url: impl Into<String>) -> Self {
        Self {
            client,
            stations_url: stations_url.into(),
            cities_url: None,
        }
    }

    pub fn with_cities(mut self, cities_url: impl Into<String>) -> Self {
        self.cities_url = Some(cities_url.into());
        self
    }
}

#[cfg(feature = "http")]
impl DatasetSource for HttpSource {
    async fn fetch(&self, kind: DatasetKind) -> Result<Option<Vec<u8>>> {
        let url = match kind {
            DatasetKind::Stations => self.stations_url.as_str(),
            DatasetKind::Cities => match self.cities_url.as_deref() {
                Some(url) => url,
                None => return Ok(None),
            },
        };
        debug!("Fetching {} dataset from {}", kind, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| StationError::Http {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(StationError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|source| StationError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(Some(bytes.to_vec()))
    }
}

/// Payloads held in memory (embedded datasets, fixtures)
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    stations: Option<Vec<u8>>,
    cities: Option<Vec<u8>>,
}

impl StaticSource {
    pub fn new(stations: impl Into<Vec<u8>>) -> Self {
        Self {
            stations: Some(stations.into()),
            cities: None,
        }
    }

    pub fn with_cities(mut self, cities: impl Into<Vec<u8>>) -> Self {
        self.cities = Some(cities.into());
        self
    }
}

impl DatasetSource for StaticSource {
    async fn fetch(&self, kind: DatasetKind) -> Result<Option<Vec<u8>>> {
        Ok(match kind {
            DatasetKind::Stations => self.stations.clone(),
            DatasetKind::Cities => self.cities.clone(),
        })
    }
}
