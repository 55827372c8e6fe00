//! Dataset location resolution for the CLI

use station_index::{DatasetKind, DatasetSource, FileSource, HttpSource};
use tracing::warn;

pub const DEFAULT_STATIONS: &str = "noaa_stations_frontend.json";
pub const DEFAULT_CITIES: &str = "us_cities_with_stations.json";

/// File or HTTP source, picked from the station dataset location
pub enum CliSource {
    File(FileSource),
    Http(HttpSource),
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// City dataset used when none was named: the local default only pairs
/// with a local station file
pub fn default_cities(stations: &str) -> Option<&'static str> {
    (!is_url(stations)).then_some(DEFAULT_CITIES)
}

impl CliSource {
    /// The station location picks the source kind. A city location of the
    /// other kind is left unconfigured, since cities are optional.
    pub fn resolve(stations: &str, cities: Option<&str>) -> Self {
        let cities = cities.filter(|c| {
            let usable = is_url(c) == is_url(stations);
            if !usable {
                warn!(
                    "Ignoring city dataset {:?}: it must be the same kind of location as {:?}",
                    c, stations
                );
            }
            usable
        });

        if is_url(stations) {
            let source = HttpSource::new(stations);
            Self::Http(match cities {
                Some(c) => source.with_cities(c),
                None => source,
            })
        } else {
            let source = FileSource::new(stations);
            Self::File(match cities {
                Some(c) => source.with_cities(c),
                None => source,
            })
        }
    }
}

impl DatasetSource for CliSource {
    async fn fetch(&self, kind: DatasetKind) -> station_index::Result<Option<Vec<u8>>> {
        match self {
            Self::File(source) => source.fetch(kind).await,
            Self::Http(source) => source.fetch(kind).await,
        }
    }
}
