use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::PathBuf;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::ride::{normalize_trips, Ride, TripRecord};
use crate::repository::cache::{CacheSnapshot, RideCache};
use crate::repository::traits::{RideRepository, RideSource};

/// Shapes accepted for an exported trips file.
#[derive(Deserialize)]
#[serde(untagged)]
enum TripExport {
    Bare(Vec<TripRecord>),
    Trips { trips: Vec<TripRecord> },
    Results { results: Vec<TripRecord> },
}

impl TripExport {
    fn into_trips(self) -> Vec<TripRecord> {
        match self {
            TripExport::Bare(trips) => trips,
            TripExport::Trips { trips } => trips,
            TripExport::Results { results } => results,
        }
    }
}

/// Reads trips from a JSON export of the tracking service.
#[derive(Clone, Debug)]
pub struct JsonExportSource {
    path: PathBuf,
}

impl JsonExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RideSource for JsonExportSource {
    fn fetch_trips(&self) -> Result<Vec<TripRecord>> {
        let file = File::open(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                Error::NotFound(format!("Trips export {} does not exist", self.path.display()))
            }
            _ => Error::Io(e),
        })?;
        let export: TripExport = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::corrupt(&self.path, e))?;
        let trips = export.into_trips();
        info!(trips = trips.len(), path = %self.path.display(), "read trips export");
        Ok(trips)
    }
}

/// Serves rides from the local cache, going to the source when the cache is
/// missing, stale or a refresh is forced.
pub struct CachedRideRepository<S: RideSource> {
    source: Option<S>,
    cache: RideCache,
    ttl_hours: Option<u64>,
}

impl<S: RideSource> CachedRideRepository<S> {
    pub fn new(source: Option<S>, cache: RideCache, ttl_hours: Option<u64>) -> Self {
        Self {
            source,
            cache,
            ttl_hours,
        }
    }

    pub fn cache(&self) -> &RideCache {
        &self.cache
    }

    fn refresh(&self, source: &S) -> Result<Vec<Ride>> {
        let trips = source.fetch_trips()?;
        let rides = normalize_trips(&trips);
        info!(trips = trips.len(), rides = rides.len(), "fetched rides");
        let snapshot = CacheSnapshot::new(rides);
        self.cache.save(&snapshot)?;
        Ok(snapshot.rides)
    }
}

impl<S: RideSource> RideRepository for CachedRideRepository<S> {
    fn fetch_rides(&self, force_refresh: bool) -> Result<Vec<Ride>> {
        let cached = if force_refresh { None } else { self.cache.load()? };

        match (cached, &self.source) {
            (Some(snapshot), _) if snapshot.is_fresh(self.ttl_hours, Utc::now()) => {
                debug!(rides = snapshot.rides.len(), "serving rides from cache");
                Ok(snapshot.rides)
            }
            (_, Some(source)) => self.refresh(source),
            (Some(snapshot), None) => {
                debug!("cache is stale but no ride source is configured");
                Ok(snapshot.rides)
            }
            (None, None) => Err(Error::Config(
                "No cached rides and no trips export configured (use --trips or set trips_file)"
                    .into(),
            )),
        }
    }
}
