use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::ride::{normalize_trips, Ride, TripRecord};
use crate::repository::storage::{read_json, write_json_atomic};

pub const CACHE_VERSION: u32 = 2;
const CACHE_FILE_NAME: &str = "rides.json";
const LEGACY_FILE_NAMES: [&str; 2] = ["rides_miles.json", "rides_km.json"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheSnapshot {
    pub version: u32,
    pub fetched_at: DateTime<Utc>,
    pub rides: Vec<Ride>,
}

impl CacheSnapshot {
    pub fn new(rides: Vec<Ride>) -> Self {
        Self {
            version: CACHE_VERSION,
            fetched_at: Utc::now(),
            rides,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }

    /// Without a TTL a snapshot never expires on its own.
    pub fn is_fresh(&self, ttl_hours: Option<u64>, now: DateTime<Utc>) -> bool {
        match ttl_hours {
            Some(hours) => match i64::try_from(hours).ok().and_then(Duration::try_hours) {
                Some(ttl) => self.age(now) < ttl,
                None => true,
            },
            None => true,
        }
    }
}

/// A per-unit cache file written by older versions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LegacySnapshot {
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    #[serde(default)]
    pub trips: Vec<TripRecord>,
}

impl LegacySnapshot {
    fn fetched_at(&self) -> DateTime<Utc> {
        let secs = self.timestamp.floor();
        let nanos = ((self.timestamp - secs) * 1e9) as u32;
        DateTime::from_timestamp(secs as i64, nanos).unwrap_or_default()
    }
}

/// Upgrades legacy per-unit snapshots into the shared format.
///
/// The snapshot holding the most trips wins, the newest one on ties. Its trips
/// are normalised like a fresh fetch.
pub fn migrate(legacy: Vec<LegacySnapshot>) -> Result<CacheSnapshot> {
    let chosen = legacy
        .into_iter()
        .max_by(|a, b| {
            a.trips
                .len()
                .cmp(&b.trips.len())
                .then(a.timestamp.total_cmp(&b.timestamp))
        })
        .ok_or_else(|| Error::NotFound("No legacy cache snapshot to migrate".into()))?;

    Ok(CacheSnapshot {
        version: CACHE_VERSION,
        fetched_at: chosen.fetched_at(),
        rides: normalize_trips(&chosen.trips),
    })
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CacheInfo {
    pub path: PathBuf,
    pub exists: bool,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub ride_count: usize,
}

#[derive(Clone, Debug)]
pub struct RideCache {
    dir: PathBuf,
}

impl RideCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE_NAME)
    }

    fn legacy_paths(&self) -> Vec<PathBuf> {
        LEGACY_FILE_NAMES
            .iter()
            .map(|name| self.dir.join(name))
            .filter(|path| path.exists())
            .collect()
    }

    fn read_current(&self) -> Result<Option<CacheSnapshot>> {
        let path = self.path();
        let snapshot: Option<CacheSnapshot> = read_json(&path)?;
        match snapshot {
            Some(s) if s.version > CACHE_VERSION => Err(Error::corrupt(
                path,
                format!("unsupported cache version {}", s.version),
            )),
            other => Ok(other),
        }
    }

    pub fn load(&self) -> Result<Option<CacheSnapshot>> {
        if let Some(snapshot) = self.read_current()? {
            debug!(rides = snapshot.rides.len(), "cache hit");
            for path in self.legacy_paths() {
                remove_if_exists(&path)?;
                debug!(path = %path.display(), "removed stale legacy cache");
            }
            return Ok(Some(snapshot));
        }

        let legacy_paths = self.legacy_paths();
        if legacy_paths.is_empty() {
            debug!("cache empty");
            return Ok(None);
        }

        let mut legacy = Vec::with_capacity(legacy_paths.len());
        for path in &legacy_paths {
            if let Some(snapshot) = read_json::<LegacySnapshot>(path)? {
                legacy.push(snapshot);
            }
        }
        let snapshot = migrate(legacy)?;
        self.save(&snapshot)?;
        for path in &legacy_paths {
            fs::remove_file(path)?;
        }
        info!(
            rides = snapshot.rides.len(),
            files = legacy_paths.len(),
            "migrated legacy cache"
        );
        Ok(Some(snapshot))
    }

    pub fn save(&self, snapshot: &CacheSnapshot) -> Result<()> {
        write_json_atomic(&self.path(), snapshot)?;
        info!(rides = snapshot.rides.len(), path = %self.path().display(), "cache saved");
        Ok(())
    }

    /// Removes the current and any legacy cache files. Returns whether anything was removed.
    pub fn clear(&self) -> Result<bool> {
        let mut removed = false;
        let mut paths = self.legacy_paths();
        paths.push(self.path());
        for path in paths {
            if remove_if_exists(&path)? {
                removed = true;
            }
        }
        Ok(removed)
    }

    pub fn info(&self) -> Result<CacheInfo> {
        let path = self.path();
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CacheInfo {
                    path,
                    exists: false,
                    size_bytes: 0,
                    modified: None,
                    fetched_at: None,
                    ride_count: 0,
                })
            }
            Err(e) => return Err(e.into()),
        };
        let snapshot = self.read_current()?;

        Ok(CacheInfo {
            path,
            exists: true,
            size_bytes: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            fetched_at: snapshot.as_ref().map(|s| s.fetched_at),
            ride_count: snapshot.map_or(0, |s| s.rides.len()),
        })
    }
}

fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
