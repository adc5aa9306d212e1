use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::time::parse_departed_at;
use crate::units::DistanceUnit;

const METERS_PER_KM: f64 = 1000.0;

/// A single ride in canonical units (km, m, s).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ride {
    pub id: u64,
    pub name: String,
    pub date: NaiveDate,
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub duration_s: f64,
}

impl Ride {
    pub fn new(
        id: u64,
        name: String,
        date: NaiveDate,
        distance_km: f64,
        elevation_gain_m: f64,
        duration_s: f64,
    ) -> Result<Self> {
        for (field, value) in [
            ("distance", distance_km),
            ("elevation_gain", elevation_gain_m),
            ("duration", duration_s),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidRide(format!(
                    "ride {} has invalid {}: {}",
                    id, field, value
                )));
            }
        }
        Ok(Self {
            id,
            name,
            date,
            distance_km,
            elevation_gain_m,
            duration_s,
        })
    }

    pub fn distance_in(&self, unit: DistanceUnit) -> f64 {
        unit.from_km(self.distance_km)
    }
}

/// A trip as exported by the ride-tracking service.
///
/// Distances and elevation are metres, times are seconds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TripRecord {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub departed_at: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default, alias = "elevation")]
    pub elevation_gain: Option<f64>,
    #[serde(default)]
    pub moving_time: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl TripRecord {
    pub fn to_ride(&self) -> Result<Ride> {
        let departed_at = self
            .departed_at
            .as_deref()
            .ok_or_else(|| Error::InvalidRide(format!("trip {} has no departure time", self.id)))?;
        let date = parse_departed_at(departed_at).ok_or_else(|| {
            Error::InvalidRide(format!(
                "trip {} has unparseable departure time '{}'",
                self.id, departed_at
            ))
        })?;
        let distance_m = self
            .distance
            .ok_or_else(|| Error::InvalidRide(format!("trip {} has no distance", self.id)))?;

        Ride::new(
            self.id,
            self.name.clone().unwrap_or_else(|| format!("Ride {}", self.id)),
            date,
            distance_m / METERS_PER_KM,
            self.elevation_gain.unwrap_or(0.0),
            self.moving_time.or(self.duration).unwrap_or(0.0),
        )
    }
}

/// Converts exported trips into rides.
///
/// Records that fail validation are rejected and logged; duplicate ids keep
/// the first occurrence.
pub fn normalize_trips(trips: &[TripRecord]) -> Vec<Ride> {
    let mut seen = HashSet::new();
    let mut rides = Vec::with_capacity(trips.len());

    for trip in trips {
        if !seen.insert(trip.id) {
            warn!(trip_id = trip.id, "duplicate trip skipped");
            continue;
        }
        match trip.to_ride() {
            Ok(ride) => rides.push(ride),
            Err(e) => warn!(trip_id = trip.id, "rejected trip: {}", e),
        }
    }

    rides
}
