use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const KM_PER_MILE: f64 = 1.60934;
pub const FEET_PER_METER: f64 = 3.28084;
const SECONDS_PER_MINUTE: f64 = 60.0;
const MINUTES_PER_HOUR: f64 = 60.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    #[serde(rename = "miles")]
    Miles,
    #[serde(rename = "km")]
    Km,
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "ft")]
    Feet,
    #[serde(rename = "h")]
    Hours,
    #[serde(rename = "min")]
    Minutes,
    #[serde(rename = "s")]
    Seconds,
    #[serde(rename = "rides")]
    Rides,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Miles => "miles",
            Unit::Km => "km",
            Unit::Meters => "m",
            Unit::Feet => "ft",
            Unit::Hours => "h",
            Unit::Minutes => "min",
            Unit::Seconds => "s",
            Unit::Rides => "rides",
        }
    }

    pub fn is_distance(&self) -> bool {
        matches!(self, Unit::Miles | Unit::Km)
    }

    pub fn is_elevation(&self) -> bool {
        matches!(self, Unit::Meters | Unit::Feet)
    }

    pub fn is_time(&self) -> bool {
        matches!(self, Unit::Hours | Unit::Minutes | Unit::Seconds)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "miles" | "mile" | "mi" => Ok(Unit::Miles),
            "km" | "kilometers" | "kilometres" => Ok(Unit::Km),
            "m" | "meters" | "metres" => Ok(Unit::Meters),
            "ft" | "feet" => Ok(Unit::Feet),
            "h" | "hours" | "hr" => Ok(Unit::Hours),
            "min" | "minutes" => Ok(Unit::Minutes),
            "s" | "seconds" | "sec" => Ok(Unit::Seconds),
            "rides" | "ride" | "" => Ok(Unit::Rides),
            other => Err(Error::unsupported_unit(other, "any known unit")),
        }
    }
}

/// Multiplicative factor taking a value in `from` to `to`.
fn factor(from: Unit, to: Unit) -> Option<f64> {
    use Unit::*;
    if from == to {
        return Some(1.0);
    }
    match (from, to) {
        (Miles, Km) => Some(KM_PER_MILE),
        (Km, Miles) => Some(1.0 / KM_PER_MILE),
        (Meters, Feet) => Some(FEET_PER_METER),
        (Feet, Meters) => Some(1.0 / FEET_PER_METER),
        (Hours, Minutes) => Some(MINUTES_PER_HOUR),
        (Minutes, Hours) => Some(1.0 / MINUTES_PER_HOUR),
        (Minutes, Seconds) => Some(SECONDS_PER_MINUTE),
        (Seconds, Minutes) => Some(1.0 / SECONDS_PER_MINUTE),
        (Hours, Seconds) => Some(MINUTES_PER_HOUR * SECONDS_PER_MINUTE),
        (Seconds, Hours) => Some(1.0 / (MINUTES_PER_HOUR * SECONDS_PER_MINUTE)),
        _ => None,
    }
}

pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64> {
    if from == to {
        return Ok(value);
    }
    factor(from, to)
        .map(|f| value * f)
        .ok_or_else(|| Error::unsupported_unit(from, to))
}

/// The unit distances are displayed in. Elevation follows it (miles -> ft, km -> m).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Miles,
    Km,
}

impl DistanceUnit {
    pub fn unit(&self) -> Unit {
        match self {
            DistanceUnit::Miles => Unit::Miles,
            DistanceUnit::Km => Unit::Km,
        }
    }

    pub fn elevation_unit(&self) -> Unit {
        match self {
            DistanceUnit::Miles => Unit::Feet,
            DistanceUnit::Km => Unit::Meters,
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            DistanceUnit::Miles => DistanceUnit::Km,
            DistanceUnit::Km => DistanceUnit::Miles,
        }
    }

    /// Converts a canonical kilometre value into this unit.
    pub fn from_km(&self, km: f64) -> f64 {
        match self {
            DistanceUnit::Km => km,
            DistanceUnit::Miles => km / KM_PER_MILE,
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.unit().symbol())
    }
}

impl FromStr for DistanceUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.parse::<Unit>()? {
            Unit::Miles => Ok(DistanceUnit::Miles),
            Unit::Km => Ok(DistanceUnit::Km),
            other => Err(Error::unsupported_unit(other, "miles or km")),
        }
    }
}

impl TryFrom<Unit> for DistanceUnit {
    type Error = Error;

    fn try_from(unit: Unit) -> Result<Self> {
        match unit {
            Unit::Miles => Ok(DistanceUnit::Miles),
            Unit::Km => Ok(DistanceUnit::Km),
            other => Err(Error::unsupported_unit(other, "miles or km")),
        }
    }
}
