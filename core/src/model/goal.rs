use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::input::expand_key;
use crate::units::{DistanceUnit, Unit};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Distance,
    RideCount,
    Elevation,
    Time,
    Frequency,
}

impl GoalType {
    pub const ALL: [GoalType; 5] = [
        GoalType::Distance,
        GoalType::RideCount,
        GoalType::Elevation,
        GoalType::Time,
        GoalType::Frequency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Distance => "distance",
            GoalType::RideCount => "ride_count",
            GoalType::Elevation => "elevation",
            GoalType::Time => "time",
            GoalType::Frequency => "frequency",
        }
    }

    /// Title used when the user does not give one, e.g. "Ride Count Goal".
    pub fn default_title(&self) -> String {
        let words: Vec<String> = self
            .as_str()
            .split('_')
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect();
        format!("{} Goal", words.join(" "))
    }

    pub fn default_unit(&self, display: DistanceUnit) -> Unit {
        match self {
            GoalType::Distance => display.unit(),
            GoalType::Elevation => Unit::Meters,
            GoalType::Time => Unit::Hours,
            GoalType::RideCount | GoalType::Frequency => Unit::Rides,
        }
    }

    pub fn accepts_unit(&self, unit: Unit) -> bool {
        match self {
            GoalType::Distance => unit.is_distance(),
            GoalType::Elevation => unit.is_elevation(),
            GoalType::Time => unit.is_time(),
            GoalType::RideCount | GoalType::Frequency => unit == Unit::Rides,
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let candidates: Vec<&str> = GoalType::ALL.iter().map(|t| t.as_str()).collect();
        let key = expand_key(&s.replace('-', "_"), &candidates)?;
        GoalType::ALL
            .into_iter()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| Error::Validation(format!("Unknown goal type: {}", s)))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub target: f64,
    pub unit: Unit,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(
        title: Option<String>,
        goal_type: GoalType,
        target: f64,
        unit: Unit,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| goal_type.default_title()),
            goal_type,
            target,
            unit,
            start_date,
            end_date,
            created_at: Utc::now(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn window_status(&self, today: NaiveDate) -> WindowStatus {
        if today < self.start_date {
            WindowStatus::Future
        } else if today > self.end_date {
            WindowStatus::Past
        } else {
            WindowStatus::Active
        }
    }

    /// Applies the fields present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: &GoalPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(target) = patch.target {
            self.target = target;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(start) = patch.start_date {
            self.start_date = start;
        }
        if let Some(end) = patch.end_date {
            self.end_date = end;
        }
    }

    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub target: Option<f64>,
    pub unit: Option<Unit>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl GoalPatch {
    pub fn is_empty(&self) -> bool {
        *self == GoalPatch::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    Active,
    Future,
    Past,
}

impl fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowStatus::Active => write!(f, "ACTIVE"),
            WindowStatus::Future => write!(f, "FUTURE"),
            WindowStatus::Past => write!(f, "PAST"),
        }
    }
}

/// Legacy single-number yearly distance goal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnnualGoal {
    pub year: i32,
    pub distance: f64,
    pub unit: DistanceUnit,
}
