use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct YearSummary {
    pub distance: f64,
    pub ride_count: usize,
    pub eddington: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub distance: f64,
    pub ride_count: usize,
}

impl MonthSummary {
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Current Eddington number and what it takes to reach the next two.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EddingtonProgress {
    pub current: u32,
    pub rides_at_next: usize,
    pub needed_for_next: usize,
    pub rides_at_after_next: usize,
    pub needed_for_after_next: usize,
}

impl EddingtonProgress {
    pub fn next(&self) -> u32 {
        self.current + 1
    }

    pub fn after_next(&self) -> u32 {
        self.current + 2
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct YearToDate {
    pub year: i32,
    pub ride_count: usize,
    pub distance: f64,
    pub eddington: u32,
    pub next_target: u32,
    pub rides_at_target: usize,
    pub rides_needed: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DistanceBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl DistanceBucket {
    pub fn label(&self) -> String {
        format!("{}-{}", trim_number(self.lower), trim_number(self.upper))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MilestoneAchievement {
    pub milestone: f64,
    pub achieved_on: Option<NaiveDate>,
}

/// Count of single rides falling in a named distance tier.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MilestoneTier {
    pub label: String,
    pub min: f64,
    pub max: Option<f64>,
    pub count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RideMetrics {
    pub longest: f64,
    pub average: f64,
    pub total: f64,
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
