use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::model::goal::{Goal, GoalType, WindowStatus};
use crate::model::ride::Ride;
use crate::time::inclusive_days;
use crate::units::{convert, DistanceUnit, Unit};

const DAYS_PER_WEEK: f64 = 7.0;
const DAYS_PER_MONTH: f64 = 30.44;
const ON_TRACK_TOLERANCE: f64 = 2.0;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaceStatus {
    OnTrack,
    Ahead,
    Behind,
}

impl fmt::Display for PaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaceStatus::OnTrack => write!(f, "on track"),
            PaceStatus::Ahead => write!(f, "ahead"),
            PaceStatus::Behind => write!(f, "behind"),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub goal: Goal,
    pub current_value: f64,
    pub target_value: f64,
    /// Unit both `current_value` and `target_value` are expressed in.
    pub unit: Unit,
    pub percent_complete: f64,
    pub is_complete: bool,
    pub days_total: i64,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    pub percent_elapsed: f64,
    pub pace: PaceStatus,
    /// Percent complete minus percent of the window elapsed.
    pub pace_difference: f64,
    pub daily_target: f64,
    pub weekly_target: f64,
    pub monthly_target: f64,
}

impl GoalProgress {
    pub fn remaining(&self) -> f64 {
        (self.target_value - self.current_value).max(0.0)
    }
}

/// Unit a goal's progress is reported in.
///
/// Distance and elevation goals follow the display unit when one is given;
/// every other goal keeps its own unit.
pub fn display_unit_for(goal: &Goal, display: Option<DistanceUnit>) -> Unit {
    match (goal.goal_type, display) {
        (GoalType::Distance, Some(display)) => display.unit(),
        (GoalType::Elevation, Some(display)) => display.elevation_unit(),
        _ => goal.unit,
    }
}

pub fn window_status(goal: &Goal, today: NaiveDate) -> WindowStatus {
    goal.window_status(today)
}

pub fn compute_progress(
    goal: &Goal,
    rides: &[Ride],
    display: Option<DistanceUnit>,
    today: NaiveDate,
) -> Result<GoalProgress> {
    let window: Vec<&Ride> = rides.iter().filter(|r| goal.contains(r.date)).collect();
    let unit = display_unit_for(goal, display);

    let days_total = inclusive_days(goal.start_date, goal.end_date).max(0);
    let days_elapsed = inclusive_days(goal.start_date, today.min(goal.end_date)).clamp(0, days_total);
    let days_remaining = days_total - days_elapsed;

    let (current_value, target_value) = match goal.goal_type {
        GoalType::Distance => {
            let km: f64 = window.iter().map(|r| r.distance_km).sum();
            (convert(km, Unit::Km, unit)?, convert(goal.target, goal.unit, unit)?)
        }
        GoalType::Elevation => {
            let meters: f64 = window.iter().map(|r| r.elevation_gain_m).sum();
            (
                convert(meters, Unit::Meters, unit)?,
                convert(goal.target, goal.unit, unit)?,
            )
        }
        GoalType::Time => {
            let seconds: f64 = window.iter().map(|r| r.duration_s).sum();
            (convert(seconds, Unit::Seconds, unit)?, goal.target)
        }
        GoalType::RideCount => (window.len() as f64, goal.target),
        GoalType::Frequency => {
            let weeks = (days_elapsed as f64 / DAYS_PER_WEEK).max(1.0);
            (window.len() as f64 / weeks, goal.target)
        }
    };

    let raw_percent = if target_value > 0.0 {
        100.0 * current_value / target_value
    } else if current_value > 0.0 {
        100.0
    } else {
        0.0
    };
    let is_complete = current_value >= target_value;

    let percent_elapsed = if days_total > 0 {
        100.0 * days_elapsed as f64 / days_total as f64
    } else {
        100.0
    };
    let pace_difference = raw_percent - percent_elapsed;
    let pace = if pace_difference.abs() <= ON_TRACK_TOLERANCE {
        PaceStatus::OnTrack
    } else if pace_difference > 0.0 {
        PaceStatus::Ahead
    } else {
        PaceStatus::Behind
    };

    let remaining = (target_value - current_value).max(0.0);
    let daily_target = if days_remaining > 0 {
        remaining / days_remaining as f64
    } else {
        0.0
    };
    let months_remaining = days_remaining as f64 / DAYS_PER_MONTH;
    let monthly_target = if months_remaining > 0.0 {
        remaining / months_remaining
    } else {
        0.0
    };

    Ok(GoalProgress {
        goal: goal.clone(),
        current_value,
        target_value,
        unit,
        percent_complete: raw_percent.min(100.0),
        is_complete,
        days_total,
        days_elapsed,
        days_remaining,
        percent_elapsed,
        pace,
        pace_difference,
        daily_target,
        weekly_target: daily_target * DAYS_PER_WEEK,
        monthly_target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::units::KM_PER_MILE;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ride(id: u64, date: NaiveDate, km: f64, elevation_m: f64, seconds: f64) -> Ride {
        Ride::new(id, format!("ride {}", id), date, km, elevation_m, seconds).unwrap()
    }

    fn goal(goal_type: GoalType, target: f64, unit: Unit) -> Goal {
        Goal::new(None, goal_type, target, unit, d(2025, 1, 1), d(2025, 12, 31))
    }

    #[test]
    fn test_distance_goal_capped_and_complete() {
        // 150 miles ridden against a 100 mile target.
        let rides = vec![
            ride(1, d(2025, 3, 1), 100.0 * KM_PER_MILE, 0.0, 0.0),
            ride(2, d(2025, 4, 1), 50.0 * KM_PER_MILE, 0.0, 0.0),
        ];
        let g = goal(GoalType::Distance, 100.0, Unit::Miles);
        let progress = compute_progress(&g, &rides, None, d(2025, 6, 1)).unwrap();

        assert!((progress.current_value - 150.0).abs() < 1e-9);
        assert_eq!(progress.target_value, 100.0);
        assert_eq!(progress.percent_complete, 100.0);
        assert!(progress.is_complete);
        assert_eq!(progress.unit, Unit::Miles);
        assert_eq!(progress.remaining(), 0.0);
    }

    #[test]
    fn test_zero_target() {
        let rides = vec![ride(1, d(2025, 3, 1), 5.0, 0.0, 0.0)];
        let g = goal(GoalType::RideCount, 0.0, Unit::Rides);
        let progress = compute_progress(&g, &rides, None, d(2025, 6, 1)).unwrap();
        assert_eq!(progress.percent_complete, 100.0);
        assert!(progress.is_complete);

        let progress = compute_progress(&g, &[], None, d(2025, 6, 1)).unwrap();
        assert_eq!(progress.percent_complete, 0.0);
        assert!(progress.is_complete);
    }

    #[test]
    fn test_distance_goal_in_display_unit() {
        let rides = vec![ride(1, d(2025, 3, 1), 80.0, 0.0, 0.0)];
        let g = goal(GoalType::Distance, 160.0, Unit::Km);

        let progress = compute_progress(&g, &rides, Some(DistanceUnit::Miles), d(2025, 6, 1)).unwrap();
        assert_eq!(progress.unit, Unit::Miles);
        assert!((progress.current_value - 80.0 / KM_PER_MILE).abs() < 1e-9);
        assert!((progress.target_value - 160.0 / KM_PER_MILE).abs() < 1e-9);
        assert!((progress.percent_complete - 50.0).abs() < 1e-9);
        assert!(!progress.is_complete);
    }

    #[test]
    fn test_elevation_goal_follows_companion_unit() {
        let rides = vec![ride(1, d(2025, 3, 1), 10.0, 1000.0, 0.0)];
        let g = goal(GoalType::Elevation, 2000.0, Unit::Meters);

        let progress = compute_progress(&g, &rides, Some(DistanceUnit::Miles), d(2025, 6, 1)).unwrap();
        assert_eq!(progress.unit, Unit::Feet);
        assert!((progress.current_value - 3280.84).abs() < 1e-6);
        assert!((progress.percent_complete - 50.0).abs() < 1e-9);

        let progress = compute_progress(&g, &rides, None, d(2025, 6, 1)).unwrap();
        assert_eq!(progress.unit, Unit::Meters);
        assert_eq!(progress.current_value, 1000.0);
    }

    #[test]
    fn test_time_goal_in_hours() {
        let rides = vec![
            ride(1, d(2025, 3, 1), 10.0, 0.0, 5400.0),
            ride(2, d(2025, 3, 2), 10.0, 0.0, 1800.0),
        ];
        let g = goal(GoalType::Time, 4.0, Unit::Hours);
        let progress = compute_progress(&g, &rides, Some(DistanceUnit::Km), d(2025, 6, 1)).unwrap();
        assert_eq!(progress.unit, Unit::Hours);
        assert!((progress.current_value - 2.0).abs() < 1e-9);
        assert!((progress.percent_complete - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_frequency_rides_per_week() {
        let g = Goal::new(None, GoalType::Frequency, 3.0, Unit::Rides, d(2025, 3, 1), d(2025, 3, 28));
        let rides: Vec<Ride> = (0..6).map(|i| ride(i, d(2025, 3, 1 + i as u32), 10.0, 0.0, 0.0)).collect();

        // 14 days elapsed = 2 weeks
        let progress = compute_progress(&g, &rides, None, d(2025, 3, 14)).unwrap();
        assert!((progress.current_value - 3.0).abs() < 1e-9);
        assert!(progress.is_complete);

        // fewer than 7 days counts as one week
        let progress = compute_progress(&g, &rides[..2], None, d(2025, 3, 2)).unwrap();
        assert!((progress.current_value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rides_outside_window_ignored() {
        let g = Goal::new(None, GoalType::RideCount, 10.0, Unit::Rides, d(2025, 3, 1), d(2025, 3, 31));
        let rides = vec![
            ride(1, d(2025, 2, 28), 10.0, 0.0, 0.0),
            ride(2, d(2025, 3, 1), 10.0, 0.0, 0.0),
            ride(3, d(2025, 3, 31), 10.0, 0.0, 0.0),
            ride(4, d(2025, 4, 1), 10.0, 0.0, 0.0),
        ];
        let progress = compute_progress(&g, &rides, None, d(2025, 3, 15)).unwrap();
        assert_eq!(progress.current_value, 2.0);
    }

    #[test]
    fn test_pacing() {
        let g = Goal::new(None, GoalType::Distance, 310.0, Unit::Km, d(2025, 3, 1), d(2025, 3, 31));
        let rides = vec![ride(1, d(2025, 3, 2), 100.0, 0.0, 0.0)];

        // day 10 of 31: 32.3% elapsed, 32.3% complete
        let progress = compute_progress(&g, &rides, None, d(2025, 3, 10)).unwrap();
        assert_eq!(progress.days_total, 31);
        assert_eq!(progress.days_elapsed, 10);
        assert_eq!(progress.days_remaining, 21);
        assert_eq!(progress.pace, PaceStatus::OnTrack);
        assert!((progress.daily_target - 210.0 / 21.0).abs() < 1e-9);
        assert!((progress.weekly_target - 70.0).abs() < 1e-9);

        let progress = compute_progress(&g, &rides, None, d(2025, 3, 25)).unwrap();
        assert_eq!(progress.pace, PaceStatus::Behind);

        let progress = compute_progress(&g, &rides, None, d(2025, 3, 2)).unwrap();
        assert_eq!(progress.pace, PaceStatus::Ahead);
    }

    #[test]
    fn test_future_and_past_windows() {
        let g = Goal::new(None, GoalType::Distance, 100.0, Unit::Km, d(2025, 3, 1), d(2025, 3, 31));

        let progress = compute_progress(&g, &[], None, d(2025, 1, 1)).unwrap();
        assert_eq!(progress.days_elapsed, 0);
        assert_eq!(progress.days_remaining, 31);
        assert_eq!(window_status(&g, d(2025, 1, 1)), WindowStatus::Future);

        let progress = compute_progress(&g, &[], None, d(2025, 6, 1)).unwrap();
        assert_eq!(progress.days_elapsed, 31);
        assert_eq!(progress.days_remaining, 0);
        assert_eq!(progress.daily_target, 0.0);
        assert_eq!(progress.monthly_target, 0.0);
    }

    #[test]
    fn test_mismatched_unit_is_unsupported() {
        let g = goal(GoalType::Distance, 100.0, Unit::Feet);
        let err = compute_progress(&g, &[], Some(DistanceUnit::Km), d(2025, 6, 1)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedUnit { .. }));

        let err = compute_progress(&g, &[], None, d(2025, 6, 1)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedUnit { .. }));
    }

    #[test]
    fn test_display_unit_for() {
        let distance = goal(GoalType::Distance, 1.0, Unit::Km);
        assert_eq!(display_unit_for(&distance, Some(DistanceUnit::Miles)), Unit::Miles);
        assert_eq!(display_unit_for(&distance, None), Unit::Km);
        let time = goal(GoalType::Time, 1.0, Unit::Minutes);
        assert_eq!(display_unit_for(&time, Some(DistanceUnit::Miles)), Unit::Minutes);
    }
}
