use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::config::Settings;
use crate::error::Result;
use crate::model::ride::Ride;
use crate::model::stats::{
    DistanceBucket, EddingtonProgress, MilestoneAchievement, MilestoneTier, MonthSummary,
    RideMetrics, YearSummary, YearToDate,
};
use crate::progress::GoalProgress;
use crate::repository::GoalRepository;
use crate::service::GoalService;
use crate::stats;
use crate::units::DistanceUnit;

const LONGEST_RIDES: usize = 5;

/// Everything the `summary` command prints, computed in one pass.
#[derive(Serialize, Debug, Clone)]
pub struct StatsReport {
    pub unit: DistanceUnit,
    pub total_rides: usize,
    pub total_distance: f64,
    pub eddington: EddingtonProgress,
    pub metrics: RideMetrics,
    pub yearly: BTreeMap<i32, YearSummary>,
    pub best_year: Option<(i32, u32)>,
    pub year_to_date: YearToDate,
    pub monthly: Vec<MonthSummary>,
    pub distribution: Vec<DistanceBucket>,
    pub longest: Vec<Ride>,
    pub milestones: Vec<MilestoneAchievement>,
    pub milestone_rides: Vec<MilestoneTier>,
    pub annual_goal: Option<GoalProgress>,
    pub active_goals: Vec<GoalProgress>,
}

pub struct SummaryUseCase<'a, R: GoalRepository> {
    goal_service: &'a GoalService<R>,
}

impl<'a, R: GoalRepository> SummaryUseCase<'a, R> {
    pub fn new(goal_service: &'a GoalService<R>) -> Self {
        Self { goal_service }
    }

    pub fn build(
        &self,
        rides: &[Ride],
        unit: DistanceUnit,
        settings: &Settings,
        today: NaiveDate,
    ) -> Result<StatsReport> {
        let yearly = stats::yearly_breakdown(rides, unit);
        let best_year = stats::highest_yearly_eddington(&yearly);

        Ok(StatsReport {
            unit,
            total_rides: stats::total_rides(rides),
            total_distance: stats::total_distance(rides, unit),
            eddington: stats::eddington_progress(rides, unit),
            metrics: stats::ride_metrics(rides, unit),
            yearly,
            best_year,
            year_to_date: stats::year_to_date(rides, unit, today.year()),
            monthly: stats::monthly_breakdown(rides, unit),
            distribution: stats::distance_distribution(rides, unit, settings.distribution_bucket)?,
            longest: stats::longest_rides(rides, LONGEST_RIDES),
            milestones: stats::distance_milestones(rides, unit, settings.milestones(unit)),
            milestone_rides: stats::milestone_rides(rides, unit),
            annual_goal: self
                .goal_service
                .annual_progress(today.year(), rides, unit, today)?,
            active_goals: self.goal_service.progress_active(rides, Some(unit), today)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::goal::GoalType;
    use crate::repository::FileGoalRepository;
    use crate::service::NewGoal;
    use tempfile::tempdir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rides() -> Vec<Ride> {
        vec![
            Ride::new(1, "Club run".into(), d(2024, 8, 3), 62.0, 540.0, 9000.0).unwrap(),
            Ride::new(2, "Commute".into(), d(2025, 3, 4), 12.5, 80.0, 2400.0).unwrap(),
            Ride::new(3, "Sportive".into(), d(2025, 5, 18), 160.0, 1900.0, 25200.0).unwrap(),
        ]
    }

    #[test]
    fn test_summary_report() {
        let dir = tempdir().unwrap();
        let service = GoalService::new(FileGoalRepository::new(Some(dir.path().to_path_buf())).unwrap());
        service.set_annual(2025, 2000.0, DistanceUnit::Km).unwrap();
        service
            .create(
                NewGoal {
                    title: Some("Spring climbing".into()),
                    goal_type: GoalType::Elevation,
                    target: 5000.0,
                    unit: None,
                    start_date: d(2025, 3, 1),
                    end_date: d(2025, 8, 31),
                },
                DistanceUnit::Km,
            )
            .unwrap();

        let report = SummaryUseCase::new(&service)
            .build(&rides(), DistanceUnit::Km, &Settings::default(), d(2025, 6, 1))
            .unwrap();

        assert_eq!(report.total_rides, 3);
        assert!((report.total_distance - 234.5).abs() < 1e-9);
        assert_eq!(report.eddington.current, 3);
        assert_eq!(report.yearly.len(), 2);
        assert_eq!(report.year_to_date.ride_count, 2);
        assert_eq!(report.longest[0].id, 3);
        assert_eq!(report.distribution.len(), 3);
        assert_eq!(report.monthly.len(), 3);

        let annual = report.annual_goal.unwrap();
        assert!((annual.current_value - 172.5).abs() < 1e-9);
        assert_eq!(report.active_goals.len(), 1);
        assert_eq!(report.active_goals[0].current_value, 1980.0);
    }

    #[test]
    fn test_summary_of_empty_history() {
        let dir = tempdir().unwrap();
        let service = GoalService::new(FileGoalRepository::new(Some(dir.path().to_path_buf())).unwrap());
        let report = SummaryUseCase::new(&service)
            .build(&[], DistanceUnit::Miles, &Settings::default(), d(2025, 6, 1))
            .unwrap();
        assert_eq!(report.total_rides, 0);
        assert_eq!(report.eddington.current, 0);
        assert!(report.annual_goal.is_none());
        assert!(report.milestones.iter().all(|m| m.achieved_on.is_none()));
    }
}
