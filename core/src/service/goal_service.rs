use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::goal::{AnnualGoal, Goal, GoalPatch, GoalType, WindowStatus};
use crate::model::ride::Ride;
use crate::progress::{compute_progress, GoalProgress};
use crate::repository::GoalRepository;
use crate::time::year_bounds;
use crate::units::{convert, DistanceUnit, Unit};

// Sanity limits on targets, in the goal's own unit (time in hours)
const MAX_DISTANCE: f64 = 100_000.0;
const MAX_ELEVATION: f64 = 500_000.0;
const MAX_HOURS: f64 = 10_000.0;
const MAX_RIDES: f64 = 1_000.0;

/// Input for a new goal. A missing unit takes the type's default.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub title: Option<String>,
    pub goal_type: GoalType,
    pub target: f64,
    pub unit: Option<Unit>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub struct GoalService<R: GoalRepository> {
    repo: R,
}

impl<R: GoalRepository> GoalService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create(&self, new: NewGoal, display: DistanceUnit) -> Result<Goal> {
        let unit = new.unit.unwrap_or_else(|| new.goal_type.default_unit(display));
        let goal = Goal::new(
            new.title,
            new.goal_type,
            new.target,
            unit,
            new.start_date,
            new.end_date,
        );
        validate(&goal)?;
        self.repo.add(goal.clone())?;
        Ok(goal)
    }

    pub fn list(&self) -> Result<Vec<Goal>> {
        self.repo.list()
    }

    pub fn get(&self, id: &Uuid) -> Result<Goal> {
        self.repo.get(id)
    }

    pub fn resolve_id(&self, prefix: &str) -> Result<Uuid> {
        self.repo.resolve_id(prefix)
    }

    pub fn edit(&self, id: &Uuid, patch: &GoalPatch) -> Result<Goal> {
        if patch.is_empty() {
            return Err(Error::Validation("Nothing to update".into()));
        }
        if matches!(&patch.title, Some(title) if title.trim().is_empty()) {
            return Err(Error::Validation("Title must not be empty".into()));
        }

        let mut merged = self.repo.get(id)?;
        merged.apply(patch);
        validate(&merged)?;

        self.repo.edit(id, patch)
    }

    pub fn delete(&self, id: &Uuid) -> Result<()> {
        self.repo.delete(id)
    }

    pub fn active(&self, today: NaiveDate) -> Result<Vec<Goal>> {
        Ok(self
            .repo
            .list()?
            .into_iter()
            .filter(|g| g.window_status(today) == WindowStatus::Active)
            .collect())
    }

    pub fn progress(
        &self,
        id: &Uuid,
        rides: &[Ride],
        display: Option<DistanceUnit>,
        today: NaiveDate,
    ) -> Result<GoalProgress> {
        let goal = self.repo.get(id)?;
        compute_progress(&goal, rides, display, today)
    }

    pub fn progress_active(
        &self,
        rides: &[Ride],
        display: Option<DistanceUnit>,
        today: NaiveDate,
    ) -> Result<Vec<GoalProgress>> {
        self.active(today)?
            .iter()
            .map(|goal| compute_progress(goal, rides, display, today))
            .collect()
    }

    pub fn set_annual(&self, year: i32, distance: f64, unit: DistanceUnit) -> Result<AnnualGoal> {
        check_target(distance)?;
        check_limit(distance, MAX_DISTANCE, unit.unit())?;
        year_bounds(year)?;

        let goal = AnnualGoal {
            year,
            distance,
            unit,
        };
        self.repo.set_annual(goal.clone())?;
        Ok(goal)
    }

    pub fn annual(&self, year: i32) -> Result<Option<AnnualGoal>> {
        self.repo.annual(year)
    }

    pub fn list_annual(&self) -> Result<Vec<AnnualGoal>> {
        self.repo.list_annual()
    }

    /// Evaluates the yearly distance goal as a distance goal over the whole year.
    pub fn annual_progress(
        &self,
        year: i32,
        rides: &[Ride],
        display: DistanceUnit,
        today: NaiveDate,
    ) -> Result<Option<GoalProgress>> {
        let Some(annual) = self.repo.annual(year)? else {
            return Ok(None);
        };
        let (start, end) = year_bounds(year)?;
        let goal = Goal::new(
            Some(format!("{} Annual Goal", year)),
            GoalType::Distance,
            annual.distance,
            annual.unit.unit(),
            start,
            end,
        );
        compute_progress(&goal, rides, Some(display), today).map(Some)
    }
}

fn check_target(target: f64) -> Result<()> {
    if !target.is_finite() || target <= 0.0 {
        return Err(Error::Validation(format!(
            "Target must be a positive number, got {}",
            target
        )));
    }
    Ok(())
}

fn check_limit(value: f64, max: f64, unit: Unit) -> Result<()> {
    if value > max {
        return Err(Error::Validation(format!(
            "Target {} {} exceeds the maximum of {} {}",
            value, unit, max, unit
        )));
    }
    Ok(())
}

/// Target, window and unit checks shared by create and edit.
pub fn validate(goal: &Goal) -> Result<()> {
    check_target(goal.target)?;

    if goal.start_date >= goal.end_date {
        return Err(Error::Validation(format!(
            "Start date {} must be before end date {}",
            goal.start_date, goal.end_date
        )));
    }

    if !goal.goal_type.accepts_unit(goal.unit) {
        return Err(Error::Validation(format!(
            "Unit '{}' is not valid for {} goals",
            goal.unit, goal.goal_type
        )));
    }

    match goal.goal_type {
        GoalType::Distance => check_limit(goal.target, MAX_DISTANCE, goal.unit),
        GoalType::Elevation => check_limit(goal.target, MAX_ELEVATION, goal.unit),
        GoalType::Time => {
            let hours = convert(goal.target, goal.unit, Unit::Hours)?;
            check_limit(hours, MAX_HOURS, Unit::Hours)
        }
        GoalType::RideCount | GoalType::Frequency => check_limit(goal.target, MAX_RIDES, goal.unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MockGoalRepo {
        goals: RefCell<Vec<Goal>>,
        annual: RefCell<BTreeMap<i32, AnnualGoal>>,
    }

    impl GoalRepository for MockGoalRepo {
        fn add(&self, goal: Goal) -> Result<Uuid> {
            let id = goal.id;
            self.goals.borrow_mut().push(goal);
            Ok(id)
        }
        fn list(&self) -> Result<Vec<Goal>> {
            Ok(self.goals.borrow().clone())
        }
        fn get(&self, id: &Uuid) -> Result<Goal> {
            self.goals
                .borrow()
                .iter()
                .find(|g| g.id == *id)
                .cloned()
                .ok_or_else(|| Error::NotFound(id.to_string()))
        }
        fn edit(&self, id: &Uuid, patch: &GoalPatch) -> Result<Goal> {
            let mut goals = self.goals.borrow_mut();
            let goal = goals
                .iter_mut()
                .find(|g| g.id == *id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            goal.apply(patch);
            Ok(goal.clone())
        }
        fn delete(&self, id: &Uuid) -> Result<()> {
            let mut goals = self.goals.borrow_mut();
            let before = goals.len();
            goals.retain(|g| g.id != *id);
            if goals.len() == before {
                return Err(Error::NotFound(id.to_string()));
            }
            Ok(())
        }
        fn resolve_id(&self, _prefix: &str) -> Result<Uuid> {
            unimplemented!()
        }
        fn set_annual(&self, goal: AnnualGoal) -> Result<()> {
            self.annual.borrow_mut().insert(goal.year, goal);
            Ok(())
        }
        fn annual(&self, year: i32) -> Result<Option<AnnualGoal>> {
            Ok(self.annual.borrow().get(&year).cloned())
        }
        fn list_annual(&self) -> Result<Vec<AnnualGoal>> {
            Ok(self.annual.borrow().values().cloned().collect())
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn new_goal(goal_type: GoalType, target: f64, unit: Option<Unit>) -> NewGoal {
        NewGoal {
            title: None,
            goal_type,
            target,
            unit,
            start_date: d(2025, 1, 1),
            end_date: d(2025, 12, 31),
        }
    }

    fn service() -> GoalService<MockGoalRepo> {
        GoalService::new(MockGoalRepo::default())
    }

    #[test]
    fn test_create_applies_unit_defaults() {
        let service = service();
        let distance = service.create(new_goal(GoalType::Distance, 500.0, None), DistanceUnit::Km).unwrap();
        assert_eq!(distance.unit, Unit::Km);
        let elevation = service.create(new_goal(GoalType::Elevation, 5000.0, None), DistanceUnit::Miles).unwrap();
        assert_eq!(elevation.unit, Unit::Meters);
        let time = service.create(new_goal(GoalType::Time, 100.0, None), DistanceUnit::Miles).unwrap();
        assert_eq!(time.unit, Unit::Hours);
        let count = service.create(new_goal(GoalType::RideCount, 50.0, None), DistanceUnit::Miles).unwrap();
        assert_eq!(count.unit, Unit::Rides);
        assert_eq!(count.title, "Ride Count Goal");
        assert_eq!(service.list().unwrap().len(), 4);
    }

    #[test]
    fn test_create_rejects_invalid_goals() {
        let service = service();
        let cases = vec![
            new_goal(GoalType::Distance, 0.0, None),
            new_goal(GoalType::Distance, -5.0, None),
            new_goal(GoalType::Distance, f64::NAN, None),
            new_goal(GoalType::Distance, 100.0, Some(Unit::Feet)),
            new_goal(GoalType::Distance, 200_000.0, None),
            new_goal(GoalType::Elevation, 600_000.0, None),
            new_goal(GoalType::Time, 10_001.0, None),
            new_goal(GoalType::Time, 700_000.0, Some(Unit::Minutes)),
            new_goal(GoalType::RideCount, 1_001.0, None),
            NewGoal {
                end_date: d(2025, 1, 1),
                ..new_goal(GoalType::Distance, 100.0, None)
            },
        ];
        for case in cases {
            let err = service.create(case.clone(), DistanceUnit::Miles).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{:?}", case);
        }
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn test_edit_revalidates_merged_goal() {
        let service = service();
        let goal = service.create(new_goal(GoalType::Distance, 500.0, None), DistanceUnit::Km).unwrap();

        let updated = service
            .edit(&goal.id, &GoalPatch { target: Some(750.0), ..Default::default() })
            .unwrap();
        assert_eq!(updated.target, 750.0);

        let bad_window = GoalPatch { end_date: Some(d(2024, 12, 1)), ..Default::default() };
        assert!(matches!(service.edit(&goal.id, &bad_window), Err(Error::Validation(_))));
        assert!(matches!(
            service.edit(&goal.id, &GoalPatch::default()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            service.edit(&Uuid::new_v4(), &GoalPatch { target: Some(1.0), ..Default::default() }),
            Err(Error::NotFound(_))
        ));
        // rejected edits leave the stored goal untouched
        assert_eq!(service.get(&goal.id).unwrap().target, 750.0);
    }

    #[test]
    fn test_active_and_progress() {
        let service = service();
        let current = service.create(new_goal(GoalType::RideCount, 2.0, None), DistanceUnit::Km).unwrap();
        service
            .create(
                NewGoal {
                    start_date: d(2026, 1, 1),
                    end_date: d(2026, 12, 31),
                    ..new_goal(GoalType::RideCount, 2.0, None)
                },
                DistanceUnit::Km,
            )
            .unwrap();

        let rides = vec![
            Ride::new(1, "a".into(), d(2025, 2, 1), 30.0, 0.0, 0.0).unwrap(),
            Ride::new(2, "b".into(), d(2025, 3, 1), 30.0, 0.0, 0.0).unwrap(),
        ];
        let today = d(2025, 6, 1);
        let active = service.active(today).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, current.id);

        let all = service.progress_active(&rides, None, today).unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_complete);

        let single = service.progress(&current.id, &rides, None, today).unwrap();
        assert_eq!(single.current_value, 2.0);
    }

    #[test]
    fn test_annual_goal_progress_in_display_unit() {
        let service = service();
        assert!(service.annual_progress(2025, &[], DistanceUnit::Km, d(2025, 6, 1)).unwrap().is_none());

        service.set_annual(2025, 1000.0, DistanceUnit::Km).unwrap();
        let rides = vec![
            Ride::new(1, "a".into(), d(2025, 2, 1), 250.0, 0.0, 0.0).unwrap(),
            Ride::new(2, "b".into(), d(2024, 3, 1), 250.0, 0.0, 0.0).unwrap(),
        ];

        let progress = service
            .annual_progress(2025, &rides, DistanceUnit::Km, d(2025, 6, 1))
            .unwrap()
            .unwrap();
        assert_eq!(progress.current_value, 250.0);
        assert_eq!(progress.target_value, 1000.0);
        assert_eq!(progress.percent_complete, 25.0);

        let in_miles = service
            .annual_progress(2025, &rides, DistanceUnit::Miles, d(2025, 6, 1))
            .unwrap()
            .unwrap();
        assert_eq!(in_miles.unit, Unit::Miles);
        assert!((in_miles.percent_complete - 25.0).abs() < 1e-9);

        assert!(service.set_annual(2025, 0.0, DistanceUnit::Km).is_err());
    }

    #[test]
    fn test_delete() {
        let service = service();
        let goal = service.create(new_goal(GoalType::Distance, 500.0, None), DistanceUnit::Km).unwrap();
        service.delete(&goal.id).unwrap();
        assert!(matches!(service.get(&goal.id), Err(Error::NotFound(_))));
    }
}
