use uuid::Uuid;

use crate::error::Result;
use crate::model::goal::{AnnualGoal, Goal, GoalPatch};
use crate::model::ride::{Ride, TripRecord};

pub trait GoalRepository {
    fn add(&self, goal: Goal) -> Result<Uuid>;
    fn list(&self) -> Result<Vec<Goal>>;
    fn get(&self, id: &Uuid) -> Result<Goal>;
    fn edit(&self, id: &Uuid, patch: &GoalPatch) -> Result<Goal>;
    fn delete(&self, id: &Uuid) -> Result<()>;
    /// Maps a unique id prefix, as shown in listings, to the full id.
    fn resolve_id(&self, prefix: &str) -> Result<Uuid>;

    fn set_annual(&self, goal: AnnualGoal) -> Result<()>;
    fn annual(&self, year: i32) -> Result<Option<AnnualGoal>>;
    fn list_annual(&self) -> Result<Vec<AnnualGoal>>;
}

/// Where raw trips come from: the remote service or an export of it.
pub trait RideSource {
    fn fetch_trips(&self) -> Result<Vec<TripRecord>>;
}

pub trait RideRepository {
    fn fetch_rides(&self, force_refresh: bool) -> Result<Vec<Ride>>;
}
