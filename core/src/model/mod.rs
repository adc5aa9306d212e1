pub mod goal;
pub mod ride;
pub mod stats;

pub use goal::{AnnualGoal, Goal, GoalPatch, GoalType, WindowStatus};
pub use ride::{normalize_trips, Ride, TripRecord};
pub use stats::{
    DistanceBucket, EddingtonProgress, MilestoneAchievement, MilestoneTier, MonthSummary,
    RideMetrics, YearSummary, YearToDate,
};
