pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod progress;
pub mod repository;
pub mod service;
pub mod stats;
pub mod time;
pub mod units;
pub mod usecase;

pub use config::{default_data_dir, resolve_data_dir, Settings};
pub use error::{Error, Result};
pub use input::expand_key;
pub use model::{AnnualGoal, Goal, GoalPatch, GoalType, Ride, TripRecord, WindowStatus};
pub use progress::{compute_progress, display_unit_for, GoalProgress, PaceStatus};
pub use repository::{
    CachedRideRepository, FileGoalRepository, GoalRepository, JsonExportSource, RideCache,
    RideRepository, RideSource,
};
pub use service::{GoalService, NewGoal};
pub use time::{parse_departed_at, parse_human_date};
pub use units::{convert, DistanceUnit, Unit};
pub use usecase::{StatsReport, SummaryUseCase};
