pub mod cache;
pub mod goals;
pub mod rides;
pub mod storage;
pub mod traits;

// Re-export
pub use cache::{migrate, CacheInfo, CacheSnapshot, LegacySnapshot, RideCache};
pub use goals::FileGoalRepository;
pub use rides::{CachedRideRepository, JsonExportSource};
pub use traits::{GoalRepository, RideRepository, RideSource};
