pub mod report;

pub use report::{StatsReport, SummaryUseCase};
