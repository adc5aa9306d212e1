mod display;
mod goals;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use ridestats_core::{
    default_data_dir, stats, CachedRideRepository, DistanceUnit, Error as CoreError,
    FileGoalRepository, GoalRepository, GoalService, JsonExportSource, Ride, RideCache,
    RideRepository, Settings, SummaryUseCase,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::goals::{GoalCommands, GoalContext};

#[derive(Parser)]
#[command(name = "ridestats")]
#[command(about = "Cycling statistics and goal tracking", long_about = None, version)]
struct Cli {
    /// Display unit; remembered for later runs
    #[arg(long, global = true)]
    unit: Option<DistanceUnit>,
    /// Ignore the ride cache and re-read the trips export
    #[arg(long, global = true)]
    refresh: bool,
    /// Data directory (defaults to $RIDESTATS_HOME or ~/.ridestats)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Trips export JSON to read rides from
    #[arg(long, global = true)]
    trips: Option<PathBuf>,
    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Display full statistics summary
    Summary,
    /// Show Eddington number progress
    Eddington,
    /// Show year-to-date statistics
    Ytd,
    /// Show yearly Eddington numbers
    Yearly,
    /// Show ride metrics
    Metrics,
    /// Show ride distance distribution
    Distribution {
        /// Bucket width in the display unit
        #[arg(long)]
        bucket: Option<f64>,
    },
    /// Show distance achievements
    Distance,
    /// Show the longest rides
    Longest {
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    /// Show monthly statistics
    Monthly {
        /// Most recent months to show
        #[arg(long, default_value_t = 12)]
        months: usize,
    },
    /// Show, set or toggle the display unit
    Unit {
        #[arg(value_enum)]
        value: Option<UnitAction>,
    },
    /// Show current settings and cache status
    Status,
    /// Manage goals
    #[command(subcommand)]
    Goal(GoalCommands),
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitAction {
    Miles,
    Km,
    Toggle,
}

struct App {
    data_dir: PathBuf,
    settings: Settings,
    unit: DistanceUnit,
    refresh: bool,
    trips: Option<PathBuf>,
    today: NaiveDate,
}

impl App {
    fn load(cli: &Cli) -> Result<Self> {
        let data_dir = match &cli.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        let mut settings = Settings::load(&data_dir).context("Failed to load settings")?;

        if let Some(unit) = cli.unit {
            if unit != settings.unit {
                settings.unit = unit;
                settings.save(&data_dir).context("Failed to save settings")?;
                debug!(%unit, "display unit saved");
            }
        }

        Ok(Self {
            unit: settings.unit,
            data_dir,
            settings,
            refresh: cli.refresh,
            trips: cli.trips.clone(),
            today: Local::now().date_naive(),
        })
    }

    fn cache(&self) -> RideCache {
        RideCache::new(&self.data_dir)
    }

    fn rides(&self) -> Result<Vec<Ride>> {
        let source = self
            .trips
            .clone()
            .or_else(|| self.settings.trips_file.clone())
            .map(JsonExportSource::new);
        let repo = CachedRideRepository::new(source, self.cache(), self.settings.cache_ttl_hours);
        repo.fetch_rides(self.refresh).context("Failed to load rides")
    }

    fn goal_service(&self) -> Result<GoalService<FileGoalRepository>> {
        let repo = FileGoalRepository::new(Some(self.data_dir.clone()))?;
        Ok(GoalService::new(repo))
    }

    fn set_unit(&mut self, unit: DistanceUnit) -> Result<()> {
        self.settings.unit = unit;
        self.unit = unit;
        self.settings.save(&self.data_dir).context("Failed to save settings")
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut app = App::load(&cli)?;
    let unit = app.unit;

    match cli.command.unwrap_or(Commands::Summary) {
        Commands::Summary => {
            let rides = app.rides()?;
            let service = app.goal_service()?;
            let report = SummaryUseCase::new(&service).build(&rides, unit, &app.settings, app.today)?;
            display::summary(&report);
        }
        Commands::Eddington => {
            let rides = app.rides()?;
            display::eddington(&stats::eddington_progress(&rides, unit), unit);
        }
        Commands::Ytd => {
            let rides = app.rides()?;
            display::year_to_date(&stats::year_to_date(&rides, unit, app.today.year()), unit);
        }
        Commands::Yearly => {
            let rides = app.rides()?;
            let yearly = stats::yearly_breakdown(&rides, unit);
            display::yearly(&yearly, stats::highest_yearly_eddington(&yearly), unit);
        }
        Commands::Metrics => {
            let rides = app.rides()?;
            display::metrics(stats::total_rides(&rides), &stats::ride_metrics(&rides, unit), unit);
        }
        Commands::Distribution { bucket } => {
            let rides = app.rides()?;
            let width = bucket.unwrap_or(app.settings.distribution_bucket);
            display::distribution(&stats::distance_distribution(&rides, unit, width)?, unit);
        }
        Commands::Distance => {
            let rides = app.rides()?;
            display::distance_achievements(
                stats::total_distance(&rides, unit),
                &stats::distance_milestones(&rides, unit, app.settings.milestones(unit)),
                &stats::milestone_rides(&rides, unit),
                unit,
            );
        }
        Commands::Longest { count } => {
            let rides = app.rides()?;
            display::longest(&stats::longest_rides(&rides, count), unit);
        }
        Commands::Monthly { months } => {
            let rides = app.rides()?;
            let breakdown = stats::monthly_breakdown(&rides, unit);
            display::monthly(display::recent_months(&breakdown, months), unit);
        }
        Commands::Unit { value } => {
            let next = match value {
                None => None,
                Some(UnitAction::Miles) => Some(DistanceUnit::Miles),
                Some(UnitAction::Km) => Some(DistanceUnit::Km),
                Some(UnitAction::Toggle) => Some(unit.toggle()),
            };
            match next {
                Some(next) => {
                    app.set_unit(next)?;
                    println!("Unit set to {}", next);
                }
                None => println!("Current unit: {}", unit),
            }
        }
        Commands::Status => {
            let cache = app.cache().info()?;
            let goals = FileGoalRepository::new(Some(app.data_dir.clone()))?.list()?;
            display::status(unit, &app.data_dir, &cache, goals.len());
        }
        Commands::Goal(command) => {
            let rides = if command.needs_rides() { app.rides()? } else { Vec::new() };
            let service = app.goal_service()?;
            let ctx = GoalContext {
                service: &service,
                rides: &rides,
                unit,
                today: app.today,
            };
            goals::handle(command, &ctx)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let user_facing = err
                .chain()
                .filter_map(|cause| cause.downcast_ref::<CoreError>())
                .any(CoreError::is_user_facing);
            if user_facing {
                eprintln!("Error: {:#}", err);
            } else {
                eprintln!("Error: {:?}", err);
            }
            ExitCode::FAILURE
        }
    }
}
