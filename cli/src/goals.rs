use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::Subcommand;
use ridestats_core::{
    parse_human_date, DistanceUnit, FileGoalRepository, GoalPatch, GoalService, GoalType,
    NewGoal, Ride, Unit,
};

use crate::display;

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Add a new goal of any type
    Add {
        /// distance, ride_count, elevation, time or frequency (prefixes accepted)
        #[arg(long = "type")]
        goal_type: GoalType,
        #[arg(long)]
        target: f64,
        /// Unit of the target (km, miles, m, ft, h, min, rides); defaults per type
        #[arg(long)]
        target_unit: Option<Unit>,
        #[arg(long)]
        title: Option<String>,
        /// Start date (YYYY-MM-DD, today, som, soy, +2w, ...)
        #[arg(long)]
        start: String,
        /// End date (YYYY-MM-DD, eom, eoy, +3m, ...)
        #[arg(long)]
        end: String,
    },
    /// List all goals
    List {
        /// Only goals whose window contains today
        #[arg(long)]
        active: bool,
    },
    /// Delete a goal
    Delete {
        #[arg(long)]
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Edit a goal
    Edit {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long)]
        target_unit: Option<Unit>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Show goal progress (active goals by default)
    Progress {
        #[arg(long)]
        id: Option<String>,
        /// Include goals outside their window
        #[arg(long)]
        all: bool,
    },
    /// Set the annual distance goal, in the current unit
    Set {
        distance: f64,
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
    },
}

impl GoalCommands {
    /// Whether the command needs the ride history.
    pub fn needs_rides(&self) -> bool {
        matches!(self, GoalCommands::Progress { .. })
    }
}

pub struct GoalContext<'a> {
    pub service: &'a GoalService<FileGoalRepository>,
    pub rides: &'a [Ride],
    pub unit: DistanceUnit,
    pub today: NaiveDate,
}

fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    parse_human_date(input, today).with_context(|| format!("Invalid date '{}'", input))
}

pub fn handle(command: GoalCommands, ctx: &GoalContext) -> Result<()> {
    let service = ctx.service;

    match command {
        GoalCommands::Add {
            goal_type,
            target,
            target_unit,
            title,
            start,
            end,
        } => {
            let new = NewGoal {
                title,
                goal_type,
                target,
                unit: target_unit,
                start_date: parse_date(&start, ctx.today)?,
                end_date: parse_date(&end, ctx.today)?,
            };
            let goal = service.create(new, ctx.unit)?;
            println!("Goal added: {} (ID: {})", goal.title, goal.short_id());
            println!("  Target: {} {} ({})", goal.target, goal.unit, goal.goal_type);
            println!("  Window: {} to {}", goal.start_date, goal.end_date);
        }
        GoalCommands::List { active } => {
            let goals = if active {
                service.active(ctx.today)?
            } else {
                service.list()?
            };
            display::goal_list(&goals, ctx.today);
            for annual in service.list_annual()? {
                println!("Annual goal {}: {} {}", annual.year, annual.distance, annual.unit);
            }
        }
        GoalCommands::Delete { id, yes } => {
            let id = service.resolve_id(&id)?;
            let goal = service.get(&id)?;
            if !yes && !confirm(&format!("Delete goal '{}' ({})?", goal.title, goal.short_id()))? {
                println!("Cancelled.");
                return Ok(());
            }
            service.delete(&id)?;
            println!("Goal deleted: {}", goal.title);
        }
        GoalCommands::Edit {
            id,
            title,
            target,
            target_unit,
            start,
            end,
        } => {
            let id = service.resolve_id(&id)?;
            let patch = GoalPatch {
                title,
                target,
                unit: target_unit,
                start_date: start.map(|s| parse_date(&s, ctx.today)).transpose()?,
                end_date: end.map(|s| parse_date(&s, ctx.today)).transpose()?,
            };
            let goal = service.edit(&id, &patch)?;
            println!("Goal updated: {} (ID: {})", goal.title, goal.short_id());
        }
        GoalCommands::Progress { id, all } => {
            let display = Some(ctx.unit);
            if let Some(id) = id {
                let id = service.resolve_id(&id)?;
                display::goal_progress(&service.progress(&id, ctx.rides, display, ctx.today)?);
                return Ok(());
            }

            let progress = if all {
                service
                    .list()?
                    .iter()
                    .map(|g| ridestats_core::compute_progress(g, ctx.rides, display, ctx.today))
                    .collect::<ridestats_core::Result<Vec<_>>>()?
            } else {
                service.progress_active(ctx.rides, display, ctx.today)?
            };
            if progress.is_empty() {
                println!("No {}goals found.", if all { "" } else { "active " });
            }
            for p in &progress {
                display::goal_progress(p);
            }
        }
        GoalCommands::Set { distance, year } => {
            let year = year.unwrap_or_else(|| ctx.today.year());
            let goal = service.set_annual(year, distance, ctx.unit)?;
            println!("Annual goal for {} set to {} {}", goal.year, goal.distance, goal.unit);
        }
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
