use chrono::{DateTime, Utc};
use ridestats_core::model::stats::{
    DistanceBucket, EddingtonProgress, MilestoneAchievement, MilestoneTier, MonthSummary,
    RideMetrics, YearSummary, YearToDate,
};
use ridestats_core::repository::CacheInfo;
use ridestats_core::{DistanceUnit, Goal, GoalProgress, PaceStatus, Ride, StatsReport};
use std::collections::BTreeMap;
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};

const BAR_WIDTH: usize = 40;

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    println!("{}", table);
}

fn heading(title: &str) {
    println!("\n\x1b[1;36m{}\x1b[0m", title);
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled.min(BAR_WIDTH))
}

pub fn eddington(progress: &EddingtonProgress, unit: DistanceUnit) {
    heading("Eddington number");
    println!("Current: {} ({} rides of at least {} {})", progress.current, progress.current, progress.current, unit);
    println!(
        "Next:    {} needs {} more ride(s) of {}+ {} ({} done)",
        progress.next(),
        progress.needed_for_next,
        progress.next(),
        unit,
        progress.rides_at_next
    );
    println!(
        "Then:    {} needs {} more ride(s) of {}+ {} ({} done)",
        progress.after_next(),
        progress.needed_for_after_next,
        progress.after_next(),
        unit,
        progress.rides_at_after_next
    );
}

pub fn year_to_date(ytd: &YearToDate, unit: DistanceUnit) {
    heading(&format!("{} year to date", ytd.year));
    println!("Rides:     {}", ytd.ride_count);
    println!("Distance:  {:.1} {}", ytd.distance, unit);
    println!("Eddington: {}", ytd.eddington);
    println!(
        "Progress to {}: {}/{} rides ({} to go)",
        ytd.next_target,
        ytd.rides_at_target,
        ytd.next_target,
        ytd.rides_needed
    );
}

#[derive(Tabled)]
struct YearRow {
    #[tabled(rename = "Year")]
    year: i32,
    #[tabled(rename = "Rides")]
    rides: usize,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Eddington")]
    eddington: u32,
}

pub fn yearly(yearly: &BTreeMap<i32, YearSummary>, best: Option<(i32, u32)>, unit: DistanceUnit) {
    heading("Yearly Eddington numbers");
    if yearly.is_empty() {
        println!("No rides found.");
        return;
    }
    let rows = yearly
        .iter()
        .map(|(year, s)| YearRow {
            year: *year,
            rides: s.ride_count,
            distance: format!("{:.1} {}", s.distance, unit),
            eddington: s.eddington,
        })
        .collect();
    print_table(rows);
    if let Some((year, e)) = best {
        println!("Best year: {} (E = {})", year, e);
    }
}

pub fn metrics(total_rides: usize, metrics: &RideMetrics, unit: DistanceUnit) {
    heading("Ride metrics");
    println!("Total rides:    {}", total_rides);
    println!("Total distance: {:.1} {}", metrics.total, unit);
    println!("Longest ride:   {:.1} {}", metrics.longest, unit);
    println!("Average ride:   {:.1} {}", metrics.average, unit);
}

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Rides")]
    count: usize,
    #[tabled(rename = "")]
    bar: String,
}

pub fn distribution(buckets: &[DistanceBucket], unit: DistanceUnit) {
    heading(&format!("Ride distribution ({})", unit));
    if buckets.is_empty() {
        println!("No rides found.");
        return;
    }
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    let rows = buckets
        .iter()
        .map(|b| BucketRow {
            range: b.label(),
            count: b.count,
            bar: bar(b.count as f64, max),
        })
        .collect();
    print_table(rows);
}

#[derive(Tabled)]
struct MilestoneRow {
    #[tabled(rename = "Milestone")]
    milestone: String,
    #[tabled(rename = "Reached")]
    reached: String,
}

#[derive(Tabled)]
struct TierRow {
    #[tabled(rename = "Achievement")]
    label: String,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Rides")]
    count: usize,
}

pub fn distance_achievements(
    total: f64,
    milestones: &[MilestoneAchievement],
    tiers: &[MilestoneTier],
    unit: DistanceUnit,
) {
    heading(&format!("Lifetime distance: {:.1} {}", total, unit));
    let rows = milestones
        .iter()
        .map(|m| MilestoneRow {
            milestone: format!("{:.0} {}", m.milestone, unit),
            reached: m
                .achieved_on
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    print_table(rows);

    heading("Milestone rides");
    let rows = tiers
        .iter()
        .map(|t| TierRow {
            label: t.label.clone(),
            range: match t.max {
                Some(max) => format!("{:.0}-{:.0} {}", t.min, max - 1.0, unit),
                None => format!("{:.0}+ {}", t.min, unit),
            },
            count: t.count,
        })
        .collect();
    print_table(rows);
}

#[derive(Tabled)]
struct RideRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Distance")]
    distance: String,
}

pub fn longest(rides: &[Ride], unit: DistanceUnit) {
    heading(&format!("Top {} longest rides", rides.len()));
    if rides.is_empty() {
        println!("No rides found.");
        return;
    }
    let rows = rides
        .iter()
        .enumerate()
        .map(|(i, r)| RideRow {
            rank: i + 1,
            date: r.date.format("%Y-%m-%d").to_string(),
            name: r.name.clone(),
            distance: format!("{:.1} {}", r.distance_in(unit), unit),
        })
        .collect();
    print_table(rows);
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Rides")]
    rides: usize,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "")]
    bar: String,
}

pub fn monthly(months: &[MonthSummary], unit: DistanceUnit) {
    heading("Monthly statistics");
    if months.is_empty() {
        println!("No rides found.");
        return;
    }
    let max = months.iter().map(|m| m.distance).fold(0.0, f64::max);
    let rows = months
        .iter()
        .map(|m| MonthRow {
            month: m.label(),
            rides: m.ride_count,
            distance: format!("{:.1} {}", m.distance, unit),
            bar: bar(m.distance, max),
        })
        .collect();
    print_table(rows);
}

const SUMMARY_MONTHS: usize = 12;

/// The last `count` entries of a chronological breakdown.
pub fn recent_months(months: &[MonthSummary], count: usize) -> &[MonthSummary] {
    &months[months.len().saturating_sub(count)..]
}

pub fn summary(report: &StatsReport) {
    let unit = report.unit;
    metrics(report.total_rides, &report.metrics, unit);
    eddington(&report.eddington, unit);
    year_to_date(&report.year_to_date, unit);
    if let Some(annual) = &report.annual_goal {
        heading(&format!("{} goal", report.year_to_date.year));
        goal_progress(annual);
    }
    yearly(&report.yearly, report.best_year, unit);
    distribution(&report.distribution, unit);
    distance_achievements(report.total_distance, &report.milestones, &report.milestone_rides, unit);
    longest(&report.longest, unit);
    monthly(recent_months(&report.monthly, SUMMARY_MONTHS), unit);
    if !report.active_goals.is_empty() {
        heading("Active goals");
        for progress in &report.active_goals {
            goal_progress(progress);
        }
    }
}

pub fn status(unit: DistanceUnit, data_dir: &std::path::Path, cache: &CacheInfo, goal_count: usize) {
    heading("Status");
    println!("Unit:      {} (elevation in {})", unit, unit.elevation_unit());
    println!("Data dir:  {}", data_dir.display());
    println!("Goals:     {}", goal_count);
    if cache.exists {
        println!("Cache:     {} ({} bytes)", cache.path.display(), cache.size_bytes);
        println!("Rides:     {}", cache.ride_count);
        if let Some(fetched_at) = cache.fetched_at {
            println!("Fetched:   {}", format_timestamp(fetched_at));
        }
    } else {
        println!("Cache:     none");
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[derive(Tabled)]
struct GoalRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Type")]
    goal_type: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Window")]
    window: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn goal_list(goals: &[Goal], today: chrono::NaiveDate) {
    if goals.is_empty() {
        println!("No goals found.");
        return;
    }
    let rows = goals
        .iter()
        .map(|g| GoalRow {
            id: g.short_id(),
            title: g.title.clone(),
            goal_type: g.goal_type.to_string(),
            target: format!("{} {}", g.target, g.unit),
            window: format!("{} to {}", g.start_date, g.end_date),
            status: g.window_status(today).to_string(),
        })
        .collect();
    print_table(rows);
}

pub fn goal_progress(progress: &GoalProgress) {
    let goal = &progress.goal;
    let unit = progress.unit;
    let mark = if progress.is_complete { "✅" } else { "🚴" };
    println!(
        "\n{} {} [{}] ({} to {})",
        mark,
        goal.title,
        goal.short_id(),
        goal.start_date,
        goal.end_date
    );
    println!(
        "   {:.1} / {:.1} {} ({:.1}%)  {}",
        progress.current_value,
        progress.target_value,
        unit,
        progress.percent_complete,
        bar(progress.percent_complete, 100.0)
    );
    println!(
        "   Day {} of {} ({:.1}% elapsed, {} remaining)",
        progress.days_elapsed, progress.days_total, progress.percent_elapsed, progress.days_remaining
    );
    let pace = match progress.pace {
        PaceStatus::OnTrack => "On track".to_string(),
        PaceStatus::Ahead => format!("Ahead of pace by {:.1}%", progress.pace_difference.abs()),
        PaceStatus::Behind => format!("Behind pace by {:.1}%", progress.pace_difference.abs()),
    };
    println!("   {}", pace);
    if !progress.is_complete && progress.days_remaining > 0 {
        println!(
            "   Needed: {:.1} {u}/day, {:.1} {u}/week, {:.1} {u}/month",
            progress.daily_target,
            progress.weekly_target,
            progress.monthly_target,
            u = unit
        );
    }
}
