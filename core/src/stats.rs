use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Datelike;

use crate::error::{Error, Result};
use crate::model::ride::Ride;
use crate::model::stats::{
    DistanceBucket, EddingtonProgress, MilestoneAchievement, MilestoneTier, MonthSummary,
    RideMetrics, YearSummary, YearToDate,
};
use crate::units::DistanceUnit;

pub fn distances(rides: &[Ride], unit: DistanceUnit) -> Vec<f64> {
    rides.iter().map(|r| r.distance_in(unit)).collect()
}

pub fn total_distance(rides: &[Ride], unit: DistanceUnit) -> f64 {
    rides.iter().map(|r| r.distance_in(unit)).sum()
}

pub fn total_rides(rides: &[Ride]) -> usize {
    rides.len()
}

/// Number of distances that are at least `threshold`.
fn count_at_least(sorted_desc: &[f64], threshold: f64) -> usize {
    sorted_desc.partition_point(|&d| d >= threshold)
}

fn sorted_desc(distances: &[f64]) -> Vec<f64> {
    let mut sorted = distances.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted
}

/// Largest E such that at least E distances are each >= E.
pub fn eddington_from_distances(distances: &[f64]) -> u32 {
    let sorted = sorted_desc(distances);
    let mut e: u32 = 1;
    loop {
        if count_at_least(&sorted, e as f64) < e as usize {
            return e - 1;
        }
        e += 1;
    }
}

pub fn eddington_number(rides: &[Ride], unit: DistanceUnit) -> u32 {
    eddington_from_distances(&distances(rides, unit))
}

pub fn eddington_progress(rides: &[Ride], unit: DistanceUnit) -> EddingtonProgress {
    let distances = distances(rides, unit);
    let sorted = sorted_desc(&distances);
    let current = eddington_from_distances(&distances);

    let rides_at_next = count_at_least(&sorted, (current + 1) as f64);
    let rides_at_after_next = count_at_least(&sorted, (current + 2) as f64);

    EddingtonProgress {
        current,
        rides_at_next,
        needed_for_next: (current as usize + 1).saturating_sub(rides_at_next),
        rides_at_after_next,
        needed_for_after_next: (current as usize + 2).saturating_sub(rides_at_after_next),
    }
}

pub fn yearly_breakdown(rides: &[Ride], unit: DistanceUnit) -> BTreeMap<i32, YearSummary> {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for ride in rides {
        by_year
            .entry(ride.date.year())
            .or_default()
            .push(ride.distance_in(unit));
    }

    by_year
        .into_iter()
        .map(|(year, distances)| {
            let summary = YearSummary {
                distance: distances.iter().sum(),
                ride_count: distances.len(),
                eddington: eddington_from_distances(&distances),
            };
            (year, summary)
        })
        .collect()
}

/// Year with the highest yearly Eddington number; the latest year wins ties.
pub fn highest_yearly_eddington(breakdown: &BTreeMap<i32, YearSummary>) -> Option<(i32, u32)> {
    breakdown
        .iter()
        .map(|(year, summary)| (*year, summary.eddington))
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
}

pub fn year_to_date(rides: &[Ride], unit: DistanceUnit, year: i32) -> YearToDate {
    let year_rides: Vec<Ride> = rides
        .iter()
        .filter(|r| r.date.year() == year)
        .cloned()
        .collect();
    let progress = eddington_progress(&year_rides, unit);

    YearToDate {
        year,
        ride_count: year_rides.len(),
        distance: total_distance(&year_rides, unit),
        eddington: progress.current,
        next_target: progress.next(),
        rides_at_target: progress.rides_at_next,
        rides_needed: progress.needed_for_next,
    }
}

/// Per-month totals in chronological order.
pub fn monthly_breakdown(rides: &[Ride], unit: DistanceUnit) -> Vec<MonthSummary> {
    let mut by_month: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
    for ride in rides {
        let entry = by_month
            .entry((ride.date.year(), ride.date.month()))
            .or_insert((0.0, 0));
        entry.0 += ride.distance_in(unit);
        entry.1 += 1;
    }

    by_month
        .into_iter()
        .map(|((year, month), (distance, ride_count))| MonthSummary {
            year,
            month,
            distance,
            ride_count,
        })
        .collect()
}

const MAX_BUCKET_INDEX: f64 = u32::MAX as f64;

/// Fixed-width buckets starting at 0; only non-empty buckets are returned.
pub fn distance_distribution(
    rides: &[Ride],
    unit: DistanceUnit,
    bucket_width: f64,
) -> Result<Vec<DistanceBucket>> {
    if !bucket_width.is_finite() || bucket_width <= 0.0 {
        return Err(Error::Validation(format!(
            "Bucket width must be positive, got {}",
            bucket_width
        )));
    }

    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    for ride in rides {
        let index = (ride.distance_in(unit) / bucket_width).floor();
        if index >= MAX_BUCKET_INDEX {
            return Err(Error::Validation(format!(
                "Bucket width {} is too small for a {:.1} {} ride",
                bucket_width,
                ride.distance_in(unit),
                unit
            )));
        }
        *counts.entry(index as u64).or_default() += 1;
    }

    Ok(counts
        .into_iter()
        .map(|(index, count)| DistanceBucket {
            lower: index as f64 * bucket_width,
            upper: (index + 1) as f64 * bucket_width,
            count,
        })
        .collect())
}

/// Longest rides first; equal distances show the most recent ride first.
pub fn longest_rides(rides: &[Ride], n: usize) -> Vec<Ride> {
    let mut sorted = rides.to_vec();
    sorted.sort_by(|a, b| {
        b.distance_km
            .total_cmp(&a.distance_km)
            .then_with(|| b.date.cmp(&a.date))
            .then_with(|| b.id.cmp(&a.id))
    });
    sorted.truncate(n);
    sorted
}

/// Date on which the lifetime running total first reached each milestone.
pub fn distance_milestones(
    rides: &[Ride],
    unit: DistanceUnit,
    milestones: &[f64],
) -> Vec<MilestoneAchievement> {
    let mut chronological: Vec<&Ride> = rides.iter().collect();
    chronological.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let mut running = Vec::with_capacity(chronological.len());
    let mut total = 0.0;
    for ride in chronological {
        total += ride.distance_in(unit);
        running.push((total, ride.date));
    }

    milestones
        .iter()
        .map(|&milestone| MilestoneAchievement {
            milestone,
            achieved_on: running
                .iter()
                .find(|(total, _)| *total >= milestone)
                .map(|(_, date)| *date),
        })
        .collect()
}

struct TierSpec {
    label: &'static str,
    min: f64,
    max: Option<f64>,
}

const MILE_TIERS: &[TierSpec] = &[
    TierSpec { label: "Century", min: 100.0, max: None },
    TierSpec { label: "Double century", min: 200.0, max: None },
    TierSpec { label: "Triple century", min: 300.0, max: None },
    TierSpec { label: "Quad century", min: 400.0, max: None },
];

const KM_TIERS: &[TierSpec] = &[
    TierSpec { label: "Randonneur 50", min: 50.0, max: Some(100.0) },
    TierSpec { label: "Randonneur 100", min: 100.0, max: Some(150.0) },
    TierSpec { label: "Randonneur 150", min: 150.0, max: Some(200.0) },
    TierSpec { label: "Randonneur 200", min: 200.0, max: Some(300.0) },
    TierSpec { label: "Randonneur 300", min: 300.0, max: Some(400.0) },
    TierSpec { label: "Randonneur 400", min: 400.0, max: Some(600.0) },
    TierSpec { label: "Randonneur 600", min: 600.0, max: Some(1000.0) },
    TierSpec { label: "Randonneur 1000", min: 1000.0, max: None },
];

/// Single-ride achievement tiers: open-ended centuries in miles,
/// disjoint randonneur bands in km.
pub fn milestone_rides(rides: &[Ride], unit: DistanceUnit) -> Vec<MilestoneTier> {
    let tiers = match unit {
        DistanceUnit::Miles => MILE_TIERS,
        DistanceUnit::Km => KM_TIERS,
    };
    let distances = distances(rides, unit);

    tiers
        .iter()
        .map(|tier| MilestoneTier {
            label: tier.label.to_string(),
            min: tier.min,
            max: tier.max,
            count: distances
                .iter()
                .filter(|&&d| d >= tier.min && tier.max.map_or(true, |max| d < max))
                .count(),
        })
        .collect()
}

pub fn ride_metrics(rides: &[Ride], unit: DistanceUnit) -> RideMetrics {
    if rides.is_empty() {
        return RideMetrics::default();
    }
    let distances = distances(rides, unit);
    let total: f64 = distances.iter().sum();
    let longest = distances
        .iter()
        .cloned()
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .unwrap_or(0.0);

    RideMetrics {
        longest,
        average: total / distances.len() as f64,
        total,
    }
}
