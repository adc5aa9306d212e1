use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

use crate::error::{Error, Result};

/// Parses a goal window date relative to `today`.
///
/// Accepts `YYYY-MM-DD`, the keywords `today`, `tomorrow`, `som`/`eom`
/// (start/end of month), `soy`/`eoy` (start/end of year), relative offsets
/// `+Nd`, `+Nw`, `+Nm` and weekday names (`fri`, `2:fri`).
pub fn parse_human_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let input = input.trim();

    // 1. Reserved keywords
    match input.to_lowercase().as_str() {
        "today" | "tod" => return Ok(today),
        "tomorrow" | "tom" => return Ok(today + Duration::days(1)),
        "som" => return first_of_month(today.year(), today.month()),
        "eom" => return last_of_month(today.year(), today.month()),
        "soy" => return year_bounds(today.year()).map(|(start, _)| start),
        "eoy" => return year_bounds(today.year()).map(|(_, end)| end),
        _ => {}
    }

    // 2. Relative format (+Nd, +Nw, +Nm)
    if let Some(rest) = input.strip_prefix('+') {
        let unit = rest.chars().last().ok_or_else(|| invalid_date(input))?;
        let num_str = &rest[..rest.len() - unit.len_utf8()];
        let count: i64 = num_str.parse().map_err(|_| invalid_date(input))?;
        let offset = match unit {
            'd' => Duration::try_days(count),
            'w' => Duration::try_weeks(count),
            'm' => return add_months(today, count).map_err(|_| invalid_date(input)),
            _ => None,
        };
        return offset
            .and_then(|offset| today.checked_add_signed(offset))
            .ok_or_else(|| invalid_date(input));
    }

    // 3. Standard format
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(d);
    }

    // 4. Weekday format (fri, 2:fri)
    if let Some((count, day_str)) = parse_weekday_token(input) {
        if let Some(target) = parse_weekday_str(day_str) {
            let mut days_needed = target.num_days_from_sunday() as i64
                - today.weekday().num_days_from_sunday() as i64;
            if days_needed <= 0 {
                days_needed += 7;
            }
            return (count - 1)
                .checked_mul(7)
                .and_then(|extra| days_needed.checked_add(extra))
                .and_then(Duration::try_days)
                .and_then(|offset| today.checked_add_signed(offset))
                .ok_or_else(|| invalid_date(input));
        }
    }

    Err(invalid_date(input))
}

/// Extracts the calendar date written in an export timestamp.
///
/// The date is taken as written (no timezone shift), so a ride departing at
/// 23:30 local time stays on its local day.
pub fn parse_departed_at(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    let naive = input.trim_end_matches('Z');
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(naive, "%Y-%m-%d").ok()
}

/// First and last day of a calendar year.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| Error::Validation(format!("Invalid year: {}", year)))?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31)
        .ok_or_else(|| Error::Validation(format!("Invalid year: {}", year)))?;
    Ok((start, end))
}

/// Days in `[start, end]`, counting both ends.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::Validation(format!("Invalid month: {}-{}", year, month)))
}

fn last_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    Ok(first_of_month(next_year, next_month)? - Duration::days(1))
}

fn add_months(date: NaiveDate, count: i64) -> Result<NaiveDate> {
    let total = (date.year() as i64 * 12 + (date.month() as i64 - 1))
        .checked_add(count)
        .ok_or_else(|| Error::Validation(format!("Month offset out of range: {}", count)))?;
    let year = i32::try_from(total.div_euclid(12))
        .map_err(|_| Error::Validation(format!("Month offset out of range: {}", count)))?;
    let month = (total.rem_euclid(12) + 1) as u32;
    let first = first_of_month(year, month)?;
    // Jan 31 + 1m clamps to the end of February.
    match first.with_day(date.day()) {
        Some(d) => Ok(d),
        None => last_of_month(year, month),
    }
}

fn parse_weekday_token(input: &str) -> Option<(i64, &str)> {
    match input.split_once(':') {
        Some((count, day)) => count.parse::<i64>().ok().filter(|c| *c > 0).map(|c| (c, day)),
        None => Some((1, input)),
    }
}

fn parse_weekday_str(s: &str) -> Option<Weekday> {
    match s.to_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn invalid_date(input: &str) -> Error {
    Error::Validation(format!("Could not parse date: {}", input))
}
