//! Period partitioning for weekly / monthly / yearly reports.
//!
//! Boundaries are chained: each period starts where the previous one ended.
//! A monthly or yearly step whose target day does not exist in the target
//! month rolls forward to the first of the following month instead of
//! clamping, so the anchor's day-of-month can drift after a short month.

use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Date, Timestamp};

/// Bucket size for periodic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Weekly,
    Monthly,
    Yearly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Key naming the period number in composed blocks.
    pub fn number_field(&self) -> &'static str {
        match self {
            Self::Weekly => "week_number",
            Self::Monthly => "month_number",
            Self::Yearly => "year_number",
        }
    }

    /// Next boundary after `from`, strictly later than it. `None` past the
    /// end of the calendar.
    pub fn step(&self, from: Date) -> Option<Date> {
        match self {
            Self::Weekly => from.checked_add_days(Days::new(7)),
            Self::Monthly => add_months_rolling(from, 1),
            Self::Yearly => add_months_rolling(from, 12),
        }
    }
}

impl FromStr for Granularity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(CoreError::Validation(format!(
                "Invalid periodical type '{s}'. Must be one of: weekly, monthly, yearly"
            ))),
        }
    }
}

/// Adds whole months; a day missing from the target month becomes the 1st of
/// the month after it.
fn add_months_rolling(from: Date, months: u32) -> Option<Date> {
    let target_first = from.with_day(1)?.checked_add_months(Months::new(months))?;
    match target_first.with_day(from.day()) {
        Some(d) => Some(d),
        None => target_first.checked_add_months(Months::new(1)),
    }
}

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

/// One half-open interval `[start, end)` of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// 1-based position in the partition.
    pub index: usize,
    pub start: Date,
    pub end: Date,
}

impl Period {
    /// `"<start>  To <last day>"`, both as `YYYY-MM-DD`.
    pub fn label(&self) -> String {
        let last = self.end.pred_opt().unwrap_or(self.start);
        format!("{}  To {}", self.start.format("%Y-%m-%d"), last.format("%Y-%m-%d"))
    }

    pub fn contains_date(&self, date: Date) -> bool {
        self.start <= date && date < self.end
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        self.contains_date(ts.date_naive())
    }

    pub fn start_time(&self) -> Timestamp {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    pub fn end_time(&self) -> Timestamp {
        self.end.and_time(NaiveTime::MIN).and_utc()
    }
}

/// Splits `[anchor, end]` into contiguous periods.
///
/// The last period always ends at `end + 1 day`, so it may be shorter than a
/// full step. Fails if `anchor` is after `end`.
pub fn partition(anchor: Date, end: Date, granularity: Granularity) -> Result<Vec<Period>, CoreError> {
    if anchor > end {
        return Err(CoreError::Validation(format!(
            "Start date {anchor} is after end date {end}"
        )));
    }
    let stop = end.succ_opt().ok_or_else(|| {
        CoreError::Validation(format!("End date {end} is out of range"))
    })?;

    let mut periods = Vec::new();
    let mut start = anchor;
    while start < stop {
        let next = granularity.step(start).map_or(stop, |d| d.min(stop));
        periods.push(Period {
            index: periods.len() + 1,
            start,
            end: next,
        });
        start = next;
    }
    Ok(periods)
}

/// Parses a `YYYY-MM-DD` date with a year in `1..=9999`.
pub fn parse_date(s: &str) -> Result<Date, CoreError> {
    let invalid = || CoreError::Validation(format!("Invalid date '{s}'. Expected format YYYY-MM-DD"));
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
    if !(1..=9999).contains(&date.year()) {
        return Err(invalid());
    }
    Ok(date)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
