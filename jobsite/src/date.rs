use crate::error::JobsiteError;
use chrono::{Datelike, Days, NaiveDate};
use log::warn;
use serde::Serialize;

/// Upper bound on the number of weekly buckets produced by `split_into_weeks`
pub const MAX_WEEKS: usize = 52;

/// One Sunday to Saturday payroll week.
///
/// `week_start`/`week_end` always span the full week, while `period_start`/`period_end`
/// are clipped to the requested date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekRange {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

impl WeekRange {
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.period_start && date <= self.period_end
    }
}

/// Parses a `YYYY-MM-DD` date
///
/// # Errors
/// Returns `JobsiteError::BadInput` if the string is not a valid date
pub fn parse_date(s: &str) -> Result<NaiveDate, JobsiteError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| JobsiteError::BadInput(format!("'{s}' is not a date (YYYY-MM-DD): {e}")))
}

/// The Sunday on or before `date`
#[must_use]
pub fn week_start_for(date: NaiveDate) -> NaiveDate {
    let days = date.weekday().num_days_from_sunday();
    date - Days::new(u64::from(days))
}

/// The Saturday on or after `date`
#[must_use]
pub fn week_end_for(date: NaiveDate) -> NaiveDate {
    week_start_for(date) + Days::new(6)
}

/// Position of the date within its payroll week, Sunday is 0 and Saturday is 6
#[must_use]
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

/// Number of payroll weeks touched by the inclusive range `start..=end`
#[must_use]
pub fn weeks_spanned(start: NaiveDate, end: NaiveDate) -> i64 {
    let days = (week_end_for(end) - week_start_for(start)).num_days() + 1;
    days / 7
}

/// Splits the inclusive range `start..=end` into Sunday to Saturday buckets.
///
/// The buckets are contiguous and never overlap. At most `MAX_WEEKS` buckets are
/// returned; longer ranges are truncated.
///
/// # Errors
/// Returns `JobsiteError::BadInput` if `end` is before `start`
pub fn split_into_weeks(start: NaiveDate, end: NaiveDate) -> Result<Vec<WeekRange>, JobsiteError> {
    if end < start {
        return Err(JobsiteError::BadInput(format!(
            "End date {end} is before start date {start}"
        )));
    }

    let mut weeks = Vec::new();
    let mut week_start = week_start_for(start);

    while week_start <= end {
        if weeks.len() == MAX_WEEKS {
            warn!("Date range {start}..{end} exceeds {MAX_WEEKS} weeks and was truncated");
            break;
        }
        let week_end = week_start + Days::new(6);
        weeks.push(WeekRange {
            week_start,
            week_end,
            period_start: start.max(week_start),
            period_end: end.min(week_end),
        });
        week_start = week_end + Days::new(1);
    }
    Ok(weeks)
}
