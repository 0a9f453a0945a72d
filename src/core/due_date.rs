//! Payment due date for the ICMS differential.
//!
//! The differential is due on the 15th of the second month after emission,
//! moved to Monday when that day falls on a weekend. No holiday calendar
//! is applied.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use super::error::DifalError;

/// Days added to the first day of the emission month.
pub const DUE_DATE_OFFSET_DAYS: u64 = 60;

/// Day of month the differential falls due on.
pub const DUE_DAY: u32 = 15;

/// Compute the due date for an invoice emitted on `emission`.
///
/// Takes the first day of the emission month, adds 60 days, replaces the
/// day with the 15th, then shifts Saturday → Monday (+2) and
/// Sunday → Monday (+1).
///
/// ```
/// use chrono::NaiveDate;
/// use difal::core::due_date;
///
/// let emitted = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
/// assert_eq!(due_date(emitted), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
/// ```
pub fn due_date(emission: NaiveDate) -> NaiveDate {
    let month_start = emission.with_day(1).unwrap_or(emission);
    let shifted = month_start + Days::new(DUE_DATE_OFFSET_DAYS);
    // Day 15 exists in every month, so this never falls back.
    let due = shifted.with_day(DUE_DAY).unwrap_or(shifted);

    match due.weekday() {
        Weekday::Sat => due + Days::new(2),
        Weekday::Sun => due + Days::new(1),
        _ => due,
    }
}

/// Read the `YYYY-MM-DD` prefix of an NF-e `dhEmi` timestamp.
///
/// Time of day and offset are ignored.
pub fn emission_date(timestamp: &str) -> Result<NaiveDate, DifalError> {
    let prefix = timestamp
        .get(..10)
        .ok_or_else(|| DifalError::Date(timestamp.to_string()))?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .map_err(|_| DifalError::Date(timestamp.to_string()))
}

/// Due date straight from a raw `dhEmi` timestamp.
pub fn due_date_from_timestamp(timestamp: &str) -> Result<NaiveDate, DifalError> {
    emission_date(timestamp).map(due_date)
}

/// Render a date the way Brazilian reports show it (`DD/MM/YYYY`).
pub fn format_due_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
