// Calendar context and nth-weekday date arithmetic
//
// Everything the schedule matcher needs to know about "today" is derived
// here, once per run. Weekday numbering is a fixed Monday-first week
// (0 = Mon .. 6 = Sun), independent of the host locale.

use crate::errors::ScheduleError;
use chrono::{Datelike, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;

/// Lowercase three-letter weekday names, Monday first.
///
/// This table is the single source of weekday numbering. Both the
/// context builder and the nth-weekday resolver go through it so the
/// two can never disagree.
pub const WEEKDAY_NAMES: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Lowercase three-letter month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Month token that matches any month in a day/month rule.
pub const MONTH_WILDCARD: &str = "*";

/// Resolve a weekday token to its Monday-first index.
///
/// Accepts a numeric index ("0".."6") or a name. Names are matched
/// case-insensitively on their first three letters, so "thu", "thur"
/// and "Thursday" all resolve to 3.
pub fn weekday_index(token: &str) -> Result<u32, ScheduleError> {
    let normalized = token.trim().to_ascii_lowercase();

    if normalized.chars().all(|c| c.is_ascii_digit()) && !normalized.is_empty() {
        return match normalized.parse::<u32>() {
            Ok(index) if index < 7 => Ok(index),
            _ => Err(ScheduleError::UnknownWeekday(token.to_string())),
        };
    }

    let abbrev = match normalized.get(..3) {
        Some(prefix) => prefix,
        None => return Err(ScheduleError::UnknownWeekday(token.to_string())),
    };

    WEEKDAY_NAMES
        .iter()
        .position(|name| *name == abbrev)
        .map(|index| index as u32)
        .ok_or_else(|| ScheduleError::UnknownWeekday(token.to_string()))
}

/// Immutable snapshot of one calendar date in every form the schedule
/// matcher consumes. Built once per run and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarContext {
    pub date: NaiveDate,
    /// ISO date, YYYY-MM-DD.
    pub date_string: String,
    pub year: i32,
    /// 1-12
    pub month: u32,
    /// 1-31, no leading zero when rendered as a string.
    pub day_of_month: u32,
    /// Lowercase three-letter name, e.g. "mon".
    pub weekday_name: &'static str,
    /// 0 = Mon .. 6 = Sun.
    pub weekday_index: u32,
    /// Numeric month as a string, three-letter month name, and the
    /// wildcard token. Month tokens from day/month rules are checked
    /// for membership here.
    pub month_tokens: HashSet<String>,
}

impl CalendarContext {
    /// Build the context for a specific date. Pure and infallible for
    /// any valid `NaiveDate`, which makes runs reproducible from an
    /// injected reference date.
    pub fn for_date(date: NaiveDate) -> Self {
        let weekday_index = date.weekday().num_days_from_monday();
        let month = date.month();

        let mut month_tokens = HashSet::new();
        month_tokens.insert(month.to_string());
        month_tokens.insert(MONTH_NAMES[(month - 1) as usize].to_string());
        month_tokens.insert(MONTH_WILDCARD.to_string());

        Self {
            date,
            date_string: date.format("%Y-%m-%d").to_string(),
            year: date.year(),
            month,
            day_of_month: date.day(),
            weekday_name: WEEKDAY_NAMES[weekday_index as usize],
            weekday_index,
            month_tokens,
        }
    }

    /// Build the context for the current date in the given timezone.
    pub fn today_in(timezone: Tz) -> Self {
        Self::for_date(Utc::now().with_timezone(&timezone).date_naive())
    }
}

/// Date of the first occurrence of `weekday_index` in `(year, month)`.
///
/// The offset from the 1st is computed with modular arithmetic, so it
/// always lands in 0..=6 regardless of the sign of the raw subtraction.
/// Returns an error only when `(year, month)` is not a valid calendar
/// month, which is a caller contract violation rather than a schedule
/// problem.
pub fn first_occurrence(
    year: i32,
    month: u32,
    weekday_index: u32,
) -> Result<NaiveDate, ScheduleError> {
    let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(ScheduleError::InvalidMonth { year, month })?;

    let first_weekday = first_of_month.weekday().num_days_from_monday();
    let offset = (weekday_index + 7 - first_weekday) % 7;

    // offset is in 0..=6, so this stays within the month
    Ok(first_of_month + Days::new(u64::from(offset)))
}

/// Date of the n-th occurrence (1-based) of `weekday_index` in
/// `(year, month)`.
///
/// No upper bound is enforced: asking for the 5th Monday of a month
/// that only has four yields a date in the following month. The
/// matcher compares dates for equality, so that case silently fails
/// to match instead of erroring. An `n` so large the result leaves
/// chrono's representable range is reported as out of range; the
/// matcher treats that as "no such occurrence".
pub fn nth_occurrence(
    year: i32,
    month: u32,
    weekday_index: u32,
    n: u32,
) -> Result<NaiveDate, ScheduleError> {
    let first = first_occurrence(year, month, weekday_index)?;
    first
        .checked_add_days(Days::new(u64::from(n.saturating_sub(1)) * 7))
        .ok_or(ScheduleError::OccurrenceOutOfRange {
            year,
            month,
            weekday: weekday_index,
            n,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_context_facets_for_known_date() {
        // 2024-03-21 is a Thursday
        let ctx = CalendarContext::for_date(date(2024, 3, 21));
        assert_eq!(ctx.date_string, "2024-03-21");
        assert_eq!(ctx.year, 2024);
        assert_eq!(ctx.month, 3);
        assert_eq!(ctx.day_of_month, 21);
        assert_eq!(ctx.weekday_name, "thu");
        assert_eq!(ctx.weekday_index, 3);
    }

    #[test]
    fn test_context_month_tokens() {
        let ctx = CalendarContext::for_date(date(2024, 3, 21));
        assert!(ctx.month_tokens.contains("3"));
        assert!(ctx.month_tokens.contains("mar"));
        assert!(ctx.month_tokens.contains("*"));
        assert!(!ctx.month_tokens.contains("03"));
        assert!(!ctx.month_tokens.contains("jun"));
    }

    #[test]
    fn test_weekday_numbering_is_monday_first() {
        // 2024-01-01 is a Monday
        let ctx = CalendarContext::for_date(date(2024, 1, 1));
        assert_eq!(ctx.weekday_index, 0);
        assert_eq!(ctx.weekday_name, "mon");

        // 2024-01-07 is a Sunday
        let ctx = CalendarContext::for_date(date(2024, 1, 7));
        assert_eq!(ctx.weekday_index, 6);
        assert_eq!(ctx.weekday_name, "sun");
    }

    #[test]
    fn test_weekday_index_from_names() {
        assert_eq!(weekday_index("mon").unwrap(), 0);
        assert_eq!(weekday_index("Thursday").unwrap(), 3);
        assert_eq!(weekday_index("thur").unwrap(), 3);
        assert_eq!(weekday_index("SUN").unwrap(), 6);
        assert_eq!(weekday_index(" fri ").unwrap(), 4);
    }

    #[test]
    fn test_weekday_index_from_digits() {
        assert_eq!(weekday_index("0").unwrap(), 0);
        assert_eq!(weekday_index("6").unwrap(), 6);
        assert!(weekday_index("7").is_err());
    }

    #[test]
    fn test_weekday_index_rejects_unknown() {
        assert!(matches!(
            weekday_index("funday"),
            Err(ScheduleError::UnknownWeekday(_))
        ));
        assert!(weekday_index("").is_err());
        assert!(weekday_index("mo").is_err());
    }

    #[test]
    fn test_first_occurrence_when_first_is_target() {
        // 2024-01-01 is a Monday: offset 0
        assert_eq!(first_occurrence(2024, 1, 0).unwrap(), date(2024, 1, 1));
    }

    #[test]
    fn test_first_occurrence_full_wraparound() {
        // 2024-01-01 is a Monday, so the first Sunday needs offset 6
        assert_eq!(first_occurrence(2024, 1, 6).unwrap(), date(2024, 1, 7));
    }

    #[test]
    fn test_first_occurrence_mid_week() {
        // 2024-03-01 is a Friday; first Thursday is the 7th
        assert_eq!(first_occurrence(2024, 3, 3).unwrap(), date(2024, 3, 7));
    }

    #[test]
    fn test_nth_occurrence_third_thursday_march_2024() {
        assert_eq!(nth_occurrence(2024, 3, 3, 3).unwrap(), date(2024, 3, 21));
    }

    #[test]
    fn test_nth_occurrence_first_equals_first_occurrence() {
        for weekday in 0..7 {
            assert_eq!(
                nth_occurrence(2024, 6, weekday, 1).unwrap(),
                first_occurrence(2024, 6, weekday).unwrap()
            );
        }
    }

    #[test]
    fn test_nth_occurrence_overflows_into_next_month() {
        // March 2024 has four Mondays (4th, 11th, 18th, 25th)
        let fifth = nth_occurrence(2024, 3, 0, 5).unwrap();
        assert_eq!(fifth, date(2024, 4, 1));
        assert_ne!(fifth.month(), 3);
    }

    #[test]
    fn test_nth_occurrence_unrepresentable_n_is_out_of_range() {
        // Large enough to leave chrono's date range entirely
        assert!(matches!(
            nth_occurrence(2024, 3, 0, u32::MAX),
            Err(ScheduleError::OccurrenceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_invalid_month_is_an_error() {
        assert!(matches!(
            first_occurrence(2024, 13, 0),
            Err(ScheduleError::InvalidMonth { .. })
        ));
    }
}
