// Schedule matching
//
// Decides whether a template's schedule fires on a given calendar date.
// A schedule may carry up to three rule tiers (every, day/month, nth),
// evaluated in that order as independent predicates with OR semantics:
// the first satisfied tier wins, and a well-formed rule never errors on
// a no-match path.

use crate::calendar::{self, CalendarContext, MONTH_WILDCARD};
use crate::errors::ScheduleError;
use crate::models::{NthRule, ScheduleRule};
use tracing::warn;

/// Token in an `every` rule that fires on every run.
const EVERY_RUN: &str = "run";

/// Matching interface for schedule rules.
pub trait ScheduleMatch {
    /// True when the schedule fires on the context's date.
    ///
    /// Configuration errors (empty schedule, malformed nth tier) are
    /// logged and evaluate to false; they never fail the run.
    fn matches(&self, ctx: &CalendarContext) -> bool;

    /// Strict variant: configuration errors surface as `Err` instead
    /// of being logged.
    fn try_matches(&self, ctx: &CalendarContext) -> Result<bool, ScheduleError>;
}

impl ScheduleMatch for ScheduleRule {
    fn matches(&self, ctx: &CalendarContext) -> bool {
        match self.try_matches(ctx) {
            Ok(matched) => matched,
            Err(error) => {
                warn!(error = %error, "Invalid schedule treated as not matching");
                false
            }
        }
    }

    fn try_matches(&self, ctx: &CalendarContext) -> Result<bool, ScheduleError> {
        if self.every.is_none() && self.day.is_none() && self.nth.is_none() {
            return Err(ScheduleError::EmptySchedule);
        }

        if let Some(every) = &self.every {
            if every_matches(every, ctx) {
                return Ok(true);
            }
        }

        if let Some(day) = &self.day {
            if day_month_matches(day, self.month.as_deref(), ctx) {
                return Ok(true);
            }
        }

        if let Some(nth) = &self.nth {
            if nth_matches(nth, ctx)? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// Every-rule tier: slash-delimited tokens, each either "run" (fires
/// unconditionally) or a weekday matched by name or Monday-first index.
///
/// Weekday tokens resolve through the shared lookup table, so the
/// spellings accepted here are exactly the ones the nth tier accepts
/// ("thu", "thur", "Thursday", "3"). A token that resolves to nothing
/// simply does not match.
pub fn every_matches(spec: &str, ctx: &CalendarContext) -> bool {
    spec.split('/').any(|token| {
        let token = token.trim();
        token.eq_ignore_ascii_case(EVERY_RUN)
            || calendar::weekday_index(token)
                .is_ok_and(|index| index == ctx.weekday_index)
    })
}

/// Day/month tier: fires when any day token equals today's day of
/// month and any month token is in the context's month-token set.
///
/// Day and month lists are crossed as a nested existence check, not
/// zipped positionally: `day = "1/15", month = "jan/jun"` fires on
/// 1 Jan, 15 Jan, 1 Jun and 15 Jun. An absent month list defaults to
/// the wildcard, and the context's token set always contains the
/// wildcard, so an explicit "*" month token matches any month.
pub fn day_month_matches(days: &str, months: Option<&str>, ctx: &CalendarContext) -> bool {
    let day_of_month = ctx.day_of_month.to_string();
    let day_matched = days.split('/').any(|token| token.trim() == day_of_month);
    if !day_matched {
        return false;
    }

    months.unwrap_or(MONTH_WILDCARD).split('/').any(|token| {
        ctx.month_tokens
            .contains(&token.trim().to_ascii_lowercase())
    })
}

/// Nth tier: fires only when the context's date is exactly the n-th
/// occurrence of the rule's weekday in the current month.
///
/// Both `weekday` and `n` must be present and the weekday token must
/// resolve; anything else is a configuration error. An `n` past the
/// end of the month resolves into the following month and simply
/// compares unequal; an `n` so large the date is unrepresentable has
/// no occurrence to match and evaluates to false rather than erroring.
pub fn nth_matches(rule: &NthRule, ctx: &CalendarContext) -> Result<bool, ScheduleError> {
    let weekday = rule
        .weekday
        .as_deref()
        .ok_or(ScheduleError::IncompleteNthRule("weekday"))?;
    let n = rule.n.ok_or(ScheduleError::IncompleteNthRule("n"))?;

    let weekday_index = calendar::weekday_index(weekday)?;
    let target = match calendar::nth_occurrence(ctx.year, ctx.month, weekday_index, n) {
        Ok(date) => date,
        Err(ScheduleError::OccurrenceOutOfRange { .. }) => return Ok(false),
        Err(e) => return Err(e),
    };

    Ok(target.format("%Y-%m-%d").to_string() == ctx.date_string)
}
