// Error handling framework

use thiserror::Error;

/// Schedule configuration errors
///
/// These are per-template configuration problems. The dispatcher reports
/// them and treats the offending rule as not matching; they never abort
/// a run.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Schedule defines no recognized rule (expected 'every', 'day' or 'nth')")]
    EmptySchedule,

    #[error("Unknown weekday token: '{0}'")]
    UnknownWeekday(String),

    #[error("Nth rule is missing required field '{0}'")]
    IncompleteNthRule(&'static str),

    #[error("Invalid calendar month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Occurrence {n} of weekday {weekday} in {year}-{month} is not a representable date")]
    OccurrenceOutOfRange {
        year: i32,
        month: u32,
        weekday: u32,
        n: u32,
    },
}

/// Issue tracker errors
///
/// Raised by the tracker collaborator. Caught per-template at the
/// dispatcher boundary; a failing ticket creation never stops the run.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    #[error("Tracker authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Tracker request failed: {0}")]
    RequestFailed(String),

    #[error("Tracker returned unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Tracker user not found: {0}")]
    UserNotFound(String),

    #[error("Failed to decode tracker response: {0}")]
    InvalidResponse(String),
}
