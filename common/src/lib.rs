// Common library shared by the scheduler binary

pub mod calendar;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod models;
pub mod schedule;
pub mod telemetry;
pub mod templates;
pub mod tracker;
