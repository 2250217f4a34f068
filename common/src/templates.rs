// Ticket template loading
//
// Templates live in a standalone TOML document with a top-level
// [[templates]] array. Loading goes through the same `config` crate
// machinery as the settings so the two formats behave identically.

use crate::models::TicketTemplate;
use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TemplatesFile {
    #[serde(default)]
    templates: Vec<TicketTemplate>,
}

/// Load all ticket templates from the given TOML file.
///
/// A missing or malformed file is a startup error; individual schedule
/// problems inside a template are not (the matcher reports those
/// per-template at evaluation time).
pub fn load_templates<P: AsRef<Path>>(path: P) -> Result<Vec<TicketTemplate>, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path.as_ref()))
        .build()?;

    let file: TemplatesFile = config.try_deserialize()?;
    Ok(file.templates)
}
