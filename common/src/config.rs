// Configuration management with layered configuration (file, env)

use chrono::NaiveDate;
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub tracker: TrackerConfig,
    pub scheduler: SchedulerRunConfig,
    pub observability: ObservabilityConfig,
}

/// Connection settings for the external issue tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub server_url: String,
    /// Private token; anonymous access is allowed when absent.
    #[serde(default)]
    pub token: Option<String>,
    pub timeout_seconds: u64,
}

/// Settings for one evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerRunConfig {
    /// Print ticket creations instead of calling the tracker.
    #[serde(default)]
    pub dry_run: bool,
    /// Labels applied to every created ticket, merged with each
    /// template's own labels.
    #[serde(default)]
    pub default_labels: Vec<String>,
    /// Path to the TOML document holding the ticket templates.
    pub templates_file: String,
    /// IANA timezone used to derive "today".
    pub timezone: String,
    /// Optional YYYY-MM-DD override of "today" for deterministic runs.
    #[serde(default)]
    pub reference_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment-specific configuration
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.tracker.server_url.is_empty() {
            return Err("Tracker server_url cannot be empty".to_string());
        }
        if self.tracker.timeout_seconds == 0 {
            return Err("Tracker timeout_seconds must be greater than 0".to_string());
        }

        if self.scheduler.templates_file.is_empty() {
            return Err("Scheduler templates_file cannot be empty".to_string());
        }
        self.scheduler.timezone()?;
        self.scheduler.reference_date()?;

        Ok(())
    }
}

impl SchedulerRunConfig {
    /// Parsed timezone for deriving the run date.
    pub fn timezone(&self) -> Result<Tz, String> {
        Tz::from_str(&self.timezone).map_err(|_| format!("Invalid timezone: {}", self.timezone))
    }

    /// Parsed reference date override, when configured.
    pub fn reference_date(&self) -> Result<Option<NaiveDate>, String> {
        match &self.reference_date {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| format!("Invalid reference_date (expected YYYY-MM-DD): {raw}")),
            None => Ok(None),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig {
                server_url: "https://gitlab.com".to_string(),
                token: None,
                timeout_seconds: 30,
            },
            scheduler: SchedulerRunConfig {
                dry_run: false,
                default_labels: Vec::new(),
                templates_file: "templates.toml".to_string(),
                timezone: "UTC".to_string(),
                reference_date: None,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_empty_server_url() {
        let mut settings = Settings::default();
        settings.tracker.server_url = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_timeout() {
        let mut settings = Settings::default();
        settings.tracker.timeout_seconds = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_bad_timezone() {
        let mut settings = Settings::default();
        settings.scheduler.timezone = "Mars/Olympus_Mons".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_bad_reference_date() {
        let mut settings = Settings::default();
        settings.scheduler.reference_date = Some("21-03-2024".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_reference_date_parses() {
        let mut settings = Settings::default();
        settings.scheduler.reference_date = Some("2024-03-21".to_string());
        let parsed = settings.scheduler.reference_date().unwrap().unwrap();
        assert_eq!(parsed.to_string(), "2024-03-21");
    }

    #[test]
    fn test_timezone_parses() {
        let mut settings = Settings::default();
        settings.scheduler.timezone = "Europe/London".to_string();
        assert!(settings.scheduler.timezone().is_ok());
    }
}
