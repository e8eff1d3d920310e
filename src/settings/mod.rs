//! Settings module for nodesub
//!
//! This module contains all the configuration settings. Every field has a
//! default, so an empty TOML document is a valid configuration.

mod source_config;
mod toml_settings;

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::file::file_exists;

pub use source_config::{SourceConfig, TemplateNode};
pub use toml_settings::{
    CacheSettings, FilterPolicy, FilterSettings, HttpSettings, MatchTarget, NormalizeSettings,
    OutputSettings, RegionRule, RenameSettings,
};

/// Configuration file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "nodesub.toml";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid timezone offset: {0} hours")]
    InvalidTimezone(i32),

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("Invalid backoff factor: {0} (expected 0 to 60 seconds)")]
    InvalidBackoff(f64),
}

/// Largest accepted `http.backoff_factor`, in seconds
pub const MAX_BACKOFF_FACTOR: f64 = 60.0;

fn default_timezone_offset_hours() -> i32 {
    8
}

/// Settings structure to hold the whole run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Offset from UTC used for date suffixes and `{date}` in output names
    pub timezone_offset_hours: i32,
    pub http: HttpSettings,
    pub cache: CacheSettings,
    pub output: OutputSettings,
    pub normalize: NormalizeSettings,
    pub filter: FilterSettings,
    pub rename: RenameSettings,
    pub sources: Vec<SourceConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            timezone_offset_hours: default_timezone_offset_hours(),
            http: HttpSettings::default(),
            cache: CacheSettings::default(),
            output: OutputSettings::default(),
            normalize: NormalizeSettings::default(),
            filter: FilterSettings::default(),
            rename: RenameSettings::default(),
            sources: source_config::default_sources(),
        }
    }
}

impl Settings {
    /// Parses settings from TOML content and validates them.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads and parses a TOML configuration file.
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads settings from `path`, or from [`DEFAULT_CONFIG_FILE`] when it
    /// exists, or falls back to the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => {
                log::info!("Loading settings from {}", path.display());
                Self::load_from_file(path)
            }
            None if file_exists(Path::new(DEFAULT_CONFIG_FILE)) => {
                log::info!("Loading settings from {}", DEFAULT_CONFIG_FILE);
                Self::load_from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => {
                log::info!("No config file found, using built-in defaults");
                Ok(Settings::default())
            }
        }
    }

    /// Checks the timezone offset, the retry backoff and the date suffix format.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.timezone()?;
        let backoff = self.http.backoff_factor;
        if !(0.0..=MAX_BACKOFF_FACTOR).contains(&backoff) {
            return Err(SettingsError::InvalidBackoff(backoff));
        }
        let has_error = StrftimeItems::new(&self.rename.date_format)
            .any(|item| matches!(item, Item::Error));
        if has_error {
            return Err(SettingsError::InvalidDateFormat(
                self.rename.date_format.clone(),
            ));
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<FixedOffset, SettingsError> {
        FixedOffset::east_opt(self.timezone_offset_hours * 3600)
            .ok_or(SettingsError::InvalidTimezone(self.timezone_offset_hours))
    }

    /// Current time in the configured timezone.
    pub fn local_now(&self) -> Result<DateTime<FixedOffset>, SettingsError> {
        Ok(Utc::now().with_timezone(&self.timezone()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.timezone_offset_hours, 8);
        assert_eq!(settings.http.max_retries, 5);
        assert_eq!(settings.http.retry_statuses, vec![429, 500, 502, 503, 504]);
        assert_eq!(settings.output.dir, "public");
        assert_eq!(settings.filter.policy, FilterPolicy::Drop);
        assert_eq!(settings.filter.markers.len(), 4);
        assert_eq!(settings.sources.len(), 3);
        assert!(!settings.rename.enabled);
    }

    #[test]
    fn test_invalid_timezone() {
        let result = Settings::from_toml_str("timezone_offset_hours = 30");
        assert!(matches!(result, Err(SettingsError::InvalidTimezone(30))));
    }

    #[test]
    fn test_invalid_date_format() {
        let result = Settings::from_toml_str("[rename]\ndate_format = \"%Q\"");
        assert!(matches!(result, Err(SettingsError::InvalidDateFormat(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Settings::load(Some(Path::new("/nonexistent/nodesub.toml")));
        assert!(matches!(result, Err(SettingsError::Io { .. })));
    }
}
