//! Run configuration.
//!
//! Loaded from a TOML file and validated before any grid, dataset or ledger
//! is read:
//!
//! ```toml
//! spreadsheet_id = "1AbCdEf"
//! output_file = "data/dataset.json"
//! grid_dir = "grids"
//! state_dir = "state"
//! timezone_offset_hours = 9
//!
//! [[sheets]]
//! name = "山田"
//! range = "A1:AZ40"
//!
//! [alerts]
//! webhook_url = "https://chat.example.com/hooks/abc"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};
use kpi_grid::SheetRange;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// File name of the below-average ledger inside `state_dir`.
pub const BELOW_AVERAGE_LEDGER: &str = "below_average_ledger.json";

/// File name of the follow-up ledger inside `state_dir`.
pub const FOLLOWUP_LEDGER: &str = "followup_ledger.json";

/// A sheet to extract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetConfig {
    /// Sheet name.
    pub name: String,
    /// Range to fetch, in A1 notation.
    #[serde(default = "default_range")]
    pub range: String,
}

fn default_range() -> String {
    "A1:AZ200".to_string()
}

/// Alert delivery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertsConfig {
    /// Incoming-webhook URL. Alerts go to the log when unset.
    pub webhook_url: Option<String>,
    /// Render alerts without sending them or writing ledgers.
    #[serde(default)]
    pub dry_run: bool,
    /// Webhook request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Identifier of the source spreadsheet.
    pub spreadsheet_id: String,
    /// Dataset document path.
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
    /// Directory holding one fetched `<sheet>.json` grid per sheet.
    #[serde(default = "default_grid_dir")]
    pub grid_dir: PathBuf,
    /// Directory holding the ledgers.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Offset from UTC used to decide what "today" is.
    #[serde(default = "default_timezone_offset_hours")]
    pub timezone_offset_hours: i32,
    /// Days a block may stay incomplete before it is reported.
    #[serde(default = "default_missing_grace_days")]
    pub missing_grace_days: i64,
    /// Days after a below-average date before the follow-up check applies.
    #[serde(default = "default_followup_delay_days")]
    pub followup_delay_days: i64,
    /// Sheets to extract.
    #[serde(default)]
    pub sheets: Vec<SheetConfig>,
    /// Alert delivery.
    #[serde(default)]
    pub alerts: AlertsConfig,
}

fn default_output_file() -> PathBuf {
    PathBuf::from("data/dataset.json")
}

fn default_grid_dir() -> PathBuf {
    PathBuf::from("grids")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}

const fn default_timezone_offset_hours() -> i32 {
    9
}

const fn default_missing_grace_days() -> i64 {
    3
}

const fn default_followup_delay_days() -> i64 {
    1
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CliError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        let config: Self =
            toml::from_str(content).map_err(|e| CliError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(CliError::Config("spreadsheet_id cannot be empty".to_string()));
        }

        if self.sheets.is_empty() {
            return Err(CliError::Config("at least one [[sheets]] entry is required".to_string()));
        }

        let mut seen = HashSet::new();
        for sheet in &self.sheets {
            if sheet.name.trim().is_empty() {
                return Err(CliError::Config("sheet name cannot be empty".to_string()));
            }
            if sheet.name.contains('|') {
                return Err(CliError::Config(format!(
                    "sheet name '{}' cannot contain '|'",
                    sheet.name
                )));
            }
            if !seen.insert(sheet.name.as_str()) {
                return Err(CliError::Config(format!("duplicate sheet '{}'", sheet.name)));
            }
        }

        if !(-12..=14).contains(&self.timezone_offset_hours) {
            return Err(CliError::Config(
                "timezone_offset_hours must be between -12 and 14".to_string(),
            ));
        }

        if self.missing_grace_days < 0 || self.followup_delay_days < 0 {
            return Err(CliError::Config(
                "missing_grace_days and followup_delay_days cannot be negative".to_string(),
            ));
        }

        if let Some(url) = &self.alerts.webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CliError::Config(
                    "alerts.webhook_url must start with http:// or https://".to_string(),
                ));
            }
        }

        if self.alerts.timeout_secs == 0 {
            return Err(CliError::Config(
                "alerts.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// The configured timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the offset is out of range.
    pub fn timezone(&self) -> Result<FixedOffset, CliError> {
        FixedOffset::east_opt(self.timezone_offset_hours * 3600).ok_or_else(|| {
            CliError::Config(format!(
                "invalid timezone offset: {}",
                self.timezone_offset_hours
            ))
        })
    }

    /// The current time in the configured timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the offset is out of range.
    pub fn now(&self) -> Result<DateTime<FixedOffset>, CliError> {
        Ok(Utc::now().with_timezone(&self.timezone()?))
    }

    /// Ranges to fetch, in configuration order.
    #[must_use]
    pub fn ranges(&self) -> Vec<SheetRange> {
        self.sheets
            .iter()
            .map(|s| SheetRange::new(&s.name, &s.range))
            .collect()
    }

    /// Path of the below-average ledger.
    #[must_use]
    pub fn below_average_ledger(&self) -> PathBuf {
        self.state_dir.join(BELOW_AVERAGE_LEDGER)
    }

    /// Path of the follow-up ledger.
    #[must_use]
    pub fn followup_ledger(&self) -> PathBuf {
        self.state_dir.join(FOLLOWUP_LEDGER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use test_case::test_case;

    const MINIMAL: &str = r#"
        spreadsheet_id = "sheet-1"

        [[sheets]]
        name = "A"
    "#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("failed to write temp file");
        file
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_toml(MINIMAL).expect("should parse minimal config");

        assert_eq!(config.spreadsheet_id, "sheet-1");
        assert_eq!(config.output_file, PathBuf::from("data/dataset.json"));
        assert_eq!(config.timezone_offset_hours, 9);
        assert_eq!(config.missing_grace_days, 3);
        assert_eq!(config.followup_delay_days, 1);
        assert_eq!(config.sheets[0].range, "A1:AZ200");
        assert!(config.alerts.webhook_url.is_none());
        assert!(!config.alerts.dry_run);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            spreadsheet_id = "sheet-1"
            output_file = "out/data.json"
            grid_dir = "fetched"
            state_dir = "ledgers"
            timezone_offset_hours = -5
            missing_grace_days = 7
            followup_delay_days = 2

            [[sheets]]
            name = "A"
            range = "A1:Z50"

            [[sheets]]
            name = "B"
            range = "A1:Z50"

            [alerts]
            webhook_url = "https://chat.example.com/hook"
            dry_run = true
        "#;

        let config = Config::from_toml(toml).expect("should parse full config");
        assert_eq!(config.ranges().len(), 2);
        assert_eq!(config.ranges()[1].to_string(), "'B'!A1:Z50");
        assert_eq!(config.below_average_ledger(), PathBuf::from("ledgers/below_average_ledger.json"));
        assert_eq!(config.followup_ledger(), PathBuf::from("ledgers/followup_ledger.json"));
        assert_eq!(config.timezone().unwrap().local_minus_utc(), -5 * 3600);
        assert!(config.alerts.dry_run);
    }

    #[test_case(r#"spreadsheet_id = ""
        [[sheets]]
        name = "A""# ; "empty spreadsheet id")]
    #[test_case(r#"spreadsheet_id = "x""# ; "no sheets")]
    #[test_case(r#"spreadsheet_id = "x"
        [[sheets]]
        name = "A"
        [[sheets]]
        name = "A""# ; "duplicate sheet")]
    #[test_case(r#"spreadsheet_id = "x"
        [[sheets]]
        name = " ""# ; "blank sheet name")]
    #[test_case(r#"spreadsheet_id = "x"
        timezone_offset_hours = 15
        [[sheets]]
        name = "A""# ; "timezone out of range")]
    #[test_case(r#"spreadsheet_id = "x"
        [[sheets]]
        name = "A"
        [alerts]
        webhook_url = "ftp://example.com""# ; "bad webhook scheme")]
    fn test_invalid_config(toml: &str) {
        assert!(matches!(Config::from_toml(toml), Err(CliError::Config(_))));
    }

    #[test]
    fn test_missing_spreadsheet_id_is_config_error() {
        let result = Config::from_toml("[[sheets]]\nname = \"A\"\n");
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("invalid TOML")));
    }

    #[test]
    fn test_from_file() {
        let file = create_temp_config(MINIMAL);
        let config = Config::from_file(file.path()).expect("should load from file");
        assert_eq!(config.sheets.len(), 1);
    }

    #[test]
    fn test_from_missing_file() {
        let result = Config::from_file("/nonexistent/kpiwatch.toml");
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("failed to read")));
    }
}
