//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.sdis-dashboard.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".sdis-dashboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Data-quality settings.
    #[serde(default)]
    pub quality: QualityConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Dataset location and format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the intervention file.
    #[serde(default = "default_data_path")]
    pub path: String,

    /// Field delimiter (single ASCII character).
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_data_path() -> String {
    "interventions2023.csv".to_string()
}

fn default_delimiter() -> char {
    ';'
}

/// Data-quality settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Department names or codes identifying the Paris brigade.
    #[serde(default = "default_bspp_markers")]
    pub bspp_markers: Vec<String>,

    /// Department names or codes identifying the Marseille battalion.
    #[serde(default = "default_bmpm_markers")]
    pub bmpm_markers: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            bspp_markers: default_bspp_markers(),
            bmpm_markers: default_bmpm_markers(),
        }
    }
}

fn default_bspp_markers() -> Vec<String> {
    crate::quality::SpecialUnitMarkers::default().bspp
}

fn default_bmpm_markers() -> Vec<String> {
    crate::quality::SpecialUnitMarkers::default().bmpm
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Departments listed in the overview ranking.
    #[serde(default = "default_top_departments")]
    pub top_departments: usize,

    /// Departments listed in the fire ranking.
    #[serde(default = "default_top_fire_departments")]
    pub top_fire_departments: usize,

    /// Departments listed on the geography page.
    #[serde(default = "default_geography_top")]
    pub geography_top: usize,

    /// Carence rate above which the medical page raises an alert.
    #[serde(default = "default_carence_alert")]
    pub carence_alert_threshold: f64,

    /// Medical share above which the overview highlights the trend.
    #[serde(default = "default_medical_highlight")]
    pub medical_highlight_threshold: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_departments: default_top_departments(),
            top_fire_departments: default_top_fire_departments(),
            geography_top: default_geography_top(),
            carence_alert_threshold: default_carence_alert(),
            medical_highlight_threshold: default_medical_highlight(),
        }
    }
}

fn default_top_departments() -> usize {
    15
}

fn default_top_fire_departments() -> usize {
    10
}

fn default_geography_top() -> usize {
    20
}

fn default_carence_alert() -> f64 {
    0.10
}

fn default_medical_highlight() -> f64 {
    0.70
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, and only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.display().to_string();
        }
        if let Some(delimiter) = args.delimiter {
            self.data.delimiter = delimiter;
        }
        if let Some(top) = args.top {
            self.report.top_departments = top;
            self.report.geography_top = top;
        }
    }

    /// Check values that serde cannot constrain.
    pub fn validate(&self) -> Result<()> {
        if !self.data.delimiter.is_ascii() {
            bail!(
                "Delimiter must be a single ASCII character, got '{}'",
                self.data.delimiter
            );
        }

        for (name, value) in [
            ("carence_alert_threshold", self.report.carence_alert_threshold),
            (
                "medical_highlight_threshold",
                self.report.medical_highlight_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be between 0.0 and 1.0, got {}", name, value);
            }
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.path, "interventions2023.csv");
        assert_eq!(config.data.delimiter, ';');
        assert_eq!(config.report.top_departments, 15);
        assert_eq!(config.report.carence_alert_threshold, 0.10);
        assert!(config.quality.bspp_markers.contains(&"BSPP".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[data]
path = "data/sdis.csv"
delimiter = ","

[quality]
bspp_markers = ["BSPP", "75"]

[report]
top_departments = 5
carence_alert_threshold = 0.15
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.data.path, "data/sdis.csv");
        assert_eq!(config.data.delimiter, ',');
        assert_eq!(config.quality.bspp_markers, vec!["BSPP", "75"]);
        assert!(config.quality.bmpm_markers.contains(&"BMPM".to_string()));
        assert_eq!(config.report.top_departments, 5);
        assert_eq!(config.report.top_fire_departments, 10);
        assert_eq!(config.report.carence_alert_threshold, 0.15);
    }

    #[test]
    fn test_merge_with_args_overrides_given_flags_only() {
        use clap::Parser;

        let args = crate::cli::Args::try_parse_from([
            "sdis-dashboard",
            "--data",
            "other.csv",
            "--top",
            "7",
            "--verbose",
        ])
        .unwrap();

        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.data.path, "other.csv");
        assert_eq!(config.data.delimiter, ';');
        assert_eq!(config.report.top_departments, 7);
        assert_eq!(config.report.geography_top, 7);
        assert_eq!(config.report.top_fire_departments, 10);
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = Config::default();
        config.report.carence_alert_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_ascii_delimiter() {
        let mut config = Config::default();
        config.data.delimiter = '§';
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[report]\ngeography_top = 30").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.report.geography_top, 30);
        assert_eq!(config.data.delimiter, ';');
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[quality]"));
        assert!(toml_str.contains("[report]"));
        assert!(!toml_str.contains("[general]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.report.top_departments, 15);
    }
}
