//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::filter::FilterSelection;
use crate::models::TerritoryType;
use crate::report::{GeographyMetric, Page};
use clap::Parser;
use std::path::PathBuf;

/// SDIS Dashboard - fire-and-rescue intervention metrics
///
/// Load the yearly departmental intervention file published by the
/// Ministry of the Interior, filter it and render dashboard pages as
/// Markdown or JSON.
///
/// Examples:
///   sdis-dashboard --data interventions2023.csv
///   sdis-dashboard --data interventions2023.csv --region Bretagne,Normandie --page medical
///   sdis-dashboard --territory rural --page geography --metric fires --top 10
///   sdis-dashboard --page quality --fail-on-anomalies
///   sdis-dashboard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Intervention file to load (semicolon-separated)
    ///
    /// Can also be set via SDIS_DATA env var or .sdis-dashboard.toml config.
    #[arg(short, long, value_name = "FILE", env = "SDIS_DATA")]
    pub data: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .sdis-dashboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Regions to include (comma-separated)
    ///
    /// Example: --region Bretagne,Normandie
    #[arg(short, long, value_name = "REGIONS", value_delimiter = ',')]
    pub region: Vec<String>,

    /// Territory types to include (comma-separated)
    #[arg(short, long, value_name = "TYPES", value_delimiter = ',')]
    pub territory: Vec<TerritoryType>,

    /// Demographic categories to include (comma-separated)
    #[arg(long, value_name = "CATEGORIES", value_delimiter = ',')]
    pub category: Vec<String>,

    /// Dashboard page to render
    #[arg(short, long, default_value = "all", value_name = "PAGE")]
    pub page: Page,

    /// Metric shown on the geography page
    #[arg(short, long, default_value = "carence-rate", value_name = "METRIC")]
    pub metric: GeographyMetric,

    /// Number of departments listed in rankings
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Field delimiter of the dataset file
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path for the report
    ///
    /// The report is written to stdout when not specified.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// List the values available for each filter and exit
    #[arg(long)]
    pub list_options: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with code 2 when the data-quality pass finds anomalies
    #[arg(long)]
    pub fail_on_anomalies: bool,

    /// Generate a default .sdis-dashboard.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top == Some(0) {
            return Err("Top must be at least 1".to_string());
        }

        if let Some(delimiter) = self.delimiter {
            if !delimiter.is_ascii() {
                return Err(format!(
                    "Delimiter must be a single ASCII character, got '{}'",
                    delimiter
                ));
            }
        }

        if self.region.iter().any(|r| r.trim().is_empty()) {
            return Err("Region names cannot be empty".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The filter selection described by the flags.
    pub fn selection(&self) -> FilterSelection {
        FilterSelection::new()
            .with_regions(self.region.iter().map(|r| r.trim().to_string()))
            .with_territory_types(self.territory.iter().copied())
            .with_demographic_categories(self.category.iter().map(|c| c.trim().to_string()))
    }
}
