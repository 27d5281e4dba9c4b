//! SDIS Dashboard - fire-and-rescue intervention metrics
//!
//! A CLI tool that loads the departmental intervention file, applies
//! the requested filters and renders dashboard pages as Markdown or JSON.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable dataset, invalid config, etc.)
//!   2 - Data anomalies found with --fail-on-anomalies

use anyhow::{Context, Result};
use sdis_dashboard::cli::{Args, OutputFormat};
use sdis_dashboard::config::{Config, CONFIG_FILE_NAME};
use sdis_dashboard::dataset::Dataset;
use sdis_dashboard::loader::{DatasetLoader, LoaderConfig};
use sdis_dashboard::quality;
use sdis_dashboard::report::{self, DashboardReport, ReportOptions};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    init_logging(&args);

    info!("SDIS Dashboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .sdis-dashboard.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the dataset path, thresholds and rankings.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so that a report written to stdout stays clean.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the dashboard workflow. Returns exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    // Step 1: Load the dataset
    let data_path = Path::new(&config.data.path).to_path_buf();
    let loader = DatasetLoader::new(LoaderConfig::from(&config));
    let dataset = loader
        .load(&data_path)
        .with_context(|| format!("Cannot load dataset {}", data_path.display()))?;

    if args.list_options {
        print_filter_options(&dataset);
        return Ok(0);
    }

    // Step 2: Check data quality over the whole file
    let quality_report = quality::check(&dataset);
    if quality_report.has_anomalies() {
        warn!(
            "{} data anomalies found (see the quality page)",
            quality_report.anomaly_count()
        );
    }

    // Step 3: Build the report for the selection
    let selection = args.selection();
    info!("Filters: {}", selection.describe());

    let options = ReportOptions {
        page: args.page,
        geography_metric: args.metric,
        settings: config.report.clone(),
    };
    let dashboard = DashboardReport::build(&dataset, &selection, &quality_report, &options);

    if dashboard.selection.is_empty() {
        warn!("No records match the selected filters");
    }

    // Step 4: Render and write the report
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(&dashboard),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
        }
        None => print!("{}", output),
    }

    // Print summary
    if !args.quiet {
        let duration = start_time.elapsed().as_secs_f64();
        eprintln!("\n📊 Dashboard Summary:");
        eprintln!(
            "   Records: {} selected of {}",
            dashboard.metadata.records_selected, dashboard.metadata.records_loaded
        );
        eprintln!(
            "   Interventions: {}",
            dashboard.selection.totals.total_interventions
        );
        eprintln!("   Data anomalies: {}", quality_report.anomaly_count());
        eprintln!("   Duration: {:.2}s", duration);
        if let Some(ref path) = args.output {
            eprintln!("\n✅ Report saved to: {}", path.display());
        }
    }

    // Check --fail-on-anomalies
    if args.fail_on_anomalies && quality_report.has_anomalies() {
        eprintln!(
            "\n⛔ {} data anomalies found. Failing (exit code 2).",
            quality_report.anomaly_count()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Print the distinct values of every filter dimension.
fn print_filter_options(dataset: &Dataset) {
    let options = dataset.filter_options();

    println!("Regions ({}):", options.regions.len());
    for region in &options.regions {
        println!("  {}", region);
    }

    println!("\nTerritory types ({}):", options.territory_types.len());
    for territory in &options.territory_types {
        println!("  {}", territory);
    }

    println!(
        "\nDemographic categories ({}):",
        options.demographic_categories.len()
    );
    for category in &options.demographic_categories {
        println!("  {}", category);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
