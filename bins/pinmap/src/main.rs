//! pinmap - live report map engine from the terminal
//!
//! Parse stored locations, lay out markers for a report export, and replay
//! change bursts through the live sync coordinator.

use clap::{Args, Parser, Subcommand, ValueEnum};
use pinmap_core::config::Config;
use pinmap_core::error::exit_codes;
use pinmap_telemetry::{TelemetryConfig, TelemetryGuard};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod output;

use output::{classify_failure, report_failure, Status};

/// Live report map engine
#[derive(Parser)]
#[command(name = "pinmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (searches .pinmap.toml, pinmap.toml, .config/pinmap.toml)
    #[arg(short, long, global = true, env = "PINMAP_CONFIG")]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse stored location strings
    Parse {
        /// Locations in "(lat,lng)" form
        #[arg(required = true, allow_hyphen_values = true)]
        locations: Vec<String>,
    },

    /// Distance between two locations
    Distance {
        #[arg(allow_hyphen_values = true)]
        from: String,

        #[arg(allow_hyphen_values = true)]
        to: String,

        /// Unit for the label (km, miles); defaults to the configured unit
        #[arg(short, long)]
        units: Option<String>,
    },

    /// Lay out markers for a JSON report export
    Markers {
        /// JSON array of reports
        file: PathBuf,

        #[command(flatten)]
        area: AreaArgs,
    },

    /// Reports sorted by distance from a point
    Nearby {
        /// JSON array of reports
        file: PathBuf,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lng: f64,

        /// Only reports within this many kilometers
        #[arg(short, long)]
        radius: Option<f64>,

        /// Maximum number of reports to list
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Mount live sync over a report export and replay a burst of changes
    Watch {
        /// JSON array of reports to seed the store with
        file: PathBuf,

        /// Number of change notifications to send
        #[arg(long, default_value = "5")]
        changes: usize,

        /// Delay between notifications in milliseconds
        #[arg(long, default_value = "100")]
        interval_ms: u64,
    },
}

/// Viewer position and filter overrides
#[derive(Args, Debug, Default)]
pub struct AreaArgs {
    /// Viewer latitude
    #[arg(long, allow_negative_numbers = true, requires = "lng")]
    pub lat: Option<f64>,

    /// Viewer longitude
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    pub lng: Option<f64>,

    /// Radius in kilometers
    #[arg(short, long)]
    pub radius: Option<f64>,

    /// Category filter (all, event, hazard, lost, found)
    #[arg(long)]
    pub category: Option<String>,

    /// Unit for distance labels (km, miles)
    #[arg(short, long)]
    pub units: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            report_failure(&err, cli.format);
            return ExitCode::from(exit_codes::CONFIG_ERROR as u8);
        }
    };

    let _telemetry = match init_telemetry(&config, cli.verbose) {
        Ok(guard) => Some(guard),
        Err(err) => {
            Status::warning(&format!("Logging disabled: {err}"));
            None
        }
    };

    let result = match cli.command {
        Commands::Parse { locations } => commands::parse::run(&locations, cli.format),
        Commands::Distance { from, to, units } => {
            commands::distance::run(&from, &to, units.as_deref(), &config, cli.format)
        }
        Commands::Markers { file, area } => {
            commands::markers::run(&file, &area, &config, cli.format).await
        }
        Commands::Nearby {
            file,
            lat,
            lng,
            radius,
            limit,
        } => commands::nearby::run(&file, lat, lng, radius, limit, cli.format),
        Commands::Watch {
            file,
            changes,
            interval_ms,
        } => commands::watch::run(&file, changes, interval_ms, &config, cli.format).await,
    };

    match result {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            let err = classify_failure(err);
            tracing::debug!(code = %err.code, "Command failed");
            report_failure(&err, cli.format);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn load_config(path: Option<&str>) -> pinmap_core::Result<Config> {
    let config = Config::load(path)?;
    config.validate()?;
    Ok(config)
}

fn init_telemetry(config: &Config, verbose: bool) -> anyhow::Result<TelemetryGuard> {
    let settings = &config.schema.telemetry;
    pinmap_telemetry::init_with_config(TelemetryConfig {
        log_level: if verbose {
            "debug".to_string()
        } else {
            settings.log_level.clone()
        },
        json: settings.json,
        log_dir: settings.log_dir.clone(),
        ..TelemetryConfig::default()
    })
}
