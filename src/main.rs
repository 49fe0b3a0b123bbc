use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use chrono::{Local, Utc};
use clap::Parser;
use tracing::{error, info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cleaning_report_normalizer::config::Config;
use cleaning_report_normalizer::export::{write_table, OutputFormat};
use cleaning_report_normalizer::profiles::ServerRegistry;
use cleaning_report_normalizer::utils::{
    adjusted_timestamp, format_timestamp, parse_strict_timestamp, to_display_time,
};
use cleaning_report_normalizer::{ReportPipeline, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "cleaning-report-normalizer")]
#[command(about = "Normalize robot cleaning task exports into the reporting schema", long_about = None)]
struct Cli {
    /// Task export to process (.csv, .xls or .xlsx)
    #[arg(long)]
    file: PathBuf,

    /// Server the export was downloaded from (e.g., "GS SGV1", "GS CA")
    #[arg(long, env = "SERVER_NAME")]
    server: String,

    /// Keep only reports received strictly after this time (YYYY-MM-DD HH:MM:SS)
    #[arg(long)]
    cutoff: String,

    /// Timestamp for created_at/updated_at (default: now plus the server's clock offset)
    #[arg(long)]
    adjusted_at: Option<String>,

    /// Serial number to exclude; repeat for several robots
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// Server registry JSON file (overrides SERVER_REGISTRY_PATH)
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Write records here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,
}

#[instrument]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout carries only the records
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,cleaning_report_normalizer=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let display_now = to_display_time(Utc::now().naive_utc(), config.display_timezone);
    info!(
        "Current time ({}): {}",
        config.display_timezone,
        display_now.format("%Y-%m-%d %H:%M:%S")
    );

    let registry = match cli.registry.as_ref().or(config.registry_path.as_ref()) {
        Some(path) => ServerRegistry::from_path(path)?,
        None => ServerRegistry::builtin(),
    };
    let server = registry.lookup(&cli.server);

    let adjusted_at = match cli.adjusted_at.as_deref() {
        Some(value) => parse_strict_timestamp(value)
            .ok_or_else(|| format!("Invalid --adjusted-at '{value}', expected YYYY-MM-DD HH:MM:SS"))?,
        None => adjusted_timestamp(Local::now().naive_local(), server.clock_offset_hours),
    };
    info!("Adjusted timestamp: {}", format_timestamp(&adjusted_at));

    let file_name = cli
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("Invalid file path: {:?}", cli.file))?
        .to_string();

    let bytes = match fs::read(&cli.file) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read {:?}: {}", cli.file, e);
            return Err(e.into());
        }
    };

    let options = RunOptions::new(cli.cutoff, adjusted_at, cli.server).excluding(cli.exclude);
    let pipeline = ReportPipeline::new(registry);
    let records = pipeline.process_upload(&bytes, &file_name, &options)?;

    match &cli.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_table(&records, cli.format, &mut writer)?;
            writer.flush()?;
            info!("Wrote {} records to {}", records.len(), path.display());
        }
        None => {
            write_table(&records, cli.format, io::stdout().lock())?;
        }
    }

    Ok(())
}
