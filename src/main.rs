//! sensor-merge CLI
//!
//! Merge Sensor Logger ZIP exports into combined accelerometer/gyroscope
//! tables.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use sensor_merge::{
    config::Config,
    core::{AlignmentSummary, Tolerance},
    export::write_combined_csv,
    history::{create_shared_log_with_persistence, read_persisted},
    ingest::{load_sensor_csv, Activity},
    pipeline::{align_tables, discover_archives, display_name, run_batch, BatchOptions},
    VERSION,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "sensor-merge")]
#[command(version = VERSION)]
#[command(about = "Merge Sensor Logger ZIPs into combined CSVs for activity models", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge every archive in a folder
    Merge {
        /// Folder with .zip files
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Where to write combined CSVs
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Glob pattern for zip files
        #[arg(long)]
        pattern: Option<String>,

        /// Timestamp matching tolerance in milliseconds
        #[arg(long)]
        tolerance_ms: Option<f64>,

        /// Archives processed concurrently
        #[arg(long, short)]
        jobs: Option<usize>,
    },

    /// Align one accelerometer table with one gyroscope table
    Align {
        /// Accelerometer CSV (primary)
        #[arg(long)]
        accel: PathBuf,

        /// Gyroscope CSV (secondary)
        #[arg(long)]
        gyro: PathBuf,

        /// Combined CSV to write
        #[arg(long, short)]
        output: PathBuf,

        /// Timestamp matching tolerance in milliseconds
        #[arg(long)]
        tolerance_ms: Option<f64>,

        /// Activity label: walking, standing, jumping, still or unknown
        /// (inferred from the output name if omitted)
        #[arg(long)]
        activity: Option<String>,
    },

    /// Show cumulative processing statistics
    Status,

    /// Show configuration
    Config {
        /// Persist the effective configuration
        #[arg(long)]
        save: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Merge {
            input_dir,
            output_dir,
            pattern,
            tolerance_ms,
            jobs,
        } => cmd_merge(input_dir, output_dir, pattern, tolerance_ms, jobs),
        Commands::Align {
            accel,
            gyro,
            output,
            tolerance_ms,
            activity,
        } => cmd_align(&accel, &gyro, &output, tolerance_ms, activity.as_deref()),
        Commands::Status => cmd_status().map(|_| 0),
        Commands::Config { save } => cmd_config(save).map(|_| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        warn!("could not load configuration, using defaults: {e}");
        Config::default()
    })
}

fn tolerance_or(millis: Option<f64>, fallback: Tolerance) -> Result<Tolerance> {
    match millis {
        Some(ms) => Tolerance::from_millis(ms).context("invalid --tolerance-ms"),
        None => Ok(fallback),
    }
}

fn cmd_merge(
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    pattern: Option<String>,
    tolerance_ms: Option<f64>,
    jobs: Option<usize>,
) -> Result<i32> {
    let mut config = load_config();
    if let Some(dir) = input_dir {
        config.input_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if let Some(pattern) = pattern {
        config.pattern = pattern;
    }
    if let Some(jobs) = jobs {
        config.jobs = jobs;
    }
    config.tolerance = tolerance_or(tolerance_ms, config.tolerance)?;
    config.validate()?;

    let archives = discover_archives(&config.input_dir, &config.pattern)?;
    if archives.is_empty() {
        println!(
            "No ZIP files found in {} with pattern {}",
            config.input_dir.display(),
            config.pattern
        );
        return Ok(1);
    }

    config
        .ensure_directories()
        .context("could not create output directories")?;

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    let log = create_shared_log_with_persistence(config.history_path());
    info!(
        run_id = %log.run_id(),
        archives = archives.len(),
        tolerance_ns = config.tolerance.as_nanos(),
        jobs = config.jobs,
        "starting batch"
    );

    let options = BatchOptions {
        output_dir: config.output_dir.clone(),
        tolerance: config.tolerance,
        jobs: config.jobs,
    };
    let report = run_batch(&archives, &options, &log, &running, |archive, result| {
        match result {
            Ok(outcome) => println!(
                "[OK] {} -> {}",
                display_name(archive),
                outcome.output.display()
            ),
            Err(e) => println!("[FAIL] {} :: {}", display_name(archive), e),
        }
    });

    if !running.load(Ordering::SeqCst) {
        println!();
        println!("Interrupted, remaining archives were not processed.");
    }

    println!();
    println!("{}", report.summary());

    if let Err(e) = log.save() {
        warn!("could not save processing stats: {e}");
    }

    Ok(if report.is_success() { 0 } else { 2 })
}

fn cmd_align(
    accel: &Path,
    gyro: &Path,
    output: &Path,
    tolerance_ms: Option<f64>,
    activity: Option<&str>,
) -> Result<i32> {
    let config = load_config();
    let tolerance = tolerance_or(tolerance_ms, config.tolerance)?;

    let acc = load_sensor_csv(accel).context("loading accelerometer table")?;
    let gyr = load_sensor_csv(gyro).context("loading gyroscope table")?;
    if acc.samples.is_empty() {
        warn!("{} has no usable rows, output will be empty", accel.display());
    }

    let activity = match activity {
        Some(label) => Activity::from_label(label).unwrap_or_else(|| {
            warn!(
                "activity {label:?} is not one of {}, writing unknown",
                Activity::KNOWN.map(|a| a.as_str()).join(", ")
            );
            Activity::Unknown
        }),
        None => Activity::infer_from_name(
            &output
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
    };

    let rows = align_tables(acc.samples, gyr.samples, tolerance);
    let summary = AlignmentSummary::from_rows(&rows);
    write_combined_csv(output, &rows, activity)?;

    println!("Wrote {} rows to {}", summary.rows, output.display());
    print_alignment(&summary, acc.dropped_rows + gyr.dropped_rows);
    Ok(0)
}

fn print_alignment(summary: &AlignmentSummary, dropped: usize) {
    println!(
        "  Matched: {} ({:.1}%)",
        summary.matched,
        summary.match_rate() * 100.0
    );
    println!("  Unmatched: {}", summary.unmatched());
    if let Some(mean) = summary.mean_offset_ns {
        println!("  Mean offset: {:.3} ms", mean / 1_000_000.0);
    }
    if let Some(max) = summary.max_offset_ns {
        println!("  Max offset: {:.3} ms", max as f64 / 1_000_000.0);
    }
    if dropped > 0 {
        println!("  Rows dropped (no timestamp): {dropped}");
    }
}

fn cmd_status() -> Result<()> {
    let config = load_config();

    println!("sensor-merge Status");
    println!("===================");
    println!();
    println!("Configuration:");
    println!("  Input dir: {}", config.input_dir.display());
    println!("  Output dir: {}", config.output_dir.display());
    println!("  Pattern: {}", config.pattern);
    println!("  Tolerance: {} ms", config.tolerance.as_millis_f64());
    println!();

    let path = config.history_path();
    if path.exists() {
        let stats = read_persisted(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        println!("Cumulative Statistics:");
        println!("  Archives merged: {}", stats.archives_succeeded);
        println!("  Archives failed: {}", stats.archives_failed);
        println!("  Rows written: {}", stats.rows_written);
        println!("  Rows with gyroscope match: {}", stats.rows_matched);
        println!("  Last updated: {}", stats.last_updated.format("%Y-%m-%d %H:%M:%S UTC"));
    } else {
        println!("No previous runs found.");
    }
    Ok(())
}

fn cmd_config(save: bool) -> Result<()> {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    if save {
        config.save()?;
        println!();
        println!("Saved.");
    }
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")
}
