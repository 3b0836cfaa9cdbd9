use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use magstripe::{
    CardSwipe, ConsistencyMode, ReconcileConfig, ReconciliationEngine, ReconciliationReport,
    TrackParseError,
};

/// Reconcile magnetic stripe track reads of bank cards.
#[derive(Parser, Debug)]
#[command(name = "magstripe", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check the tracks of a single swipe.
    Check(CheckArgs),
    /// Check every swipe in a CSV file (swipe_id,track1,track2,track3).
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// JSON config file (mode, min_tracks)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Require every shared field on both sides of each track pair
    #[arg(long)]
    strict: bool,

    /// Minimum number of tracks before an identity is merged
    #[arg(long)]
    min_tracks: Option<usize>,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[arg(long, default_value = "")]
    track1: String,

    #[arg(long, default_value = "")]
    track2: String,

    #[arg(long, default_value = "")]
    track3: String,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// CSV file with header swipe_id,track1,track2,track3
    file: PathBuf,

    #[command(flatten)]
    engine: EngineArgs,
}

/// One row of a batch file
#[derive(Debug, Deserialize)]
struct SwipeRow {
    swipe_id: String,
    #[serde(default)]
    track1: String,
    #[serde(default)]
    track2: String,
    #[serde(default)]
    track3: String,
}

/// Outcome counts for a batch run
#[derive(Debug, Default, PartialEq, Serialize)]
struct BatchTotals {
    swipes: usize,
    consistent: usize,
    rejected: usize,
    malformed: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Batch(args) => run_batch(args),
    }
}

fn build_engine(args: &EngineArgs) -> Result<ReconciliationEngine> {
    let mut config = match &args.config {
        Some(path) => ReconcileConfig::from_json_file(path)?,
        None => ReconcileConfig::default(),
    };

    if args.strict {
        config.mode = ConsistencyMode::Strict;
    }
    if let Some(min_tracks) = args.min_tracks {
        config.min_tracks = min_tracks;
    }
    config.validate()?;

    tracing::debug!(mode = ?config.mode, min_tracks = config.min_tracks, "engine configured");
    Ok(ReconciliationEngine::from_config(&config))
}

fn print_report(report: &ReconciliationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report).context("Failed to serialize report")?);
    } else {
        println!("{}", report.summary());
        for discrepancy in &report.discrepancies {
            println!("  - {}", discrepancy.description);
        }
    }
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<()> {
    let engine = build_engine(&args.engine)?;
    let swipe = CardSwipe::parse(&args.track1, &args.track2, &args.track3)
        .context("Failed to parse track data")?;

    let report = engine.reconcile(&swipe);
    print_report(&report, args.engine.json)?;

    if !report.is_consistent() {
        std::process::exit(2);
    }
    Ok(())
}

fn load_swipes(path: &Path) -> Result<Vec<SwipeRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mut rows = Vec::new();
    for (line_num, result) in reader.deserialize().enumerate() {
        let row: SwipeRow = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn run_batch(args: BatchArgs) -> Result<()> {
    let engine = build_engine(&args.engine)?;
    let rows = load_swipes(&args.file)?;

    let json = args.engine.json;
    let mut totals = BatchTotals {
        swipes: rows.len(),
        ..BatchTotals::default()
    };

    for row in &rows {
        let swipe = match CardSwipe::parse(&row.track1, &row.track2, &row.track3) {
            Ok(swipe) => swipe,
            Err(err) => {
                tracing::warn!(swipe_id = %row.swipe_id, error = %err, "malformed swipe");
                println!("{}", malformed_line(&row.swipe_id, &err, json));
                totals.malformed += 1;
                continue;
            }
        };

        let report = engine.reconcile_with_id(row.swipe_id.clone(), &swipe);
        print_report(&report, json)?;

        if report.is_consistent() {
            totals.consistent += 1;
        } else {
            totals.rejected += 1;
        }
    }

    println!("{}", totals_line(&totals, json));
    Ok(())
}

fn malformed_line(swipe_id: &str, err: &TrackParseError, json: bool) -> String {
    if json {
        serde_json::json!({ "id": swipe_id, "error": err.to_string() }).to_string()
    } else {
        format!("Swipe {}: malformed ({})", swipe_id, err)
    }
}

fn totals_line(totals: &BatchTotals, json: bool) -> String {
    if json {
        serde_json::json!({ "totals": totals }).to_string()
    } else {
        format!(
            "{} swipes: {} consistent, {} rejected, {} malformed",
            totals.swipes, totals.consistent, totals.rejected, totals.malformed
        )
    }
}
