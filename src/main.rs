//! CLI entry point for the Deutschlandtakt accessibility rater.
//!
//! Provides subcommands for evaluating a timetable workbook and for dumping
//! the raw connection metrics.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dtakt_rater::analyzers::analyzer::{evaluate_workbook, station_metrics};
use dtakt_rater::analyzers::types::Evaluation;
use dtakt_rater::analyzers::weights::PolarityRules;
use dtakt_rater::config::{EvalOptions, FailurePolicy};
use dtakt_rater::output::{print_json, print_pretty, write_metric_tables, write_results};
use dtakt_rater::parser::read_workbook;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "dtakt_rater")]
#[command(about = "Rates rail accessibility of departure stations against car travel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EvalArgs {
    /// Consider transfer time and transfer count (eight input columns)
    #[arg(short, long, default_value_t = false)]
    transfers: bool,

    /// Treat a smaller car/rail time ratio as better
    #[arg(long, default_value_t = false)]
    invert_time_ratio: bool,

    /// JSON file with custom weights keyed by metric id
    #[arg(short, long, value_name = "FILE")]
    weights: Option<PathBuf>,

    /// Skip stations that fail instead of aborting the run
    #[arg(short, long, default_value_t = false)]
    keep_going: bool,
}

impl EvalArgs {
    fn options(&self) -> Result<EvalOptions> {
        let mut options = EvalOptions::new(self.transfers)
            .with_polarity(PolarityRules {
                invert_time_ratio: self.invert_time_ratio,
            })
            .with_policy(if self.keep_going {
                FailurePolicy::SkipStation
            } else {
                FailurePolicy::FailFast
            });
        if let Some(path) = &self.weights {
            options = options
                .with_weights_file(path)
                .with_context(|| format!("loading weights from '{}'", path.display()))?;
        }
        Ok(options)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the accessibility index of every station in a workbook
    Evaluate {
        /// Timetable workbook, one worksheet per departure station
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Result file (.xlsx or .csv)
        #[arg(short, long, default_value = "erreichbarkeitsindex.xlsx")]
        output: PathBuf,

        /// Also log the full evaluation as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        eval: EvalArgs,
    },
    /// Compute and export the raw connection metrics
    Metrics {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Only this departure station
        #[arg(short, long)]
        station: Option<String>,

        /// CSV file for the metric tables; logged when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Consider transfer time and transfer count (eight input columns)
        #[arg(short, long, default_value_t = false)]
        transfers: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/dtakt_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("dtakt_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            input,
            output,
            json,
            eval,
        } => {
            let options = eval.options()?;
            let evaluation = evaluate(&input, &options)?;

            write_results(&output, &evaluation.stations)
                .with_context(|| format!("writing results to '{}'", output.display()))?;
            if json {
                print_json(&evaluation)?;
            }

            for station in &evaluation.stations {
                info!(
                    station = %station.station,
                    index = station.index,
                    line_stddev = station.line_stddev,
                    best = %station.best_line.destination,
                    worst = %station.worst_line.destination,
                    "Erreichbarkeitsindex"
                );
            }
        }
        Commands::Metrics {
            input,
            station,
            output,
            transfers,
        } => {
            let sheets = read_workbook(&input, transfers)
                .with_context(|| format!("reading '{}'", input.display()))?;

            let mut tables = Vec::new();
            for sheet in sheets
                .iter()
                .filter(|s| station.as_deref().is_none_or(|name| name == s.station))
            {
                let table = station_metrics(sheet, transfers)
                    .with_context(|| format!("computing metrics for '{}'", sheet.station))?;
                tables.push((sheet.station.clone(), table));
            }

            if tables.is_empty() {
                warn!(station = ?station, "No matching station in workbook");
            }

            match output {
                Some(path) => write_metric_tables(&path, &tables)
                    .with_context(|| format!("writing metrics to '{}'", path.display()))?,
                None => {
                    for (name, table) in &tables {
                        info!(station = %name, rows = table.rows.len(), "Metric table");
                        print_pretty(table);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Reads a workbook and evaluates all of its stations.
fn evaluate(input: &Path, options: &EvalOptions) -> Result<Evaluation> {
    let sheets = read_workbook(input, options.include_transfers)
        .with_context(|| format!("reading '{}'", input.display()))?;
    let evaluation = evaluate_workbook(&sheets, options)
        .with_context(|| format!("evaluating '{}'", input.display()))?;

    for failure in &evaluation.failures {
        warn!(station = %failure.station, error = %failure.error, "Station left out");
    }

    Ok(evaluation)
}
