//! Analytica CLI Module
//!
//! Command-line interface for dataset summaries and the prediction battery.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::analysis::DatasetSummary;
use crate::training::{Metrics, PredictionReport, TrainEngine, TrainingConfig};
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "analytica")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tabular dataset analysis and automatic model battery")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show descriptive statistics for a dataset
    Analyze {
        /// Input data file (CSV, TSV, JSON, JSONL or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Infer the problem type and train/evaluate the model battery
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Input data file (CSV, TSV, JSON, JSONL or Parquet)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Target column name
    #[arg(short, long)]
    pub target: String,

    /// Training config file (JSON); flags below override its fields
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fraction of rows held out for evaluation
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Seed for the split and the tree models
    #[arg(long)]
    pub seed: Option<u64>,

    /// Distinct-value count above which a numeric target is regression
    #[arg(long)]
    pub regression_threshold: Option<usize>,

    /// Train battery entries on parallel workers
    #[arg(long)]
    pub parallel: bool,

    /// Per-model wall-clock budget in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl PredictArgs {
    /// Resolve the training config: file (or defaults), then flag overrides
    pub fn training_config(&self) -> anyhow::Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::from_json_file(path)?,
            None => TrainingConfig::default(),
        };

        if let Some(test_size) = self.test_size {
            config = config.with_test_size(test_size);
        }
        if let Some(seed) = self.seed {
            config = config.with_random_state(seed);
        }
        if let Some(threshold) = self.regression_threshold {
            config = config.with_regression_threshold(threshold);
        }
        if self.parallel {
            config = config.with_parallel(true);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_model_timeout_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze { data, json } => cmd_analyze(&data, json),
        Commands::Predict(args) => cmd_predict(&args),
    }
}

pub fn cmd_analyze(data_path: &Path, json: bool) -> anyhow::Result<()> {
    let df = DataLoader::new().load_auto(data_path)?;
    let summary = DatasetSummary::from_frame(&df, data_path.display().to_string())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    section("Data Info");
    kv("File", &summary.file_info.file_path);
    kv("Rows", &summary.file_info.total_rows.to_string());
    kv("Columns", &summary.file_info.total_columns.to_string());
    kv("Missing", &summary.file_info.total_missing_values.to_string());
    println!();

    println!("  {:<20} {:<12} {:>8} {:>8}", muted("Column"), muted("Type"), muted("Missing"), muted("Unique"));
    println!("  {}", dim(&"─".repeat(52)));
    for col in &summary.column_details {
        println!(
            "  {:<20} {:<12} {:>8} {:>8}",
            col.column_name,
            muted(&col.data_type),
            col.missing_values,
            col.unique_values
        );
    }

    println!();
    Ok(())
}

pub fn cmd_predict(args: &PredictArgs) -> anyhow::Result<()> {
    let config = args.training_config()?;

    if args.json {
        let df = DataLoader::new().load_auto(&args.data)?;
        let report = TrainEngine::new(config).run(&df, &args.target)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    section("Predict");

    step_run("Loading data");
    let start = Instant::now();
    let df = DataLoader::new().load_auto(&args.data)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));

    step_run(&format!("Training battery on {}", args.target.cyan()));
    let start = Instant::now();
    let report = TrainEngine::new(config).run(&df, &args.target)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_report(&report);
    Ok(())
}

fn print_report(report: &PredictionReport) {
    println!();
    kv("Problem", &report.problem_type.to_string());
    kv("Numeric", &report.features_used.numeric.join(", "));
    kv("Categorical", &report.features_used.categorical.join(", "));
    println!();

    for result in &report.model_results {
        let detail = match &result.metrics {
            Metrics::Classification(m) => format!(
                "acc {:.4}  prec {:.4}  rec {:.4}  f1 {:.4}",
                m.accuracy, m.precision, m.recall, m.f1_score
            ),
            Metrics::Regression(m) => format!("r2 {:.4}  mse {:.4}  rmse {:.4}", m.r2_score, m.mse, m.rmse),
            Metrics::Empty {} => result.error.clone().unwrap_or_default(),
        };

        if result.is_success() {
            println!("  {} {:<22} {}", ok("✓"), result.model_name, detail);
        } else {
            println!("  {} {:<22} {}", "✗".red(), result.model_name, detail.red());
        }
    }

    if let Some(best) = report.best_model() {
        println!();
        println!("  {} {}", ok("best"), best.model_name.white().bold());
    }
    println!();
}
