//! Credit-default CLI Module
//!
//! Command-line interface for running the pipeline, generating synthetic
//! data and inspecting the default configuration.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::{CsvSource, SyntheticCreditData};
use crate::pipeline::{Pipeline, PipelineConfig, PipelineReport};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

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

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "credit-default")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Credit-default classification pipeline")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean, balance, train and evaluate on a CSV file
    Run {
        /// Input CSV in the 25-column credit layout
        #[arg(short, long)]
        data: PathBuf,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed (overrides the config file)
        #[arg(long)]
        seed: Option<u64>,

        /// Trees in the final forest (overrides the config file)
        #[arg(long)]
        trees: Option<usize>,

        /// Write the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Write a synthetic dataset in the raw credit layout
    Synth {
        /// Number of rows
        #[arg(short, long, default_value = "1000")]
        rows: usize,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Probability of flipping a label
        #[arg(long, default_value = "0.03")]
        noise: f64,
    },

    /// Print or write the default configuration
    Config {
        /// Output JSON file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

fn resolve_config(
    path: Option<&Path>,
    seed: Option<u64>,
    trees: Option<usize>,
) -> anyhow::Result<PipelineConfig> {
    let mut config = match path {
        Some(p) => PipelineConfig::from_json_file(p)?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if let Some(trees) = trees {
        config = config.with_tree_count(trees);
    }
    Ok(config)
}

pub fn cmd_run(
    data_path: &Path,
    config_path: Option<&Path>,
    seed: Option<u64>,
    trees: Option<usize>,
    json: Option<&Path>,
) -> anyhow::Result<()> {
    let config = resolve_config(config_path, seed, trees)?;
    let source = CsvSource::new(data_path);

    section("Run");

    step_run("Loading data");
    let start = Instant::now();
    let loaded = Pipeline::load(config, &source)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        loaded.frame().height(),
        loaded.frame().width(),
        start.elapsed()
    ));

    step_run("Cleaning");
    let start = Instant::now();
    let cleaned = loaded.clean()?;
    step_done(&format!("{} rows in {:?}", cleaned.dataset().len(), start.elapsed()));

    step_run("Engineering features");
    let start = Instant::now();
    let engineered = cleaned.engineer();
    step_done(&format!("{:?}", start.elapsed()));

    step_run("Balancing classes");
    let start = Instant::now();
    let balanced = engineered.balance()?;
    let summary = balanced.summary();
    step_done(&format!(
        "{:.1}% → {:.1}% positive in {:?}",
        100.0 * summary.before.positive_ratio(),
        100.0 * summary.after.positive_ratio(),
        start.elapsed()
    ));

    step_run("Splitting");
    let split = balanced.split()?;
    step_done(&format!(
        "{} train / {} test",
        split.train_set().len(),
        split.test_set().len()
    ));

    step_run(&format!("Training {}", "random forest".cyan()));
    let start = Instant::now();
    let trained = split.train()?;
    step_done(&format!("mtry {} in {:?}", trained.model().mtry(), start.elapsed()));

    step_run("Evaluating");
    let start = Instant::now();
    let report = trained.evaluate()?.into_report();
    step_done(&format!("{:?}", start.elapsed()));

    print_report(&report);

    if let Some(path) = json {
        step_run(&format!("Saving → {}", path.display()));
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        step_done("");
    }

    println!();
    Ok(())
}

fn print_report(report: &PipelineReport) {
    let eval = &report.evaluation;
    let cm = &eval.confusion_matrix;

    section("Search");
    for step in &report.search.steps {
        let marker = if step.mtry == report.search.best_mtry { ok("best") } else { dim("    ") };
        println!("  {} mtry {:>2}  oob {:.4}", marker, step.mtry, step.oob_error);
    }
    kv("Stopped", &format!("{:?}", report.search.stop_reason));

    section("Model");
    kv("Trees", &report.tree_count.to_string());
    kv("mtry", &report.mtry.to_string());
    kv(
        "OOB error",
        &report.oob_error.map_or_else(|| "n/a".to_string(), |e| format!("{:.4}", e)),
    );

    section("Evaluation");
    println!("  {:<18} {}", muted("Accuracy"), format!("{:.4}", eval.accuracy).white().bold());
    kv("ROC-AUC", &format!("{:.4}", eval.roc_auc));
    kv("Precision", &format!("{:.4}", eval.precision));
    kv("Recall", &format!("{:.4}", eval.recall));
    kv("F1", &format!("{:.4}", eval.f1_score));
    println!();
    println!("  {:<18} {:>8} {:>8}", "", muted("pred 0"), muted("pred 1"));
    println!("  {:<18} {:>8} {:>8}", muted("true 0"), cm.true_negative, cm.false_positive);
    println!("  {:<18} {:>8} {:>8}", muted("true 1"), cm.false_negative, cm.true_positive);

    section("Top features");
    for (rank, f) in eval.top_features(10).iter().enumerate() {
        println!("  {:>2}. {:<24} {:>12.4}", rank + 1, f.feature, f.importance);
    }
}

pub fn cmd_synth(rows: usize, output: &Path, seed: u64, noise: f64) -> anyhow::Result<()> {
    section("Synthesize");

    step_run(&format!("Generating {} rows", rows));
    let start = Instant::now();
    let mut df = SyntheticCreditData::new(rows)
        .with_seed(seed)
        .with_noise(noise)
        .generate_frame()?;
    step_done(&format!("{:?}", start.elapsed()));

    step_run(&format!("Saving → {}", output.display()));
    let mut file = std::fs::File::create(output)?;
    CsvWriter::new(&mut file).finish(&mut df)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    println!();
    Ok(())
}

pub fn cmd_config(output: Option<&Path>) -> anyhow::Result<()> {
    let json = PipelineConfig::default().to_json_pretty()?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)?;
            println!("  {} {}", ok("✓"), format!("wrote {}", path.display()));
        }
        None => println!("{}", json),
    }
    Ok(())
}
