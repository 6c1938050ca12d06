//! Cairns CLI binary.
//!
//! Runs the factor scoring and backtest pipeline over a CSV panel and
//! writes the equity curve, trade log and summary artifacts.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use cairns::pipeline::{PipelineConfig, run_pipeline};
use cairns_backtest::{BacktestConfig, DrawdownControl, WeightingScheme};
use cairns_data::{ObservationPanel, panel_from_csv};
use cairns_factors::{
    ClipMethod, IcConfig, IcMethod, ScoringConfig, StandardizeConfig, WeightConfig,
};
use cairns_output::{write_equity_csv, write_summary_json, write_trades_csv};

#[derive(Parser)]
#[command(name = "cairns")]
#[command(about = "Cairns: multi-factor scoring and backtest pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a panel and backtest the composite signal
    Run {
        /// Input CSV panel (symbol, date, open, close, volume, factors...)
        #[arg(long)]
        input: PathBuf,

        /// Comma-separated factor column names
        #[arg(long, value_delimiter = ',', required = true)]
        factors: Vec<String>,

        /// Rolling IC window length
        #[arg(long, default_value = "60")]
        window: usize,

        /// Forward-return horizon in periods
        #[arg(long, default_value = "1")]
        horizon: usize,

        /// IC method: spearman or pearson
        #[arg(long, default_value = "spearman")]
        ic_method: String,

        /// Minimum cross-section size for an IC observation
        #[arg(long, default_value = "20")]
        ic_min: usize,

        /// Minimum cross-section size for standardization
        #[arg(long, default_value = "5")]
        min_cross_section: usize,

        /// MAD clip multiple for outlier trimming
        #[arg(long, default_value = "3.0")]
        mad_clip: f64,

        /// Maximum absolute factor weight
        #[arg(long, default_value = "3.0")]
        max_factor_weight: f64,

        /// Rebalance every N trading periods
        #[arg(long, default_value = "5")]
        rebalance_every: usize,

        /// Number of long positions
        #[arg(long, default_value = "10")]
        top_k: usize,

        /// Number of short positions (omit for long-only)
        #[arg(long)]
        bottom_k: Option<usize>,

        /// Weight selected names by score instead of equally
        #[arg(long)]
        score_weighted: bool,

        /// Maximum weight per instrument
        #[arg(long, default_value = "0.10")]
        max_weight: f64,

        /// Transaction cost in basis points on notional traded
        #[arg(long, default_value = "10.0")]
        cost_bps: f64,

        /// Minimum daily traded notional for eligibility
        #[arg(long)]
        min_notional: Option<f64>,

        /// Trailing drawdown that triggers de-risking
        #[arg(long)]
        drawdown_threshold: Option<f64>,

        /// Multiplier applied to targets while de-risked
        #[arg(long, default_value = "0.5")]
        derisk_factor: f64,

        /// Starting equity
        #[arg(long, default_value = "1000000.0")]
        initial_equity: f64,

        /// Annualization basis for the summary
        #[arg(long, default_value = "252")]
        periods_per_year: usize,

        /// Directory for equity/trades/summary artifacts
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the summary as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Describe a panel: shape, date range and factor coverage
    Inspect {
        /// Input CSV panel
        #[arg(long)]
        input: PathBuf,

        /// Comma-separated factor column names
        #[arg(long, value_delimiter = ',', required = true)]
        factors: Vec<String>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            factors,
            window,
            horizon,
            ic_method,
            ic_min,
            min_cross_section,
            mad_clip,
            max_factor_weight,
            rebalance_every,
            top_k,
            bottom_k,
            score_weighted,
            max_weight,
            cost_bps,
            min_notional,
            drawdown_threshold,
            derisk_factor,
            initial_equity,
            periods_per_year,
            output_dir,
            json,
        } => {
            let method = parse_ic_method(&ic_method)?;
            let config = PipelineConfig {
                scoring: ScoringConfig {
                    standardize: StandardizeConfig {
                        clip: ClipMethod::MedianAbsDev { k: mad_clip },
                        min_cross_section,
                    },
                    ic: IcConfig {
                        method,
                        min_observations: ic_min,
                    },
                    weight: WeightConfig {
                        window,
                        max_abs_weight: max_factor_weight,
                    },
                    horizon,
                },
                backtest: BacktestConfig {
                    rebalance_every,
                    top_k,
                    bottom_k,
                    weighting: if score_weighted {
                        WeightingScheme::ScoreWeighted
                    } else {
                        WeightingScheme::EqualWeight
                    },
                    max_position_weight: max_weight,
                    cost_bps,
                    min_volume_notional: min_notional,
                    drawdown: drawdown_threshold.map(|threshold| DrawdownControl {
                        threshold,
                        derisk_factor,
                    }),
                    initial_equity,
                },
                periods_per_year,
            };
            run_backtest(&input, &factors, &config, output_dir.as_deref(), json)
        }
        Commands::Inspect { input, factors } => inspect_panel(&input, &factors),
    }
}

fn run_backtest(
    input: &std::path::Path,
    factors: &[String],
    config: &PipelineConfig,
    output_dir: Option<&std::path::Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let spinner = make_spinner("Loading panel...");
    let panel = panel_from_csv(input, factors)?;
    spinner.set_message(format!(
        "Scoring and simulating {} instruments over {} dates...",
        panel.n_instruments(),
        panel.n_dates()
    ));
    let report = run_pipeline(&panel, config)?;
    spinner.finish_and_clear();

    if json {
        let ic_means: Vec<_> = report
            .scores
            .ic
            .iter()
            .map(|series| {
                json!({
                    "factor": series.factor,
                    "mean_ic": series.mean(),
                    "coverage": series.coverage(),
                })
            })
            .collect();
        let summary = serde_json::to_value(&report.summary)?;
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "summary": summary,
                "factors": ic_means,
            }))?
        );
    } else {
        for series in &report.scores.ic {
            match series.mean() {
                Some(mean) => println!(
                    "factor {:<20} mean IC {:>8.4} over {} dates",
                    series.factor,
                    mean,
                    series.coverage()
                ),
                None => println!("factor {:<20} no IC observations", series.factor),
            }
        }
        println!("{}", report.summary.to_ascii_table());
    }

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;
        write_equity_csv(&report.equity, &dir.join("equity.csv"))?;
        write_trades_csv(&report.trades, &dir.join("trades.csv"))?;
        write_summary_json(&report.summary, &dir.join("summary.json"))?;
        println!("Artifacts written to {}", dir.display());
    }
    Ok(())
}

fn inspect_panel(
    input: &std::path::Path,
    factors: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let spinner = make_spinner("Loading panel...");
    let panel = panel_from_csv(input, factors)?;
    spinner.finish_and_clear();

    let calendar = panel.calendar();
    println!(
        "{} instruments, {} dates ({} to {}), {} factors",
        panel.n_instruments(),
        panel.n_dates(),
        calendar[0],
        calendar[calendar.len() - 1],
        panel.n_factors()
    );
    for f in 0..panel.n_factors() {
        let coverage = factor_coverage(&panel, f);
        println!(
            "  {:<20} {:>6.1}% populated",
            panel.factor_names()[f],
            coverage * 100.0
        );
    }
    Ok(())
}

fn factor_coverage(panel: &ObservationPanel, factor_idx: usize) -> f64 {
    let mut listed = 0usize;
    let mut populated = 0usize;
    for d in 0..panel.n_dates() {
        for i in 0..panel.n_instruments() {
            if panel.is_listed(d, i) {
                listed += 1;
                if panel.factor_value(d, i, factor_idx).is_some() {
                    populated += 1;
                }
            }
        }
    }
    if listed == 0 {
        0.0
    } else {
        populated as f64 / listed as f64
    }
}

fn parse_ic_method(name: &str) -> Result<IcMethod, Box<dyn std::error::Error>> {
    match name.to_ascii_lowercase().as_str() {
        "spearman" | "rank" => Ok(IcMethod::Spearman),
        "pearson" => Ok(IcMethod::Pearson),
        other => Err(format!("unknown IC method '{other}' (use spearman or pearson)").into()),
    }
}

fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("static template is valid"),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}
