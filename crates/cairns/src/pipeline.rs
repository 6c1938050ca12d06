//! End-to-end pipeline: panel in, scores, equity curve and summary out.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cairns_backtest::{BacktestConfig, BacktestEngine, BacktestError};
use cairns_data::{DataError, ObservationPanel};
use cairns_factors::{FactorError, ScoreOutput, ScoringConfig, ScoringModel};
use cairns_output::{EquityCurve, PerformanceSummary, TradeLog};

/// Errors from any pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Panel construction or ingestion failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Scoring model configuration or invariant failure.
    #[error(transparent)]
    Factor(#[from] FactorError),

    /// Backtest configuration or dimension failure.
    #[error(transparent)]
    Backtest(#[from] BacktestError),
}

/// Configuration for the full pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Factor scoring stage.
    pub scoring: ScoringConfig,
    /// Backtest stage.
    pub backtest: BacktestConfig,
    /// Annualization basis for the performance summary.
    pub periods_per_year: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            backtest: BacktestConfig::default(),
            periods_per_year: 252,
        }
    }
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Composite scores, IC history and rolling weights.
    pub scores: ScoreOutput,
    /// Equity per simulated date.
    pub equity: EquityCurve,
    /// Ordered trade log.
    pub trades: TradeLog,
    /// Headline statistics over the run.
    pub summary: PerformanceSummary,
}

/// Score the panel and simulate the resulting strategy.
pub fn run_pipeline(
    panel: &ObservationPanel,
    config: &PipelineConfig,
) -> Result<PipelineReport, PipelineError> {
    let model = ScoringModel::new(config.scoring.clone())?;
    let scores = model.run(panel)?;

    let engine = BacktestEngine::new(config.backtest.clone())?;
    let output = engine.run(panel, &scores.scores)?;

    let summary =
        PerformanceSummary::compute(&output.equity, &output.trades, config.periods_per_year);
    Ok(PipelineReport {
        scores,
        equity: output.equity,
        trades: output.trades,
        summary,
    })
}
