//! End-to-end valuation run.

use crate::config::ValuationConfig;
use crate::discount::DiscountRateCalculator;
use crate::error::Result;
use crate::growth::GrowthAssumptions;
use crate::inputs::ValuationInputAssembler;
use crate::intrinsic::IntrinsicValueCalculator;
use crate::margin::{MarginOfSafetyEvaluator, ValuationResult};
use crate::projection::{CashFlowProjector, ProjectedYear};
use crate::stage::{StageKind, SymbolFailure, ValuationStage};
use crate::terminal::TerminalValueCalculator;
use intrinsic_data::FinancialHistory;
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use tracing::info;

/// Outcome of valuing a batch of symbols.
#[derive(Debug, Default)]
pub struct ValuationRun {
    /// Fully valued companies, in request order
    pub results: Vec<ValuationResult>,
    /// Symbols removed by a stage, in the order they failed
    pub failures: Vec<SymbolFailure>,
    /// Requested symbols without report-year data
    pub dropped: Vec<String>,
}

impl ValuationRun {
    /// Result for `symbol`, if it was valued.
    pub fn result(&self, symbol: &str) -> Option<&ValuationResult> {
        self.results.iter().find(|r| r.symbol() == symbol)
    }

    /// Failure for `symbol`, if it was rejected.
    pub fn failure(&self, symbol: &str) -> Option<&SymbolFailure> {
        self.failures.iter().find(|f| f.symbol == symbol)
    }

    /// Results with a buy decision of yes.
    pub fn buy_candidates(&self) -> impl Iterator<Item = &ValuationResult> {
        self.results.iter().filter(|r| r.buy_decision.is_buy())
    }

    /// Projected years of every valued company, in result order.
    pub fn projection_schedule(&self) -> impl Iterator<Item = &ProjectedYear> {
        self.results.iter().flat_map(|r| r.projection.years.iter())
    }

    /// Number of failures per stage.
    pub fn failures_by_stage(&self) -> BTreeMap<StageKind, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.stage).or_insert(0) += 1;
        }
        counts
    }

    /// True when every requested symbol was valued.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Chains the six valuation stages.
#[derive(Debug, Clone)]
pub struct ValuationPipeline {
    config: ValuationConfig,
    assembler: ValuationInputAssembler,
    discount: DiscountRateCalculator,
    projector: CashFlowProjector,
    terminal: TerminalValueCalculator,
    intrinsic: IntrinsicValueCalculator,
    margin: MarginOfSafetyEvaluator,
}

impl ValuationPipeline {
    /// Build a pipeline after validating `config`.
    pub fn new(config: ValuationConfig, growth: GrowthAssumptions) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            assembler: ValuationInputAssembler::new(config.report_year, config.lookback_years),
            discount: DiscountRateCalculator::new(
                config.risk_free_rate,
                config.market_risk_premium,
            ),
            projector: CashFlowProjector::new(config.projection_window, growth),
            terminal: TerminalValueCalculator::new(config.gdp_growth_rate),
            intrinsic: IntrinsicValueCalculator::new(),
            margin: MarginOfSafetyEvaluator::new(config.margin_of_safety),
            config,
        })
    }

    /// Configuration of this pipeline
    pub const fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Value `symbols` using `history`.
    ///
    /// Symbols that fail a stage are reported in [`ValuationRun::failures`]
    /// and never stop the rest of the batch.
    pub fn run(&self, history: &FinancialHistory, symbols: &[String]) -> ValuationRun {
        let assembled = self.assembler.assemble(history, symbols);
        let mut failures = assembled.failures(self.config.report_year);
        let dropped = assembled.dropped;

        let discounted = self.discount.evaluate_all(assembled.rows);
        failures.extend(discounted.failures);
        let projected = self.projector.evaluate_all(discounted.rows);
        failures.extend(projected.failures);
        let terminal = self.terminal.evaluate_all(projected.rows);
        failures.extend(terminal.failures);
        let intrinsic = self.intrinsic.evaluate_all(terminal.rows);
        failures.extend(intrinsic.failures);
        let valued = self.margin.evaluate_all(intrinsic.rows);
        failures.extend(valued.failures);

        let run = ValuationRun {
            results: valued.rows,
            failures,
            dropped,
        };
        info!(
            report_year = self.config.report_year,
            requested = symbols.len(),
            valued = run.results.len(),
            failed = run.failures.len(),
            buys = run.buy_candidates().count(),
            "valuation run complete"
        );
        run
    }

    /// Value every symbol present in `history`.
    pub fn run_all(&self, history: &FinancialHistory) -> ValuationRun {
        self.run(history, &history.symbols())
    }

    /// Value `symbols` from a combined statement table.
    pub fn run_frame(&self, df: &DataFrame, symbols: &[String]) -> Result<ValuationRun> {
        let history = FinancialHistory::from_dataframe(df)?;
        Ok(self.run(&history, symbols))
    }
}
