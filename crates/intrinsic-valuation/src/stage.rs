//! The stage abstraction shared by every valuation step.
//!
//! A stage turns one row per symbol into an enriched row per symbol. Failures
//! are collected per symbol instead of aborting the batch.

use crate::error::{Result, ValuationError};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Identifies a valuation stage in failure reports.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Input assembly
    #[display("input_assembly")]
    InputAssembly,
    /// Discount rate (WACC)
    #[display("discount_rate")]
    DiscountRate,
    /// Cash flow projection
    #[display("cash_flow_projection")]
    CashFlowProjection,
    /// Terminal value
    #[display("terminal_value")]
    TerminalValue,
    /// Intrinsic value per share
    #[display("intrinsic_value")]
    IntrinsicValue,
    /// Margin of safety and buy decision
    #[display("margin_of_safety")]
    MarginOfSafety,
}

/// A row that belongs to one symbol.
pub trait SymbolRow {
    /// Ticker symbol of the row
    fn symbol(&self) -> &str;
}

/// A symbol removed from the batch by a stage.
#[derive(Debug)]
pub struct SymbolFailure {
    /// Symbol that failed
    pub symbol: String,
    /// Stage that rejected it
    pub stage: StageKind,
    /// Why it was rejected
    pub error: ValuationError,
}

impl SymbolFailure {
    /// Record a failure.
    pub fn new(symbol: impl Into<String>, stage: StageKind, error: ValuationError) -> Self {
        Self {
            symbol: symbol.into(),
            stage,
            error,
        }
    }
}

/// Rows that made it through a stage plus the symbols that did not.
#[derive(Debug)]
pub struct StageOutcome<T> {
    /// Successfully processed rows, in input order
    pub rows: Vec<T>,
    /// Rejected symbols, in input order
    pub failures: Vec<SymbolFailure>,
}

impl<T> Default for StageOutcome<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> StageOutcome<T> {
    /// Record a rejected symbol, logging it.
    pub fn fail(&mut self, symbol: &str, stage: StageKind, error: ValuationError) {
        warn!(symbol, %stage, error = %error, "symbol dropped from valuation");
        self.failures.push(SymbolFailure::new(symbol, stage, error));
    }
}

/// One step of the valuation pipeline.
pub trait ValuationStage {
    /// Row consumed by the stage
    type Input: SymbolRow;
    /// Row produced by the stage
    type Output: SymbolRow;

    /// Which stage this is
    fn kind(&self) -> StageKind;

    /// Process a single symbol's row.
    fn evaluate(&self, row: Self::Input) -> Result<Self::Output>;

    /// Process a batch, partitioning rows into successes and per-symbol failures.
    ///
    /// Errors that are not about one symbol are recorded against the row's
    /// symbol as well, so the batch always completes.
    fn evaluate_all(&self, rows: Vec<Self::Input>) -> StageOutcome<Self::Output> {
        let kind = self.kind();
        let mut outcome = StageOutcome::default();

        for row in rows {
            let symbol = row.symbol().to_string();
            match self.evaluate(row) {
                Ok(output) => outcome.rows.push(output),
                Err(e) => outcome.fail(&symbol, kind, e),
            }
        }

        debug!(
            stage = %kind,
            passed = outcome.rows.len(),
            failed = outcome.failures.len(),
            "stage complete"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row(String, f64);

    impl SymbolRow for Row {
        fn symbol(&self) -> &str {
            &self.0
        }
    }

    #[derive(Debug)]
    struct Reciprocal;

    impl ValuationStage for Reciprocal {
        type Input = Row;
        type Output = Row;

        fn kind(&self) -> StageKind {
            StageKind::IntrinsicValue
        }

        fn evaluate(&self, row: Row) -> Result<Row> {
            if row.1 == 0.0 {
                return Err(ValuationError::degenerate(row.0, "division by zero"));
            }
            Ok(Row(row.0, 1.0 / row.1))
        }
    }

    #[test]
    fn test_stage_kind_display() {
        assert_eq!(StageKind::DiscountRate.to_string(), "discount_rate");
        assert_eq!(StageKind::MarginOfSafety.to_string(), "margin_of_safety");
    }

    #[test]
    fn test_evaluate_all_partitions() {
        let rows = vec![
            Row("A".to_string(), 2.0),
            Row("B".to_string(), 0.0),
            Row("C".to_string(), 4.0),
        ];

        let outcome = Reciprocal.evaluate_all(rows);
        let passed: Vec<&str> = outcome.rows.iter().map(SymbolRow::symbol).collect();
        assert_eq!(passed, vec!["A", "C"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].symbol, "B");
        assert_eq!(outcome.failures[0].stage, StageKind::IntrinsicValue);
    }
}
