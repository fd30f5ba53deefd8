//! Terminal value by the Gordon growth model.
//!
//! ```text
//! TV = last projected FCF * (1 + g) / (r - g)
//! ```
//!
//! where `g` is the long-term growth rate and `r` the company's discount rate.

use crate::error::{Result, ValuationError};
use crate::projection::ProjectedRow;
use crate::stage::{StageKind, SymbolRow, ValuationStage};
use serde::{Deserialize, Serialize};

/// Projected row with its terminal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalRow {
    /// Row from the projection stage
    pub base: ProjectedRow,
    /// Long-term growth rate used
    pub long_term_growth_rate: f64,
    /// Value of cash flows beyond the projection window
    pub terminal_value: f64,
}

impl SymbolRow for TerminalRow {
    fn symbol(&self) -> &str {
        self.base.symbol()
    }
}

/// Computes terminal values at a fixed long-term growth rate.
#[derive(Debug, Clone, Copy)]
pub struct TerminalValueCalculator {
    long_term_growth_rate: f64,
}

impl TerminalValueCalculator {
    /// Calculator using `long_term_growth_rate` (typically GDP growth).
    pub const fn new(long_term_growth_rate: f64) -> Self {
        Self {
            long_term_growth_rate,
        }
    }

    /// Gordon growth value of `last_fcf` at `discount_rate`.
    ///
    /// Fails when the discount rate does not exceed the growth rate.
    pub fn terminal_value(&self, symbol: &str, last_fcf: f64, discount_rate: f64) -> Result<f64> {
        let growth = self.long_term_growth_rate;
        if discount_rate <= growth {
            return Err(ValuationError::degenerate(
                symbol,
                format!(
                    "discount rate {discount_rate} does not exceed long-term growth rate {growth}"
                ),
            ));
        }

        let value = last_fcf * (1.0 + growth) / (discount_rate - growth);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ValuationError::degenerate(symbol, "terminal value is not finite"))
        }
    }
}

impl ValuationStage for TerminalValueCalculator {
    type Input = ProjectedRow;
    type Output = TerminalRow;

    fn kind(&self) -> StageKind {
        StageKind::TerminalValue
    }

    fn evaluate(&self, row: ProjectedRow) -> Result<TerminalRow> {
        let terminal_value = self.terminal_value(
            row.symbol(),
            row.projection.last_projected_fcf,
            row.base.discount_rate(),
        )?;
        Ok(TerminalRow {
            base: row,
            long_term_growth_rate: self.long_term_growth_rate,
            terminal_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_gordon_growth() {
        let calc = TerminalValueCalculator::new(0.029);
        let value = calc.terminal_value("AAA", 1157.63, 0.10).unwrap();
        assert_relative_eq!(value, 1157.63 * 1.029 / 0.071, epsilon = 1e-9);
        assert_relative_eq!(value, 16777.48, epsilon = 0.01);
    }

    #[rstest]
    #[case::equal(0.029)]
    #[case::below(0.02)]
    #[case::negative(-0.05)]
    fn test_rate_not_above_growth(#[case] discount_rate: f64) {
        let calc = TerminalValueCalculator::new(0.029);
        assert!(matches!(
            calc.terminal_value("AAA", 100.0, discount_rate),
            Err(ValuationError::DegenerateComputation { .. })
        ));
    }

    #[test]
    fn test_negative_cash_flow_gives_negative_value() {
        let calc = TerminalValueCalculator::new(0.02);
        let value = calc.terminal_value("AAA", -100.0, 0.07).unwrap();
        assert!(value < 0.0);
    }
}
