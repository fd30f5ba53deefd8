//! Intrinsic value per share.

use crate::error::{Result, ValuationError};
use crate::stage::{StageKind, SymbolRow, ValuationStage};
use crate::terminal::TerminalRow;
use serde::{Deserialize, Serialize};

/// Terminal row with its per-share intrinsic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicRow {
    /// Row from the terminal value stage
    pub base: TerminalRow,
    /// Intrinsic value per share
    pub intrinsic_value: f64,
}

impl SymbolRow for IntrinsicRow {
    fn symbol(&self) -> &str {
        self.base.symbol()
    }
}

/// Equity value per share:
/// `(PV of FCF + terminal value + cash - total liabilities) / shares`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntrinsicValueCalculator;

impl IntrinsicValueCalculator {
    /// Create the calculator
    pub const fn new() -> Self {
        Self
    }
}

impl ValuationStage for IntrinsicValueCalculator {
    type Input = TerminalRow;
    type Output = IntrinsicRow;

    fn kind(&self) -> StageKind {
        StageKind::IntrinsicValue
    }

    fn evaluate(&self, row: TerminalRow) -> Result<IntrinsicRow> {
        let input = &row.base.base.input;
        let shares = input.number_of_shares;
        if shares <= 0.0 {
            return Err(ValuationError::degenerate(
                row.symbol(),
                format!("share count is {shares}"),
            ));
        }

        let equity_value = row.base.projection.present_value + row.terminal_value
            + input.cash_and_equivalents
            - input.total_liabilities;
        let intrinsic_value = equity_value / shares;
        if !intrinsic_value.is_finite() {
            return Err(ValuationError::degenerate(
                row.symbol(),
                "intrinsic value is not finite",
            ));
        }

        Ok(IntrinsicRow {
            base: row,
            intrinsic_value,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::discount::tests::input;
    use crate::discount::{DiscountRateCalculator, DiscountedRow};
    use crate::growth::GrowthAssumptions;
    use crate::inputs::ValuationInputRow;
    use crate::projection::CashFlowProjector;
    use crate::terminal::TerminalValueCalculator;
    use approx::assert_relative_eq;

    /// Runs the stages up to the terminal value for a 10% discount rate,
    /// 5% growth and a three year window.
    pub(crate) fn terminal_row(input: ValuationInputRow) -> TerminalRow {
        let mut discounted = DiscountRateCalculator::new(0.0, 0.1)
            .evaluate(input)
            .unwrap();
        discounted.wacc.discount_rate = 0.10;
        project(discounted)
    }

    fn project(row: DiscountedRow) -> TerminalRow {
        let growth = GrowthAssumptions::new().with(row.symbol(), 0.05).unwrap();
        let projected = CashFlowProjector::new(3, growth).evaluate(row).unwrap();
        TerminalValueCalculator::new(0.029).evaluate(projected).unwrap()
    }

    #[test]
    fn test_intrinsic_value_per_share() {
        let row = terminal_row(input("AAA"));
        let expected = (2735.45 + row.terminal_value + 500.0 - 2000.0) / 100.0;

        let valued = IntrinsicValueCalculator::new().evaluate(row).unwrap();
        assert_relative_eq!(valued.intrinsic_value, expected, epsilon = 1e-9);
        assert_relative_eq!(valued.intrinsic_value, 180.13, epsilon = 0.01);
    }

    #[test]
    fn test_zero_shares_is_degenerate() {
        let row = terminal_row(ValuationInputRow {
            number_of_shares: 0.0,
            ..input("NOSH")
        });

        assert!(matches!(
            IntrinsicValueCalculator::new().evaluate(row),
            Err(ValuationError::DegenerateComputation { symbol, .. }) if symbol == "NOSH"
        ));
    }
}
