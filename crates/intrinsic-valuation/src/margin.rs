//! Margin of safety and the buy decision.

use crate::discount::WaccBreakdown;
use crate::error::{Result, ValuationError};
use crate::inputs::ValuationInputRow;
use crate::intrinsic::IntrinsicRow;
use crate::projection::CashFlowProjection;
use crate::stage::{StageKind, SymbolRow, ValuationStage};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Whether a stock trades below its margin-of-safety value.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuyDecision {
    /// Price is strictly below the margin-of-safety value
    Yes,
    /// Price is at or above the margin-of-safety value
    No,
}

impl BuyDecision {
    /// Compare a price with a margin-of-safety value.
    pub fn from_prices(margin_of_safety_value: f64, stock_price: f64) -> Self {
        if margin_of_safety_value > stock_price {
            Self::Yes
        } else {
            Self::No
        }
    }

    /// True for [`BuyDecision::Yes`]
    pub const fn is_buy(self) -> bool {
        matches!(self, Self::Yes)
    }
}

/// Complete valuation of one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Report-year inputs and rate maxima
    pub input: ValuationInputRow,
    /// WACC components
    pub wacc: WaccBreakdown,
    /// Assumed free cash flow growth rate
    pub growth_rate: f64,
    /// Projected schedule and its aggregates
    pub projection: CashFlowProjection,
    /// Long-term growth rate used for the terminal value
    pub long_term_growth_rate: f64,
    /// Terminal value
    pub terminal_value: f64,
    /// Intrinsic value per share
    pub intrinsic_value: f64,
    /// Margin of safety applied
    pub margin_of_safety: f64,
    /// Intrinsic value after the margin of safety
    pub margin_of_safety_value: f64,
    /// Buy decision
    pub buy_decision: BuyDecision,
}

impl ValuationResult {
    /// Ticker symbol
    pub fn symbol(&self) -> &str {
        &self.input.symbol
    }

    /// Report year
    pub const fn year(&self) -> i32 {
        self.input.year
    }

    /// Share price in the report year
    pub const fn stock_price(&self) -> f64 {
        self.input.stock_price
    }

    /// Discount rate (WACC)
    pub const fn discount_rate(&self) -> f64 {
        self.wacc.discount_rate
    }

    /// Present value of the projected free cash flows
    pub const fn present_value(&self) -> f64 {
        self.projection.present_value
    }

    /// Margin-of-safety value over price, minus one.
    ///
    /// `None` when the price is not positive.
    pub fn upside(&self) -> Option<f64> {
        let price = self.stock_price();
        (price > 0.0).then(|| self.margin_of_safety_value / price - 1.0)
    }
}

impl SymbolRow for ValuationResult {
    fn symbol(&self) -> &str {
        self.symbol()
    }
}

/// Applies the margin of safety and decides whether to buy.
#[derive(Debug, Clone, Copy)]
pub struct MarginOfSafetyEvaluator {
    margin_of_safety: f64,
}

impl MarginOfSafetyEvaluator {
    /// Evaluator discounting intrinsic value by `margin_of_safety`.
    pub const fn new(margin_of_safety: f64) -> Self {
        Self { margin_of_safety }
    }
}

impl ValuationStage for MarginOfSafetyEvaluator {
    type Input = IntrinsicRow;
    type Output = ValuationResult;

    fn kind(&self) -> StageKind {
        StageKind::MarginOfSafety
    }

    fn evaluate(&self, row: IntrinsicRow) -> Result<ValuationResult> {
        let margin_of_safety_value = row.intrinsic_value * (1.0 - self.margin_of_safety);
        if !margin_of_safety_value.is_finite() {
            return Err(ValuationError::degenerate(
                row.symbol(),
                "margin of safety value is not finite",
            ));
        }

        let IntrinsicRow {
            base: terminal,
            intrinsic_value,
        } = row;
        let projected = terminal.base;
        let discounted = projected.base;
        let buy_decision =
            BuyDecision::from_prices(margin_of_safety_value, discounted.input.stock_price);

        Ok(ValuationResult {
            input: discounted.input,
            wacc: discounted.wacc,
            growth_rate: projected.growth_rate,
            projection: projected.projection,
            long_term_growth_rate: terminal.long_term_growth_rate,
            terminal_value: terminal.terminal_value,
            intrinsic_value,
            margin_of_safety: self.margin_of_safety,
            margin_of_safety_value,
            buy_decision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::tests::input;
    use crate::intrinsic::IntrinsicValueCalculator;
    use crate::intrinsic::tests::terminal_row;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn valued(stock_price: f64) -> IntrinsicRow {
        let row = terminal_row(ValuationInputRow {
            stock_price,
            ..input("AAA")
        });
        IntrinsicValueCalculator::new().evaluate(row).unwrap()
    }

    #[rstest]
    #[case::below(99.0, BuyDecision::Yes)]
    #[case::equal(100.0, BuyDecision::No)]
    #[case::above(101.0, BuyDecision::No)]
    fn test_buy_decision_is_strict(#[case] price: f64, #[case] expected: BuyDecision) {
        assert_eq!(BuyDecision::from_prices(100.0, price), expected);
    }

    #[rstest]
    #[case::inside_margin(74.0, BuyDecision::Yes)]
    #[case::at_margin(75.0, BuyDecision::No)]
    #[case::outside_margin(76.0, BuyDecision::No)]
    fn test_quarter_margin_on_intrinsic_value_of_100(
        #[case] price: f64,
        #[case] expected: BuyDecision,
    ) {
        let row = IntrinsicRow {
            intrinsic_value: 100.0,
            ..valued(price)
        };

        let result = MarginOfSafetyEvaluator::new(0.25).evaluate(row).unwrap();
        assert_relative_eq!(result.margin_of_safety_value, 75.0);
        assert_eq!(result.buy_decision, expected);
    }

    #[test]
    fn test_margin_applied() {
        let row = valued(150.0);
        let intrinsic = row.intrinsic_value;

        let result = MarginOfSafetyEvaluator::new(0.25).evaluate(row).unwrap();
        assert_relative_eq!(result.margin_of_safety_value, intrinsic * 0.75);
        assert_eq!(result.buy_decision, BuyDecision::No);
        assert_eq!(result.symbol(), "AAA");
        assert_relative_eq!(result.present_value(), 2735.45, epsilon = 1e-9);
    }

    #[test]
    fn test_cheap_stock_is_a_buy() {
        let result = MarginOfSafetyEvaluator::new(0.25).evaluate(valued(100.0)).unwrap();
        assert!(result.buy_decision.is_buy());
        assert!(result.upside().is_some_and(|u| u > 0.0));
    }

    #[test]
    fn test_zero_margin_keeps_intrinsic_value() {
        let row = valued(150.0);
        let intrinsic = row.intrinsic_value;
        let result = MarginOfSafetyEvaluator::new(0.0).evaluate(row).unwrap();
        assert_eq!(result.margin_of_safety_value, intrinsic);
        assert_eq!(result.buy_decision.to_string(), "Yes");
    }
}
