//! Weighted average cost of capital.
//!
//! ```text
//! MVD  = (short-term debt + long-term debt) * 1.2
//! Re   = risk-free rate + beta * market risk premium
//! Rd   = max interest rate * (1 - max tax rate)
//! WACC = MVE / (MVE + MVD) * Re + MVD / (MVE + MVD) * Rd
//! ```
//!
//! Market value of equity is the market capitalization. Book debt is marked
//! up by 20% as a proxy for its market value.

use crate::error::{Result, ValuationError};
use crate::inputs::ValuationInputRow;
use crate::round::round2;
use crate::stage::{StageKind, SymbolRow, ValuationStage};
use serde::{Deserialize, Serialize};

/// Markup applied to book debt to approximate its market value.
pub const DEBT_MARKET_VALUE_MULTIPLIER: f64 = 1.2;

/// Components of a WACC computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaccBreakdown {
    /// Market value of equity
    pub market_value_equity: f64,
    /// Market value of debt
    pub market_value_debt: f64,
    /// Share of equity in total capital
    pub equity_weight: f64,
    /// Share of debt in total capital
    pub debt_weight: f64,
    /// Cost of equity (CAPM)
    pub cost_of_equity: f64,
    /// After-tax cost of debt
    pub cost_of_debt: f64,
    /// WACC rounded to cents
    pub discount_rate: f64,
}

/// Input row with its discount rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountedRow {
    /// Assembled inputs
    pub input: ValuationInputRow,
    /// WACC components
    pub wacc: WaccBreakdown,
}

impl DiscountedRow {
    /// Discount rate applied to projected cash flows
    pub const fn discount_rate(&self) -> f64 {
        self.wacc.discount_rate
    }
}

impl SymbolRow for DiscountedRow {
    fn symbol(&self) -> &str {
        &self.input.symbol
    }
}

/// Computes each company's WACC.
#[derive(Debug, Clone, Copy)]
pub struct DiscountRateCalculator {
    risk_free_rate: f64,
    market_risk_premium: f64,
}

impl DiscountRateCalculator {
    /// Calculator with the given risk-free rate and market risk premium.
    pub const fn new(risk_free_rate: f64, market_risk_premium: f64) -> Self {
        Self {
            risk_free_rate,
            market_risk_premium,
        }
    }

    /// WACC components for one company.
    pub fn breakdown(&self, input: &ValuationInputRow) -> Result<WaccBreakdown> {
        let market_value_equity = input.market_cap;
        let market_value_debt =
            (input.short_term_debt + input.long_term_debt) * DEBT_MARKET_VALUE_MULTIPLIER;
        let total_value = market_value_equity + market_value_debt;

        if total_value == 0.0 || !total_value.is_finite() {
            return Err(ValuationError::degenerate(
                &input.symbol,
                format!("total market value of capital is {total_value}"),
            ));
        }

        let equity_weight = market_value_equity / total_value;
        let debt_weight = market_value_debt / total_value;
        let cost_of_equity = self.risk_free_rate + input.beta * self.market_risk_premium;
        let cost_of_debt = input.max_interest_rate * (1.0 - input.max_tax_rate);

        Ok(WaccBreakdown {
            market_value_equity,
            market_value_debt,
            equity_weight,
            debt_weight,
            cost_of_equity,
            cost_of_debt,
            discount_rate: round2(equity_weight * cost_of_equity + debt_weight * cost_of_debt),
        })
    }
}

impl ValuationStage for DiscountRateCalculator {
    type Input = ValuationInputRow;
    type Output = DiscountedRow;

    fn kind(&self) -> StageKind {
        StageKind::DiscountRate
    }

    fn evaluate(&self, input: ValuationInputRow) -> Result<DiscountedRow> {
        let wacc = self.breakdown(&input)?;
        Ok(DiscountedRow { input, wacc })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    pub(crate) fn input(symbol: &str) -> ValuationInputRow {
        ValuationInputRow {
            symbol: symbol.to_string(),
            year: 2020,
            free_cash_flow: 1000.0,
            market_cap: 1000.0,
            short_term_debt: 0.0,
            long_term_debt: 0.0,
            beta: 1.0,
            cash_and_equivalents: 500.0,
            total_liabilities: 2000.0,
            number_of_shares: 100.0,
            stock_price: 150.0,
            max_tax_rate: 0.0,
            max_interest_rate: 0.0,
        }
    }

    #[test]
    fn test_all_equity_is_cost_of_equity() {
        let calc = DiscountRateCalculator::new(0.0069, 0.06);
        let row = calc.evaluate(input("AAA")).unwrap();

        assert_relative_eq!(row.wacc.equity_weight, 1.0);
        assert_relative_eq!(row.wacc.debt_weight, 0.0);
        assert_relative_eq!(row.wacc.cost_of_equity, 0.0669, epsilon = 1e-12);
        assert_relative_eq!(row.discount_rate(), 0.07);
    }

    #[test]
    fn test_weights_with_debt() {
        let calc = DiscountRateCalculator::new(0.01, 0.05);
        let row = ValuationInputRow {
            market_cap: 800.0,
            short_term_debt: 50.0,
            long_term_debt: 50.0,
            beta: 1.2,
            max_interest_rate: 0.05,
            max_tax_rate: 0.2,
            ..input("AAA")
        };

        let wacc = calc.breakdown(&row).unwrap();
        assert_relative_eq!(wacc.market_value_debt, 120.0);
        assert_relative_eq!(wacc.equity_weight + wacc.debt_weight, 1.0, epsilon = 1e-12);
        assert_relative_eq!(wacc.cost_of_debt, 0.04, epsilon = 1e-12);
        assert_relative_eq!(wacc.cost_of_equity, 0.07, epsilon = 1e-12);
        // 800/920 * 0.07 + 120/920 * 0.04 = 0.0661
        assert_relative_eq!(wacc.discount_rate, 0.07);
    }

    #[test]
    fn test_zero_capital_is_degenerate() {
        let calc = DiscountRateCalculator::new(0.0069, 0.06);
        let row = ValuationInputRow {
            market_cap: 0.0,
            ..input("ZERO")
        };

        assert!(matches!(
            calc.evaluate(row),
            Err(ValuationError::DegenerateComputation { symbol, .. }) if symbol == "ZERO"
        ));
    }
}
