//! Conversion of valuation results to polars tables.

use crate::margin::ValuationResult;
use crate::pipeline::ValuationRun;
use crate::projection::ProjectedYear;
use intrinsic_data::columns as input_columns;
use polars::prelude::*;

/// Column names of the result and schedule tables.
pub mod columns {
    /// Highest effective tax rate in the lookback window
    pub const MAX_TAX_RATE: &str = "Max Tax Rate";
    /// Highest interest rate in the lookback window
    pub const MAX_INTEREST_RATE: &str = "Max Interest Rate";
    /// Weighted average cost of capital
    pub const DISCOUNT_RATE: &str = "Discount Rate";
    /// Assumed free cash flow growth rate
    pub const GROWTH_RATE: &str = "Growth Rate";
    /// Sum of discounted projected cash flows
    pub const PRESENT_VALUE: &str = "Present Value of Discounted FCF";
    /// Final-year projected free cash flow
    pub const LAST_PROJECTED_FCF: &str = "Last Projected FCF";
    /// Final-year discount factor
    pub const LAST_DISCOUNT_FACTOR: &str = "Last Projected Discount Factor";
    /// Long-term growth rate
    pub const LONG_TERM_GROWTH_RATE: &str = "Long Term Growth Rate";
    /// Terminal value
    pub const TERMINAL_VALUE: &str = "Terminal Value";
    /// Intrinsic value per share
    pub const INTRINSIC_VALUE: &str = "Intrinsic Value";
    /// Intrinsic value after the margin of safety
    pub const MARGIN_OF_SAFETY_VALUE: &str = "Margin of Safety Value";
    /// Yes or No
    pub const BUY_DECISION: &str = "Buy Decision";
    /// Years after the report year
    pub const YEAR_OFFSET: &str = "Year";
    /// Projected free cash flow
    pub const PROJECTED_FCF: &str = "Projected FCF";
    /// Discount factor
    pub const DISCOUNT_FACTOR: &str = "Discount Factor";
    /// Discounted free cash flow
    pub const DISCOUNTED_FCF: &str = "Discounted FCF";
}

fn float_column<F>(name: &str, results: &[ValuationResult], f: F) -> Column
where
    F: Fn(&ValuationResult) -> f64,
{
    Series::new(name.into(), results.iter().map(f).collect::<Vec<f64>>()).into()
}

/// One row per valued company: the report-year inputs followed by every
/// derived figure.
pub fn results_to_dataframe(results: &[ValuationResult]) -> PolarsResult<DataFrame> {
    let symbols: Vec<&str> = results.iter().map(ValuationResult::symbol).collect();
    let years: Vec<i32> = results.iter().map(ValuationResult::year).collect();
    let decisions: Vec<String> = results.iter().map(|r| r.buy_decision.to_string()).collect();

    DataFrame::new(vec![
        Series::new(input_columns::SYMBOL.into(), symbols).into(),
        Series::new(input_columns::YEAR.into(), years).into(),
        float_column(input_columns::FREE_CASH_FLOW, results, |r| r.input.free_cash_flow),
        float_column(input_columns::MARKET_CAP, results, |r| r.input.market_cap),
        float_column(input_columns::SHORT_TERM_DEBT, results, |r| r.input.short_term_debt),
        float_column(input_columns::LONG_TERM_DEBT, results, |r| r.input.long_term_debt),
        float_column(input_columns::BETA, results, |r| r.input.beta),
        float_column(input_columns::CASH_AND_EQUIVALENTS, results, |r| {
            r.input.cash_and_equivalents
        }),
        float_column(input_columns::TOTAL_LIABILITIES, results, |r| {
            r.input.total_liabilities
        }),
        float_column(input_columns::NUMBER_OF_SHARES, results, |r| {
            r.input.number_of_shares
        }),
        float_column(input_columns::STOCK_PRICE, results, |r| r.input.stock_price),
        float_column(columns::MAX_TAX_RATE, results, |r| r.input.max_tax_rate),
        float_column(columns::MAX_INTEREST_RATE, results, |r| r.input.max_interest_rate),
        float_column(columns::DISCOUNT_RATE, results, ValuationResult::discount_rate),
        float_column(columns::GROWTH_RATE, results, |r| r.growth_rate),
        float_column(columns::PRESENT_VALUE, results, ValuationResult::present_value),
        float_column(columns::LAST_PROJECTED_FCF, results, |r| {
            r.projection.last_projected_fcf
        }),
        float_column(columns::LAST_DISCOUNT_FACTOR, results, |r| {
            r.projection.last_discount_factor
        }),
        float_column(columns::LONG_TERM_GROWTH_RATE, results, |r| r.long_term_growth_rate),
        float_column(columns::TERMINAL_VALUE, results, |r| r.terminal_value),
        float_column(columns::INTRINSIC_VALUE, results, |r| r.intrinsic_value),
        float_column(columns::MARGIN_OF_SAFETY_VALUE, results, |r| {
            r.margin_of_safety_value
        }),
        Series::new(columns::BUY_DECISION.into(), decisions).into(),
    ])
}

/// One row per (symbol, projected year).
pub fn schedule_to_dataframe<'a, I>(years: I) -> PolarsResult<DataFrame>
where
    I: IntoIterator<Item = &'a ProjectedYear>,
{
    let years: Vec<&ProjectedYear> = years.into_iter().collect();

    DataFrame::new(vec![
        Series::new(
            input_columns::SYMBOL.into(),
            years.iter().map(|y| y.symbol.as_str()).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            columns::YEAR_OFFSET.into(),
            years.iter().map(|y| y.offset).collect::<Vec<u32>>(),
        )
        .into(),
        Series::new(
            columns::PROJECTED_FCF.into(),
            years.iter().map(|y| y.projected_fcf).collect::<Vec<f64>>(),
        )
        .into(),
        Series::new(
            columns::DISCOUNT_FACTOR.into(),
            years.iter().map(|y| y.discount_factor).collect::<Vec<f64>>(),
        )
        .into(),
        Series::new(
            columns::DISCOUNTED_FCF.into(),
            years.iter().map(|y| y.discounted_fcf).collect::<Vec<f64>>(),
        )
        .into(),
    ])
}

impl ValuationRun {
    /// Results as a table; see [`results_to_dataframe`].
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        results_to_dataframe(&self.results)
    }

    /// Projection schedule as a table; see [`schedule_to_dataframe`].
    pub fn schedule_dataframe(&self) -> PolarsResult<DataFrame> {
        schedule_to_dataframe(self.projection_schedule())
    }
}
