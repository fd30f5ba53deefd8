//! Valuation input assembly.
//!
//! Picks each symbol's report-year figures and attaches the highest effective
//! tax rate and interest rate seen since the start of the lookback window.

use crate::error::ValuationError;
use crate::round::{finite_or_zero, round2, value_or_zero};
use crate::stage::{StageKind, SymbolFailure, SymbolRow};
use intrinsic_data::{CompanyFinancialRecord, FinancialHistory};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Report-year figures of one company plus its historical rate maxima.
///
/// Missing or non-finite statement values are carried as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationInputRow {
    /// Ticker symbol
    pub symbol: String,
    /// Report year
    pub year: i32,
    /// Free cash flow
    pub free_cash_flow: f64,
    /// Market capitalization
    pub market_cap: f64,
    /// Short-term debt
    pub short_term_debt: f64,
    /// Long-term debt
    pub long_term_debt: f64,
    /// Equity beta
    pub beta: f64,
    /// Cash and cash equivalents
    pub cash_and_equivalents: f64,
    /// Total liabilities
    pub total_liabilities: f64,
    /// Shares outstanding
    pub number_of_shares: f64,
    /// Share price
    pub stock_price: f64,
    /// Highest effective tax rate in the lookback window, rounded to cents
    pub max_tax_rate: f64,
    /// Highest interest rate (interest expense / total debt) in the lookback window
    pub max_interest_rate: f64,
}

impl ValuationInputRow {
    fn from_record(record: &CompanyFinancialRecord, maxima: RateMaxima) -> Self {
        Self {
            symbol: record.symbol.clone(),
            year: record.year,
            free_cash_flow: value_or_zero(record.free_cash_flow),
            market_cap: value_or_zero(record.market_cap),
            short_term_debt: value_or_zero(record.short_term_debt),
            long_term_debt: value_or_zero(record.long_term_debt),
            beta: value_or_zero(record.beta),
            cash_and_equivalents: value_or_zero(record.cash_and_equivalents),
            total_liabilities: value_or_zero(record.total_liabilities),
            number_of_shares: value_or_zero(record.number_of_shares),
            stock_price: value_or_zero(record.stock_price),
            max_tax_rate: round2(maxima.tax.max(0.0)),
            max_interest_rate: maxima.interest.max(0.0),
        }
    }
}

impl SymbolRow for ValuationInputRow {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

/// Interest expense over total debt, rounded to cents.
///
/// Zero debt and missing values give a rate of zero.
pub fn interest_rate(record: &CompanyFinancialRecord) -> f64 {
    let expense = value_or_zero(record.interest_expense);
    let debt = value_or_zero(record.total_debt);
    finite_or_zero(round2(expense / debt))
}

#[derive(Debug, Clone, Copy)]
struct RateMaxima {
    tax: f64,
    interest: f64,
}

impl RateMaxima {
    const fn empty() -> Self {
        Self {
            tax: f64::NEG_INFINITY,
            interest: f64::NEG_INFINITY,
        }
    }

    fn observe(&mut self, record: &CompanyFinancialRecord) {
        self.tax = self.tax.max(value_or_zero(record.effective_tax_rate));
        self.interest = self.interest.max(interest_rate(record));
    }
}

/// Rows ready for valuation and the requested symbols that had no report-year data.
#[derive(Debug, Default)]
pub struct AssembledInputs {
    /// One row per matched symbol, in request order
    pub rows: Vec<ValuationInputRow>,
    /// Requested symbols without a report-year row, in request order
    pub dropped: Vec<String>,
}

impl AssembledInputs {
    /// Dropped symbols as failures of the assembly stage.
    pub fn failures(&self, report_year: i32) -> Vec<SymbolFailure> {
        self.dropped
            .iter()
            .map(|symbol| {
                SymbolFailure::new(
                    symbol,
                    StageKind::InputAssembly,
                    ValuationError::missing(symbol, format!("no financial data for {report_year}")),
                )
            })
            .collect()
    }
}

/// Builds [`ValuationInputRow`]s from a financial history.
#[derive(Debug, Clone, Copy)]
pub struct ValuationInputAssembler {
    report_year: i32,
    lookback_years: u32,
}

impl ValuationInputAssembler {
    /// Assembler for `report_year`, searching rate maxima from
    /// `report_year - lookback_years` onwards.
    pub const fn new(report_year: i32, lookback_years: u32) -> Self {
        Self {
            report_year,
            lookback_years,
        }
    }

    /// Report year being assembled
    pub const fn report_year(&self) -> i32 {
        self.report_year
    }

    /// Assemble one row per requested symbol.
    ///
    /// Rate maxima cover every record from the start of the lookback window
    /// onwards, including years after the report year. Symbols without a
    /// report-year record are listed in [`AssembledInputs::dropped`]. A
    /// duplicate report-year record keeps the first occurrence.
    pub fn assemble(&self, history: &FinancialHistory, symbols: &[String]) -> AssembledInputs {
        let start_year = window_start(self.report_year, self.lookback_years);

        let mut seen = HashSet::new();
        let requested: Vec<&str> = symbols
            .iter()
            .map(String::as_str)
            .filter(|s| seen.insert(*s))
            .collect();

        let mut maxima: BTreeMap<&str, RateMaxima> = BTreeMap::new();
        let mut report_rows: BTreeMap<&str, &CompanyFinancialRecord> = BTreeMap::new();

        for record in history.records() {
            let symbol = record.symbol.as_str();
            if record.year < start_year || !seen.contains(symbol) {
                continue;
            }

            maxima
                .entry(symbol)
                .or_insert_with(RateMaxima::empty)
                .observe(record);

            if record.year == self.report_year {
                match report_rows.entry(symbol) {
                    Entry::Vacant(slot) => {
                        slot.insert(record);
                    }
                    Entry::Occupied(_) => {
                        warn!(symbol, year = record.year, "duplicate report-year record ignored");
                    }
                }
            }
        }

        let mut assembled = AssembledInputs::default();
        for symbol in requested {
            match (report_rows.get(symbol), maxima.get(symbol)) {
                (Some(record), Some(rates)) => assembled
                    .rows
                    .push(ValuationInputRow::from_record(record, *rates)),
                _ => assembled.dropped.push(symbol.to_string()),
            }
        }

        debug!(
            report_year = self.report_year,
            matched = assembled.rows.len(),
            dropped = assembled.dropped.len(),
            "assembled valuation inputs"
        );
        assembled
    }
}

/// `report_year - years`, saturating at `i32::MIN`.
pub(crate) fn window_start(report_year: i32, years: u32) -> i32 {
    i32::try_from(years).map_or(i32::MIN, |years| report_year.saturating_sub(years))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(symbol: &str, year: i32, tax: f64, expense: f64, debt: f64) -> CompanyFinancialRecord {
        CompanyFinancialRecord {
            effective_tax_rate: Some(tax),
            interest_expense: Some(expense),
            total_debt: Some(debt),
            free_cash_flow: Some(100.0),
            number_of_shares: Some(10.0),
            ..CompanyFinancialRecord::new(symbol, year)
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_interest_rate() {
        assert_relative_eq!(interest_rate(&record("A", 2020, 0.2, 5.0, 60.0)), 0.08);
        assert_eq!(interest_rate(&record("A", 2020, 0.2, 5.0, 0.0)), 0.0);
        assert_eq!(interest_rate(&record("A", 2020, 0.2, 0.0, 0.0)), 0.0);
        assert_eq!(interest_rate(&CompanyFinancialRecord::new("A", 2020)), 0.0);
    }

    #[test]
    fn test_maxima_over_lookback_window() {
        let history = FinancialHistory::new(vec![
            record("AAA", 2014, 0.90, 90.0, 100.0),
            record("AAA", 2016, 0.21, 4.0, 100.0),
            record("AAA", 2018, 0.254, 6.0, 100.0),
            record("AAA", 2020, 0.18, 5.0, 100.0),
        ]);

        let assembled = ValuationInputAssembler::new(2020, 5).assemble(&history, &symbols(&["AAA"]));
        assert_eq!(assembled.rows.len(), 1);

        let row = &assembled.rows[0];
        assert_eq!(row.year, 2020);
        assert_relative_eq!(row.max_tax_rate, 0.25);
        assert_relative_eq!(row.max_interest_rate, 0.06);
        assert_relative_eq!(row.free_cash_flow, 100.0);
    }

    #[test]
    fn test_years_after_report_year_count_towards_maxima() {
        let history = FinancialHistory::new(vec![
            record("AAA", 2020, 0.20, 1.0, 100.0),
            record("AAA", 2021, 0.35, 9.0, 100.0),
        ]);

        let assembled = ValuationInputAssembler::new(2020, 3).assemble(&history, &symbols(&["AAA"]));
        assert_relative_eq!(assembled.rows[0].max_tax_rate, 0.35);
        assert_relative_eq!(assembled.rows[0].max_interest_rate, 0.09);
    }

    #[test]
    fn test_unmatched_symbols_are_dropped() {
        let history = FinancialHistory::new(vec![
            record("AAA", 2020, 0.2, 1.0, 10.0),
            record("BBB", 2019, 0.2, 1.0, 10.0),
        ]);

        let assembled = ValuationInputAssembler::new(2020, 5)
            .assemble(&history, &symbols(&["BBB", "AAA", "CCC", "AAA"]));

        let matched: Vec<&str> = assembled.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(matched, vec!["AAA"]);
        assert_eq!(assembled.dropped, symbols(&["BBB", "CCC"]));

        let failures = assembled.failures(2020);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].stage, StageKind::InputAssembly);
    }

    #[test]
    fn test_unrequested_symbols_ignored() {
        let history = FinancialHistory::new(vec![
            record("AAA", 2020, 0.2, 1.0, 10.0),
            record("BBB", 2020, 0.2, 1.0, 10.0),
        ]);

        let assembled = ValuationInputAssembler::new(2020, 5).assemble(&history, &symbols(&["BBB"]));
        assert_eq!(assembled.rows.len(), 1);
        assert_eq!(assembled.rows[0].symbol, "BBB");
        assert!(assembled.dropped.is_empty());
    }

    #[test]
    fn test_duplicate_report_year_keeps_first() {
        let mut first = record("AAA", 2020, 0.2, 1.0, 10.0);
        first.stock_price = Some(11.0);
        let mut second = record("AAA", 2020, 0.2, 1.0, 10.0);
        second.stock_price = Some(99.0);

        let history = FinancialHistory::new(vec![first, second]);
        let assembled = ValuationInputAssembler::new(2020, 5).assemble(&history, &symbols(&["AAA"]));
        assert_eq!(assembled.rows.len(), 1);
        assert_relative_eq!(assembled.rows[0].stock_price, 11.0);
    }

    #[test]
    fn test_missing_values_become_zero() {
        let history = FinancialHistory::new(vec![CompanyFinancialRecord {
            beta: Some(f64::NAN),
            ..CompanyFinancialRecord::new("AAA", 2020)
        }]);

        let assembled = ValuationInputAssembler::new(2020, 5).assemble(&history, &symbols(&["AAA"]));
        let row = &assembled.rows[0];
        assert_eq!(row.beta, 0.0);
        assert_eq!(row.max_tax_rate, 0.0);
        assert_eq!(row.max_interest_rate, 0.0);
        assert_eq!(row.number_of_shares, 0.0);
    }

    #[test]
    fn test_negative_rates_clamped() {
        let history = FinancialHistory::new(vec![record("AAA", 2020, -0.4, -3.0, 10.0)]);
        let assembled = ValuationInputAssembler::new(2020, 5).assemble(&history, &symbols(&["AAA"]));
        assert_eq!(assembled.rows[0].max_tax_rate, 0.0);
        assert_eq!(assembled.rows[0].max_interest_rate, 0.0);
    }

    #[test]
    fn test_unbounded_lookback_covers_all_history() {
        let history = FinancialHistory::new(vec![
            record("AAA", 1950, 0.45, 9.0, 100.0),
            record("AAA", 2020, 0.18, 5.0, 100.0),
        ]);

        let assembled = ValuationInputAssembler::new(2020, u32::MAX).assemble(&history, &symbols(&["AAA"]));
        assert_relative_eq!(assembled.rows[0].max_tax_rate, 0.45);
        assert_relative_eq!(assembled.rows[0].max_interest_rate, 0.09);
    }

    #[test]
    fn test_window_start_saturates() {
        assert_eq!(window_start(2020, 5), 2015);
        assert_eq!(window_start(2020, u32::MAX), i32::MIN);
        assert_eq!(window_start(-2_147_483_000, 1_000), i32::MIN);
    }
}
