//! Per-company, per-year financial statement records.
//!
//! Statement exports use the provider's camelCase field names, and profile
//! fields arrive flattened under a `profile.` prefix. [`columns`] names every
//! field the valuation engine reads; [`FinancialHistory`] converts between
//! typed records and polars tables keyed by those names.

use crate::error::{DataError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Column names used by statement tables.
pub mod columns {
    /// Ticker symbol
    pub const SYMBOL: &str = "symbol";
    /// Statement date (`YYYY-MM-DD`)
    pub const DATE: &str = "date";
    /// Reporting year
    pub const YEAR: &str = "year";
    /// Free cash flow
    pub const FREE_CASH_FLOW: &str = "freeCashFlow";
    /// Market capitalization
    pub const MARKET_CAP: &str = "marketCap";
    /// Short-term debt
    pub const SHORT_TERM_DEBT: &str = "shortTermDebt";
    /// Long-term debt
    pub const LONG_TERM_DEBT: &str = "longTermDebt";
    /// Equity beta from the company profile
    pub const BETA: &str = "profile.beta";
    /// Cash and cash equivalents
    pub const CASH_AND_EQUIVALENTS: &str = "cashAndCashEquivalents";
    /// Total liabilities
    pub const TOTAL_LIABILITIES: &str = "totalLiabilities";
    /// Shares outstanding
    pub const NUMBER_OF_SHARES: &str = "numberOfShares";
    /// Share price at the statement date
    pub const STOCK_PRICE: &str = "stockPrice";
    /// Interest expense
    pub const INTEREST_EXPENSE: &str = "interestExpense";
    /// Total debt
    pub const TOTAL_DEBT: &str = "totalDebt";
    /// Effective tax rate
    pub const EFFECTIVE_TAX_RATE: &str = "effectiveTaxRate";

    /// Numeric fields read by the valuation engine, in record order.
    pub const VALUATION_FIELDS: [&str; 12] = [
        FREE_CASH_FLOW,
        MARKET_CAP,
        SHORT_TERM_DEBT,
        LONG_TERM_DEBT,
        BETA,
        CASH_AND_EQUIVALENTS,
        TOTAL_LIABILITIES,
        NUMBER_OF_SHARES,
        STOCK_PRICE,
        INTEREST_EXPENSE,
        TOTAL_DEBT,
        EFFECTIVE_TAX_RATE,
    ];
}

/// One row of financial statement data for a (symbol, year) pair.
///
/// Values are optional because providers leave gaps; downstream stages decide
/// how a gap is treated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyFinancialRecord {
    /// Ticker symbol
    pub symbol: String,
    /// Reporting year
    pub year: i32,
    /// Free cash flow
    pub free_cash_flow: Option<f64>,
    /// Market capitalization
    pub market_cap: Option<f64>,
    /// Short-term debt
    pub short_term_debt: Option<f64>,
    /// Long-term debt
    pub long_term_debt: Option<f64>,
    /// Equity beta
    pub beta: Option<f64>,
    /// Cash and cash equivalents
    pub cash_and_equivalents: Option<f64>,
    /// Total liabilities
    pub total_liabilities: Option<f64>,
    /// Shares outstanding
    pub number_of_shares: Option<f64>,
    /// Share price
    pub stock_price: Option<f64>,
    /// Interest expense
    pub interest_expense: Option<f64>,
    /// Total debt
    pub total_debt: Option<f64>,
    /// Effective tax rate
    pub effective_tax_rate: Option<f64>,
}

impl CompanyFinancialRecord {
    /// Create an empty record for a symbol and year.
    pub fn new(symbol: impl Into<String>, year: i32) -> Self {
        Self {
            symbol: symbol.into(),
            year,
            free_cash_flow: None,
            market_cap: None,
            short_term_debt: None,
            long_term_debt: None,
            beta: None,
            cash_and_equivalents: None,
            total_liabilities: None,
            number_of_shares: None,
            stock_price: None,
            interest_expense: None,
            total_debt: None,
            effective_tax_rate: None,
        }
    }

    /// Values in [`columns::VALUATION_FIELDS`] order.
    const fn values(&self) -> [Option<f64>; 12] {
        [
            self.free_cash_flow,
            self.market_cap,
            self.short_term_debt,
            self.long_term_debt,
            self.beta,
            self.cash_and_equivalents,
            self.total_liabilities,
            self.number_of_shares,
            self.stock_price,
            self.interest_expense,
            self.total_debt,
            self.effective_tax_rate,
        ]
    }
}

/// Financial statement history across symbols and years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialHistory {
    records: Vec<CompanyFinancialRecord>,
}

impl FinancialHistory {
    /// Create a history from records.
    pub const fn new(records: Vec<CompanyFinancialRecord>) -> Self {
        Self { records }
    }

    /// All records.
    pub fn records(&self) -> &[CompanyFinancialRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the history holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct symbols, sorted.
    pub fn symbols(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.symbol.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Records for one symbol, in stored order.
    pub fn for_symbol<'a>(
        &'a self,
        symbol: &'a str,
    ) -> impl Iterator<Item = &'a CompanyFinancialRecord> + 'a {
        self.records.iter().filter(move |r| r.symbol == symbol)
    }

    /// Build a history from a statement table.
    ///
    /// The table must carry `symbol`, either `year` or `date`, and every
    /// column in [`columns::VALUATION_FIELDS`]. Rows without a symbol or a
    /// parseable year are skipped.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let symbol_column = required_column(df, columns::SYMBOL)?.cast(&DataType::String)?;
        let symbols = symbol_column.str()?;
        let years = year_values(df)?;

        let fields = columns::VALUATION_FIELDS
            .iter()
            .map(|name| {
                let column = required_column(df, name)?.cast(&DataType::Float64)?;
                Ok(column.f64()?.clone())
            })
            .collect::<Result<Vec<Float64Chunked>>>()?;

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let (Some(symbol), Some(year)) = (symbols.get(i), years[i]) else {
                warn!(row = i, "skipping statement row without symbol or year");
                continue;
            };

            let value = |field: usize| fields[field].get(i);
            records.push(CompanyFinancialRecord {
                symbol: symbol.to_string(),
                year,
                free_cash_flow: value(0),
                market_cap: value(1),
                short_term_debt: value(2),
                long_term_debt: value(3),
                beta: value(4),
                cash_and_equivalents: value(5),
                total_liabilities: value(6),
                number_of_shares: value(7),
                stock_price: value(8),
                interest_expense: value(9),
                total_debt: value(10),
                effective_tax_rate: value(11),
            });
        }

        Ok(Self::new(records))
    }

    /// Convert to a statement table with provider column names.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let symbols: Vec<&str> = self.records.iter().map(|r| r.symbol.as_str()).collect();
        let years: Vec<i32> = self.records.iter().map(|r| r.year).collect();

        let mut frame_columns: Vec<Column> = vec![
            Series::new(columns::SYMBOL.into(), symbols).into(),
            Series::new(columns::YEAR.into(), years).into(),
        ];

        for (index, name) in columns::VALUATION_FIELDS.iter().enumerate() {
            let values: Vec<Option<f64>> = self.records.iter().map(|r| r.values()[index]).collect();
            frame_columns.push(Series::new((*name).into(), values).into());
        }

        Ok(DataFrame::new(frame_columns)?)
    }
}

impl From<Vec<CompanyFinancialRecord>> for FinancialHistory {
    fn from(records: Vec<CompanyFinancialRecord>) -> Self {
        Self::new(records)
    }
}

fn required_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| DataError::MissingColumn(name.to_string()))
}

/// Reporting year per row, from `year` when present and otherwise from the
/// leading four characters of `date`.
fn year_values(df: &DataFrame) -> Result<Vec<Option<i32>>> {
    if let Ok(year) = df.column(columns::YEAR) {
        let year = year.cast(&DataType::Int32)?;
        return Ok(year.i32()?.into_iter().collect());
    }

    let date = required_column(df, columns::DATE)
        .map_err(|_| DataError::MissingColumn(format!("{} or {}", columns::YEAR, columns::DATE)))?
        .cast(&DataType::String)?;
    Ok(date.str()?.into_iter().map(|d| d.and_then(parse_year)).collect())
}

/// Parse the year out of a `YYYY-MM-DD` (or bare `YYYY`) date string.
pub(crate) fn parse_year(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}
