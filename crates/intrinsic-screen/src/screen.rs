//! Threshold screening.

use crate::error::{Result, ScreenError, require_columns};
use intrinsic_data::columns::SYMBOL;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Exclusive bounds on one column.
///
/// Serializes as a two-element array `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Bounds {
    /// Exclusive lower bound
    pub min: f64,
    /// Exclusive upper bound
    pub max: f64,
}

impl Bounds {
    /// Bounds `(min, max)`.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Only a lower bound.
    pub const fn above(min: f64) -> Self {
        Self::new(min, f64::INFINITY)
    }

    /// Only an upper bound.
    pub const fn below(max: f64) -> Self {
        Self::new(f64::NEG_INFINITY, max)
    }

    fn validate(&self, column: &str) -> Result<()> {
        if self.min < self.max {
            Ok(())
        } else {
            Err(ScreenError::InvalidBounds {
                column: column.to_string(),
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Value strictly inside the bounds, or null.
    fn expr(&self, column: &str) -> Expr {
        let value = col(column).cast(DataType::Float64);
        value
            .clone()
            .gt(lit(self.min))
            .and(value.clone().lt(lit(self.max)))
            .or(value.is_null())
    }
}

impl From<[f64; 2]> for Bounds {
    fn from([min, max]: [f64; 2]) -> Self {
        Self::new(min, max)
    }
}

impl From<Bounds> for [f64; 2] {
    fn from(bounds: Bounds) -> Self {
        [bounds.min, bounds.max]
    }
}

/// Column bounds that every screened symbol must satisfy.
///
/// Serializes as a JSON object of column name to `[min, max]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenCriteria {
    bounds: BTreeMap<String, Bounds>,
}

impl ScreenCriteria {
    /// No criteria; every symbol passes.
    pub const fn new() -> Self {
        Self {
            bounds: BTreeMap::new(),
        }
    }

    /// Add bounds for `column`.
    pub fn with(mut self, column: impl Into<String>, bounds: Bounds) -> Self {
        self.bounds.insert(column.into(), bounds);
        self
    }

    /// Parse criteria from JSON, e.g. `{"5Y roe mean": [0.08, 1.0]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ScreenError::InvalidCriteria(e.to_string()))
    }

    /// Read criteria from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ScreenError::InvalidCriteria(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Columns with bounds, sorted.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.bounds.keys().map(String::as_str)
    }

    /// Number of criteria
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// True if there are no criteria
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Combined filter expression.
    fn predicate(&self) -> Result<Option<Expr>> {
        let mut predicate: Option<Expr> = None;
        for (column, bounds) in &self.bounds {
            bounds.validate(column)?;
            let expr = bounds.expr(column);
            predicate = Some(match predicate {
                Some(acc) => acc.and(expr),
                None => expr,
            });
        }
        Ok(predicate)
    }
}

/// Rows of `df` passing every criterion.
pub fn screen_frame(df: &DataFrame, criteria: &ScreenCriteria) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    require_columns(&names, criteria.columns())?;

    let screened = match criteria.predicate()? {
        Some(predicate) => df.clone().lazy().filter(predicate).collect()?,
        None => df.clone(),
    };

    info!(
        criteria = criteria.len(),
        candidates = df.height(),
        passed = screened.height(),
        "screened stocks"
    );
    Ok(screened)
}

/// Symbols of the rows passing every criterion, in table order.
///
/// A null value passes its criterion, so a symbol is only excluded by values
/// that are present and out of bounds.
pub fn screen_stocks(df: &DataFrame, criteria: &ScreenCriteria) -> Result<Vec<String>> {
    let screened = screen_frame(df, criteria)?;
    let symbols = screened
        .column(SYMBOL)
        .map_err(|_| ScreenError::MissingColumn(SYMBOL.to_string()))?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> DataFrame {
        df![
            "symbol" => ["AAA", "BBB", "CCC", "DDD"],
            "5Y roe mean" => [Some(0.15), Some(0.05), None, Some(0.30)],
            "5Y debt mean" => [Some(0.2), Some(0.1), Some(0.4), Some(0.9)],
        ]
        .unwrap()
    }

    #[test]
    fn test_bounds_are_exclusive_and_nulls_pass() {
        let criteria = ScreenCriteria::new().with("5Y roe mean", Bounds::new(0.05, 1.0));
        let symbols = screen_stocks(&stats(), &criteria).unwrap();
        assert_eq!(symbols, vec!["AAA", "CCC", "DDD"]);
    }

    #[test]
    fn test_all_criteria_must_pass() {
        let criteria = ScreenCriteria::new()
            .with("5Y roe mean", Bounds::above(0.08))
            .with("5Y debt mean", Bounds::below(0.5));
        let symbols = screen_stocks(&stats(), &criteria).unwrap();
        assert_eq!(symbols, vec!["AAA", "CCC"]);
    }

    #[test]
    fn test_empty_criteria_keep_everything() {
        let symbols = screen_stocks(&stats(), &ScreenCriteria::new()).unwrap();
        assert_eq!(symbols.len(), 4);
    }

    #[test]
    fn test_invalid_bounds() {
        let criteria = ScreenCriteria::new().with("5Y roe mean", Bounds::new(1.0, 1.0));
        assert!(matches!(
            screen_stocks(&stats(), &criteria),
            Err(ScreenError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_missing_column() {
        let criteria = ScreenCriteria::new().with("10Y eps mean", Bounds::above(0.0));
        assert!(matches!(
            screen_stocks(&stats(), &criteria),
            Err(ScreenError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_criteria_json() {
        let criteria =
            ScreenCriteria::from_json(r#"{"5Y roe mean": [0.08, 1.0], "5Y debt mean": [0, 0.5]}"#)
                .unwrap();
        assert_eq!(criteria.len(), 2);
        assert_eq!(
            criteria.columns().collect::<Vec<_>>(),
            vec!["5Y debt mean", "5Y roe mean"]
        );

        let symbols = screen_stocks(&stats(), &criteria).unwrap();
        assert_eq!(symbols, vec!["AAA", "CCC"]);
    }
}
