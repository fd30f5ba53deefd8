//! Multi-year summary statistics.
//!
//! For each symbol, summarises statement columns over the evaluation window
//! `[report_year - eval_period, report_year]`:
//!
//! - mean: average of the non-null values
//! - median: median of the non-null values
//! - percent change: latest non-null value over earliest non-null value, minus one

use crate::error::{Result, ScreenError, require_columns};
use derive_more::Display;
use intrinsic_data::columns::{SYMBOL, YEAR};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Statistic computed per symbol over the evaluation window.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    /// Arithmetic mean
    #[display("mean")]
    Mean,
    /// Median
    #[display("median")]
    Median,
    /// Last value over first value, minus one
    #[display("% change")]
    PercentChange,
}

impl Statistic {
    /// Output column name for `column` over an `eval_period`-year window.
    ///
    /// ```
    /// use intrinsic_screen::Statistic;
    ///
    /// assert_eq!(Statistic::Mean.column_name(5, "roe"), "5Y roe mean");
    /// assert_eq!(Statistic::PercentChange.column_name(10, "eps"), "10Y eps % change");
    /// ```
    pub fn column_name(self, eval_period: u32, column: &str) -> String {
        format!("{eval_period}Y {column} {self}")
    }

    fn expr(self, column: &str, alias: &str) -> Expr {
        let values = col(column).cast(DataType::Float64);
        let stat = match self {
            Self::Mean => values.mean(),
            Self::Median => values.median(),
            Self::PercentChange => {
                let present = values.drop_nulls();
                present.clone().last() / present.first() - lit(1.0)
            }
        };
        stat.alias(alias)
    }
}

impl FromStr for Statistic {
    type Err = ScreenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "change" | "percent-change" | "percent_change" | "percent change" | "% change" => {
                Ok(Self::PercentChange)
            }
            other => Err(ScreenError::UnknownStatistic(other.to_string())),
        }
    }
}

/// One row per symbol with `symbol`, `year` (the report year) and one
/// statistic column per requested column.
///
/// Rows outside the evaluation window are ignored; symbols with no rows inside
/// it are absent from the output. Output is sorted by symbol.
pub fn calculate_stats(
    df: &DataFrame,
    statistic: Statistic,
    report_year: i32,
    eval_period: u32,
    columns: &[&str],
) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    require_columns(&names, [SYMBOL, YEAR].into_iter().chain(columns.iter().copied()))?;

    let start_year = report_year - eval_period as i32;
    let aliases: Vec<String> = columns
        .iter()
        .map(|c| statistic.column_name(eval_period, c))
        .collect();
    let aggregations: Vec<Expr> = columns
        .iter()
        .zip(&aliases)
        .map(|(c, alias)| statistic.expr(c, alias))
        .collect();

    let mut selection = vec![col(SYMBOL), col(YEAR)];
    selection.extend(aliases.iter().map(|a| col(a.as_str())));

    let stats = df
        .clone()
        .lazy()
        .with_column(col(YEAR).cast(DataType::Int32))
        .filter(
            col(YEAR)
                .gt_eq(lit(start_year))
                .and(col(YEAR).lt_eq(lit(report_year))),
        )
        .sort([SYMBOL, YEAR], Default::default())
        .group_by_stable([col(SYMBOL)])
        .agg(aggregations)
        .with_column(lit(report_year).cast(DataType::Int32).alias(YEAR))
        .select(selection)
        .collect()?;

    debug!(
        %statistic,
        report_year,
        eval_period,
        symbols = stats.height(),
        "calculated summary statistics"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn history() -> DataFrame {
        df![
            "symbol" => ["AAA", "AAA", "AAA", "AAA", "BBB", "BBB"],
            "year" => [2014, 2016, 2018, 2020, 2019, 2020],
            "roe" => [Some(9.0), Some(0.10), Some(0.20), Some(0.30), None, Some(0.12)],
            "eps" => [1.0, 2.0, 3.0, 4.0, 5.0, 4.0],
        ]
        .unwrap()
    }

    fn values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[rstest]
    #[case(Statistic::Mean, "5Y roe mean")]
    #[case(Statistic::Median, "5Y roe median")]
    #[case(Statistic::PercentChange, "5Y roe % change")]
    fn test_column_names(#[case] statistic: Statistic, #[case] expected: &str) {
        assert_eq!(statistic.column_name(5, "roe"), expected);
    }

    #[rstest]
    #[case("mean", Statistic::Mean)]
    #[case("Median", Statistic::Median)]
    #[case("change", Statistic::PercentChange)]
    #[case("% change", Statistic::PercentChange)]
    fn test_parse_statistic(#[case] input: &str, #[case] expected: Statistic) {
        assert_eq!(input.parse::<Statistic>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_statistic() {
        assert!(matches!(
            "mode".parse::<Statistic>(),
            Err(ScreenError::UnknownStatistic(_))
        ));
    }

    #[test]
    fn test_mean_over_window() {
        let stats = calculate_stats(&history(), Statistic::Mean, 2020, 5, &["roe", "eps"]).unwrap();

        assert_eq!(stats.height(), 2);
        let symbols: Vec<Option<&str>> = stats.column("symbol").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(symbols, vec![Some("AAA"), Some("BBB")]);

        let roe = values(&stats, "5Y roe mean");
        assert_relative_eq!(roe[0].unwrap(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(roe[1].unwrap(), 0.12, epsilon = 1e-12);

        let eps = values(&stats, "5Y eps mean");
        assert_relative_eq!(eps[0].unwrap(), 3.0);
        assert_relative_eq!(eps[1].unwrap(), 4.5);

        let years: Vec<Option<i32>> = stats.column("year").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(years, vec![Some(2020), Some(2020)]);
    }

    #[test]
    fn test_median() {
        let stats = calculate_stats(&history(), Statistic::Median, 2020, 10, &["eps"]).unwrap();
        let eps = values(&stats, "10Y eps median");
        assert_relative_eq!(eps[0].unwrap(), 2.5);
        assert_relative_eq!(eps[1].unwrap(), 4.5);
    }

    #[test]
    fn test_percent_change_skips_nulls() {
        let stats =
            calculate_stats(&history(), Statistic::PercentChange, 2020, 5, &["roe", "eps"]).unwrap();

        let roe = values(&stats, "5Y roe % change");
        assert_relative_eq!(roe[0].unwrap(), 2.0, epsilon = 1e-12);
        // BBB has a single non-null roe inside the window
        assert_relative_eq!(roe[1].unwrap(), 0.0);

        let eps = values(&stats, "5Y eps % change");
        assert_relative_eq!(eps[0].unwrap(), 1.0);
        assert_relative_eq!(eps[1].unwrap(), -0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_column() {
        let result = calculate_stats(&history(), Statistic::Mean, 2020, 5, &["revenue"]);
        assert!(matches!(result, Err(ScreenError::MissingColumn(c)) if c == "revenue"));
    }
}
