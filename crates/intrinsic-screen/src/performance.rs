//! Long-run performance metrics.
//!
//! Five statement metrics whose multi-year trends indicate whether a company's
//! cash flows are stable enough to value. Each metric carries a note on the
//! trend to look for.

use crate::error::{Result, require_columns};
use intrinsic_data::columns::{SYMBOL, YEAR};
use polars::prelude::*;
use tracing::debug;

/// Metric metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceMetric {
    /// Display name and output column
    pub name: &'static str,
    /// Source column in the statement table
    pub source_column: &'static str,
    /// Multiplier applied to the source value
    pub scale: f64,
    /// What a healthy history looks like
    pub guidance: &'static str,
}

impl PerformanceMetric {
    fn expr(&self) -> Expr {
        let value = col(self.source_column).cast(DataType::Float64);
        let value = if self.scale == 1.0 {
            value
        } else {
            value * lit(self.scale)
        };
        value.alias(self.name)
    }
}

/// All performance metrics, in output column order
pub const PERFORMANCE_METRICS: [PerformanceMetric; 5] = [
    PerformanceMetric {
        name: "Earnings per Share",
        source_column: "eps",
        scale: 1.0,
        guidance: "Profit per share. Should slope upwards over time, and stable results matter \
                   most for forecasting future cash flows. If book value has grown, EPS should \
                   show similar growth.",
    },
    PerformanceMetric {
        name: "Book Value per Share",
        source_column: "bookValuePerShare",
        scale: 1.0,
        guidance: "Liquidation value of the company per share. Should increase over time. A high \
                   dividend slows its growth; without a dividend it should grow with EPS.",
    },
    PerformanceMetric {
        name: "Return on Equity",
        source_column: "roe",
        scale: 100.0,
        guidance: "Return management earns by reinvesting profits, in percent. Should be flat or \
                   increasing for an intrinsic value estimate to hold. Look for a consistent ROE \
                   above 8%.",
    },
    PerformanceMetric {
        name: "Current Ratio",
        source_column: "currentRatio",
        scale: 1.0,
        guidance: "Short-term health. Should be above 1.0, and above 1.5 is typically safe. Look \
                   for stable trends.",
    },
    PerformanceMetric {
        name: "Debt to Equity Ratio",
        source_column: "debtToEquity",
        scale: 1.0,
        guidance: "Long-term health. Should be below 0.5. Look for stable trends.",
    },
];

/// Look up a metric by display name or source column.
pub fn metric_info(name: &str) -> Option<&'static PerformanceMetric> {
    PERFORMANCE_METRICS
        .iter()
        .find(|m| m.name == name || m.source_column == name)
}

/// Performance metrics per symbol and year from `report_year - eval_period`
/// onwards.
///
/// Columns are `symbol`, `year` and one column per [`PERFORMANCE_METRICS`]
/// entry named after the metric. Return on equity is expressed in percent.
/// Rows with any missing metric are dropped; output is sorted by symbol then
/// year.
pub fn performance_history(df: &DataFrame, report_year: i32, eval_period: u32) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    require_columns(
        &names,
        [SYMBOL, YEAR]
            .into_iter()
            .chain(PERFORMANCE_METRICS.iter().map(|m| m.source_column)),
    )?;

    let start_year = report_year - eval_period as i32;
    let mut selection = vec![col(SYMBOL), col(YEAR).cast(DataType::Int32)];
    selection.extend(PERFORMANCE_METRICS.iter().map(PerformanceMetric::expr));

    let history = df
        .clone()
        .lazy()
        .filter(col(YEAR).gt_eq(lit(start_year)))
        .select(selection)
        .sort([SYMBOL, YEAR], Default::default())
        .drop_nulls(None)
        .collect()?;

    debug!(rows = history.height(), start_year, "built performance history");
    Ok(history)
}
