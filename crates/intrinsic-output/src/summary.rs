//! Valuation run summary.
//!
//! Renders the outcome of a run as an ASCII table for the terminal or as
//! Markdown for reports.

use crate::export::FailureRecord;
use intrinsic_valuation::{BuyDecision, ValuationRun};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One valued company in a summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRow {
    /// Ticker symbol.
    pub symbol: String,

    /// Share price in the report year.
    pub stock_price: f64,

    /// Discount rate (WACC).
    pub discount_rate: f64,

    /// Intrinsic value per share.
    pub intrinsic_value: f64,

    /// Intrinsic value after the margin of safety.
    pub margin_of_safety_value: f64,

    /// Buy decision.
    pub buy_decision: BuyDecision,
}

impl SummaryRow {
    /// Margin-of-safety value relative to price, in percent.
    pub fn upside_pct(&self) -> Option<f64> {
        (self.stock_price > 0.0)
            .then(|| (self.margin_of_safety_value / self.stock_price - 1.0) * 100.0)
    }
}

impl fmt::Display for SummaryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: intrinsic {:.2}, safety {:.2} vs price {:.2} ({})",
            self.symbol,
            self.intrinsic_value,
            self.margin_of_safety_value,
            self.stock_price,
            self.buy_decision
        )
    }
}

/// Summary of a valuation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValuationSummary {
    /// Report year valued.
    pub report_year: i32,

    /// Margin of safety applied.
    pub margin_of_safety: f64,

    /// Valued companies, in run order.
    pub rows: Vec<SummaryRow>,

    /// Symbols removed by a stage.
    pub failures: Vec<FailureRecord>,
}

impl ValuationSummary {
    /// Summarise `run`.
    ///
    /// # Examples
    ///
    /// ```
    /// use intrinsic_output::ValuationSummary;
    /// use intrinsic_valuation::ValuationRun;
    ///
    /// let summary = ValuationSummary::from_run(2020, 0.25, &ValuationRun::default());
    /// assert_eq!(summary.buy_count(), 0);
    /// assert!(summary.to_ascii_table().contains("Valuation Summary: 2020"));
    /// ```
    pub fn from_run(report_year: i32, margin_of_safety: f64, run: &ValuationRun) -> Self {
        let rows = run
            .results
            .iter()
            .map(|r| SummaryRow {
                symbol: r.symbol().to_string(),
                stock_price: r.stock_price(),
                discount_rate: r.discount_rate(),
                intrinsic_value: r.intrinsic_value,
                margin_of_safety_value: r.margin_of_safety_value,
                buy_decision: r.buy_decision,
            })
            .collect();

        Self {
            report_year,
            margin_of_safety,
            rows,
            failures: run.failures.iter().map(FailureRecord::from).collect(),
        }
    }

    /// Number of companies with a buy decision of yes.
    pub fn buy_count(&self) -> usize {
        self.rows.iter().filter(|r| r.buy_decision.is_buy()).count()
    }

    /// Number of symbols requested, valued or not.
    pub fn requested(&self) -> usize {
        self.rows.len() + self.failures.len()
    }

    /// Format as an ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nValuation Summary: {}\n", self.report_year));
        output.push_str(&format!(
            "Margin of Safety: {:.0}%   Valued: {} of {}   Buys: {}\n",
            self.margin_of_safety * 100.0,
            self.rows.len(),
            self.requested(),
            self.buy_count()
        ));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str(&format!(
            "{:<10} {:>12} {:>10} {:>14} {:>14} {:>10} {:>5}\n",
            "Symbol", "Price", "WACC", "Intrinsic", "Safety Value", "Upside", "Buy"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');

        for row in &self.rows {
            let upside = row
                .upside_pct()
                .map_or_else(|| "n/a".to_string(), |u| format!("{u:.1}%"));
            output.push_str(&format!(
                "{:<10} {:>12.2} {:>9.2}% {:>14.2} {:>14.2} {:>10} {:>5}\n",
                row.symbol,
                row.stock_price,
                row.discount_rate * 100.0,
                row.intrinsic_value,
                row.margin_of_safety_value,
                upside,
                row.buy_decision
            ));
        }

        if !self.failures.is_empty() {
            output.push_str("\nFailures:\n");
            output.push_str(&"-".repeat(80));
            output.push('\n');
            for failure in &self.failures {
                output.push_str(&format!(
                    "{:<10} {:<22} {}\n",
                    failure.symbol, failure.stage, failure.reason
                ));
            }
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Valuation Summary: {}\n\n", self.report_year));
        output.push_str(&format!(
            "- **Margin of Safety:** {:.0}%\n",
            self.margin_of_safety * 100.0
        ));
        output.push_str(&format!(
            "- **Valued:** {} of {}\n",
            self.rows.len(),
            self.requested()
        ));
        output.push_str(&format!("- **Buys:** {}\n\n", self.buy_count()));

        if !self.rows.is_empty() {
            output.push_str("## Results\n\n");
            output.push_str("| Symbol | Price | WACC | Intrinsic Value | Safety Value | Buy |\n");
            output.push_str("|--------|-------|------|-----------------|--------------|-----|\n");
            for row in &self.rows {
                output.push_str(&format!(
                    "| {} | {:.2} | {:.2}% | {:.2} | {:.2} | {} |\n",
                    row.symbol,
                    row.stock_price,
                    row.discount_rate * 100.0,
                    row.intrinsic_value,
                    row.margin_of_safety_value,
                    row.buy_decision
                ));
            }
            output.push('\n');
        }

        if !self.failures.is_empty() {
            output.push_str("## Failures\n\n");
            output.push_str("| Symbol | Stage | Reason |\n");
            output.push_str("|--------|-------|--------|\n");
            for failure in &self.failures {
                output.push_str(&format!(
                    "| {} | {} | {} |\n",
                    failure.symbol, failure.stage, failure.reason
                ));
            }
        }

        output
    }
}

impl fmt::Display for ValuationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Valuation Summary: {} ({} valued, {} failed, {} buys)",
            self.report_year,
            self.rows.len(),
            self.failures.len(),
            self.buy_count()
        )?;
        for row in &self.rows {
            writeln!(f, "  {row}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ValuationSummary {
        ValuationSummary {
            report_year: 2020,
            margin_of_safety: 0.25,
            rows: vec![
                SummaryRow {
                    symbol: "AAA".to_string(),
                    stock_price: 100.0,
                    discount_rate: 0.1,
                    intrinsic_value: 180.0,
                    margin_of_safety_value: 135.0,
                    buy_decision: BuyDecision::Yes,
                },
                SummaryRow {
                    symbol: "BBB".to_string(),
                    stock_price: 0.0,
                    discount_rate: 0.08,
                    intrinsic_value: 10.0,
                    margin_of_safety_value: 7.5,
                    buy_decision: BuyDecision::Yes,
                },
                SummaryRow {
                    symbol: "CCC".to_string(),
                    stock_price: 200.0,
                    discount_rate: 0.09,
                    intrinsic_value: 100.0,
                    margin_of_safety_value: 75.0,
                    buy_decision: BuyDecision::No,
                },
            ],
            failures: vec![FailureRecord {
                symbol: "ZERO".to_string(),
                stage: "discount_rate".to_string(),
                kind: "degenerate".to_string(),
                reason: "Degenerate computation for ZERO: total market value of capital is 0"
                    .to_string(),
            }],
        }
    }

    #[test]
    fn test_counts() {
        let summary = summary();
        assert_eq!(summary.buy_count(), 2);
        assert_eq!(summary.requested(), 4);
    }

    #[test]
    fn test_upside() {
        let summary = summary();
        assert!((summary.rows[0].upside_pct().unwrap() - 35.0).abs() < 1e-9);
        assert!(summary.rows[1].upside_pct().is_none());
    }

    #[test]
    fn test_ascii_table() {
        let ascii = summary().to_ascii_table();
        assert!(ascii.contains("Valuation Summary: 2020"));
        assert!(ascii.contains("Valued: 3 of 4"));
        assert!(ascii.contains("AAA"));
        assert!(ascii.contains("35.0%"));
        assert!(ascii.contains("n/a"));
        assert!(ascii.contains("Failures:"));
        assert!(ascii.contains("discount_rate"));
    }

    #[test]
    fn test_markdown() {
        let markdown = summary().to_markdown();
        assert!(markdown.contains("# Valuation Summary: 2020"));
        assert!(markdown.contains("| Symbol | Price |"));
        assert!(markdown.contains("| AAA | 100.00 | 10.00% | 180.00 | 135.00 | Yes |"));
        assert!(markdown.contains("## Failures"));
    }

    #[test]
    fn test_display() {
        let text = summary().to_string();
        assert!(text.starts_with("Valuation Summary: 2020 (3 valued, 1 failed, 2 buys)"));
        assert!(text.contains("CCC: intrinsic 100.00, safety 75.00 vs price 200.00 (No)"));
    }
}
