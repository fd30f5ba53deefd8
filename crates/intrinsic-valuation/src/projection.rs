//! Free cash flow projection.
//!
//! Each company's free cash flow is grown at its assumed rate and discounted
//! at its WACC over the projection window:
//!
//! ```text
//! projected(t)  = FCF * (1 + g)^t
//! factor(t)     = 1 / (1 + r)^t
//! discounted(t) = projected(t) * factor(t)
//! ```
//!
//! The schedule is built for `t = 0..=window` and year zero (the base year)
//! is dropped. Every schedule value is rounded to cents, and the present
//! value is the sum of the rounded discounted values.

use crate::config::MAX_PROJECTION_WINDOW;
use crate::discount::DiscountedRow;
use crate::error::{Result, ValuationError};
use crate::growth::GrowthAssumptions;
use crate::round::round2;
use crate::stage::{StageKind, StageOutcome, SymbolRow, ValuationStage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One projected year of one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedYear {
    /// Ticker symbol
    pub symbol: String,
    /// Years after the report year, starting at 1
    pub offset: u32,
    /// Projected free cash flow
    pub projected_fcf: f64,
    /// Discount factor
    pub discount_factor: f64,
    /// Discounted free cash flow
    pub discounted_fcf: f64,
}

/// Aggregated projection of one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowProjection {
    /// Per-year schedule, offsets 1 through the window
    pub years: Vec<ProjectedYear>,
    /// Sum of discounted free cash flows
    pub present_value: f64,
    /// Projected free cash flow of the final year
    pub last_projected_fcf: f64,
    /// Discount factor of the final year
    pub last_discount_factor: f64,
}

impl CashFlowProjection {
    /// Aggregate one company's schedule.
    ///
    /// Returns `None` for an empty schedule.
    pub fn from_years(years: Vec<ProjectedYear>) -> Option<Self> {
        let last = years.last()?;
        let last_projected_fcf = last.projected_fcf;
        let last_discount_factor = last.discount_factor;
        let present_value = round2(years.iter().map(|y| y.discounted_fcf).sum());

        Some(Self {
            years,
            present_value,
            last_projected_fcf,
            last_discount_factor,
        })
    }
}

/// Discounted row with its growth assumption and projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedRow {
    /// Row from the discount rate stage
    pub base: DiscountedRow,
    /// Assumed free cash flow growth rate
    pub growth_rate: f64,
    /// Projection over the window
    pub projection: CashFlowProjection,
}

impl SymbolRow for ProjectedRow {
    fn symbol(&self) -> &str {
        self.base.symbol()
    }
}

/// Projects and discounts free cash flow over a fixed window.
#[derive(Debug, Clone)]
pub struct CashFlowProjector {
    window: u32,
    growth: GrowthAssumptions,
}

impl CashFlowProjector {
    /// Projector over `window` years using per-symbol growth assumptions.
    pub const fn new(window: u32, growth: GrowthAssumptions) -> Self {
        Self { window, growth }
    }

    /// Projection window in years
    pub const fn window(&self) -> u32 {
        self.window
    }

    /// Schedule for `t = 0..=window` with the base year dropped.
    pub fn schedule(&self, row: &DiscountedRow, growth_rate: f64) -> Result<Vec<ProjectedYear>> {
        let symbol = row.symbol();
        let fcf = row.input.free_cash_flow;
        let rate = row.discount_rate();

        if rate <= -1.0 {
            return Err(ValuationError::degenerate(
                symbol,
                format!("discount rate {rate} leaves no positive discount base"),
            ));
        }

        let window = i32::try_from(self.window).map_err(|_| {
            ValuationError::degenerate(symbol, format!("projection window {} is too long", self.window))
        })?;

        let years: Vec<ProjectedYear> = (0..=window)
            .map(|t| {
                let projected = fcf * (1.0 + growth_rate).powi(t);
                let factor = 1.0 / (1.0 + rate).powi(t);
                ProjectedYear {
                    symbol: symbol.to_string(),
                    offset: t.unsigned_abs(),
                    projected_fcf: round2(projected),
                    discount_factor: round2(factor),
                    discounted_fcf: round2(projected * factor),
                }
            })
            .filter(|year| year.offset > 0)
            .collect();

        if let Some(year) = years.iter().find(|y| {
            !(y.projected_fcf.is_finite() && y.discounted_fcf.is_finite())
        }) {
            return Err(ValuationError::degenerate(
                symbol,
                format!("projection overflows in year {}", year.offset),
            ));
        }

        Ok(years)
    }

    fn project(&self, row: DiscountedRow, growth_rate: f64, years: Vec<ProjectedYear>) -> Result<ProjectedRow> {
        let projection = CashFlowProjection::from_years(years).ok_or_else(|| {
            ValuationError::degenerate(row.symbol(), "empty projection window")
        })?;
        Ok(ProjectedRow {
            base: row,
            growth_rate,
            projection,
        })
    }
}

impl ValuationStage for CashFlowProjector {
    type Input = DiscountedRow;
    type Output = ProjectedRow;

    fn kind(&self) -> StageKind {
        StageKind::CashFlowProjection
    }

    fn evaluate(&self, row: DiscountedRow) -> Result<ProjectedRow> {
        let growth_rate = self.growth.get(row.symbol())?;
        let years = self.schedule(&row, growth_rate)?;
        self.project(row, growth_rate, years)
    }

    /// Builds the schedule of every company as one ordered sequence, then
    /// aggregates it per company.
    fn evaluate_all(&self, rows: Vec<DiscountedRow>) -> StageOutcome<ProjectedRow> {
        let kind = self.kind();
        let mut outcome = StageOutcome::default();

        let mut accepted = Vec::with_capacity(rows.len());
        let per_row = self.window.min(MAX_PROJECTION_WINDOW) as usize;
        let mut schedule = Vec::with_capacity(rows.len().saturating_mul(per_row));
        for row in rows {
            let scheduled = self
                .growth
                .get(row.symbol())
                .and_then(|g| self.schedule(&row, g).map(|years| (g, years)));
            match scheduled {
                Ok((growth_rate, years)) => {
                    schedule.extend(years);
                    accepted.push((row, growth_rate));
                }
                Err(e) => {
                    let symbol = row.symbol().to_string();
                    outcome.fail(&symbol, kind, e);
                }
            }
        }

        debug!(
            companies = accepted.len(),
            rows = schedule.len(),
            "built projection schedule"
        );

        let mut schedule = schedule.into_iter();
        for (row, growth_rate) in accepted {
            let years: Vec<ProjectedYear> = schedule.by_ref().take(self.window as usize).collect();
            let symbol = row.symbol().to_string();
            match self.project(row, growth_rate, years) {
                Ok(projected) => outcome.rows.push(projected),
                Err(e) => outcome.fail(&symbol, kind, e),
            }
        }

        outcome
    }
}
