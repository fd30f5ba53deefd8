//! Run configuration.

use crate::error::{Result, ValuationError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default risk-free rate (10-year treasury yield).
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.0069;

/// Default market risk premium.
pub const DEFAULT_MARKET_RISK_PREMIUM: f64 = 0.06;

/// Default long-term growth rate used for the terminal value.
pub const DEFAULT_GDP_GROWTH_RATE: f64 = 0.029;

/// Default margin of safety.
pub const DEFAULT_MARGIN_OF_SAFETY: f64 = 0.25;

/// Default number of years before the report year searched for rate maxima.
pub const DEFAULT_LOOKBACK_YEARS: u32 = 5;

/// Default number of projected years.
pub const DEFAULT_PROJECTION_WINDOW: u32 = 10;

/// Longest accepted lookback window.
pub const MAX_LOOKBACK_YEARS: u32 = 100;

/// Longest accepted projection window.
pub const MAX_PROJECTION_WINDOW: u32 = 100;

/// Parameters of one valuation run.
///
/// Only `report_year` is required when loading from JSON; every other field
/// falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Fiscal year whose figures are valued
    pub report_year: i32,

    /// Years before the report year searched for the maximum tax and
    /// interest rates (default: 5)
    #[serde(default = "defaults::lookback_years")]
    pub lookback_years: u32,

    /// Number of projected years (default: 10)
    #[serde(default = "defaults::projection_window")]
    pub projection_window: u32,

    /// Risk-free rate (default: 0.0069)
    #[serde(default = "defaults::risk_free_rate")]
    pub risk_free_rate: f64,

    /// Market risk premium (default: 0.06)
    #[serde(default = "defaults::market_risk_premium")]
    pub market_risk_premium: f64,

    /// Long-term growth rate for the terminal value (default: 0.029)
    #[serde(default = "defaults::gdp_growth_rate")]
    pub gdp_growth_rate: f64,

    /// Discount applied to intrinsic value before comparing with the price
    /// (default: 0.25)
    #[serde(default = "defaults::margin_of_safety")]
    pub margin_of_safety: f64,
}

mod defaults {
    pub(super) const fn lookback_years() -> u32 {
        super::DEFAULT_LOOKBACK_YEARS
    }

    pub(super) const fn projection_window() -> u32 {
        super::DEFAULT_PROJECTION_WINDOW
    }

    pub(super) const fn risk_free_rate() -> f64 {
        super::DEFAULT_RISK_FREE_RATE
    }

    pub(super) const fn market_risk_premium() -> f64 {
        super::DEFAULT_MARKET_RISK_PREMIUM
    }

    pub(super) const fn gdp_growth_rate() -> f64 {
        super::DEFAULT_GDP_GROWTH_RATE
    }

    pub(super) const fn margin_of_safety() -> f64 {
        super::DEFAULT_MARGIN_OF_SAFETY
    }
}

impl ValuationConfig {
    /// Configuration for `report_year` with default rates and windows.
    pub const fn new(report_year: i32) -> Self {
        Self {
            report_year,
            lookback_years: DEFAULT_LOOKBACK_YEARS,
            projection_window: DEFAULT_PROJECTION_WINDOW,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            market_risk_premium: DEFAULT_MARKET_RISK_PREMIUM,
            gdp_growth_rate: DEFAULT_GDP_GROWTH_RATE,
            margin_of_safety: DEFAULT_MARGIN_OF_SAFETY,
        }
    }

    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ValuationError::Configuration(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ValuationError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// First year whose rates count towards the historical maxima.
    pub fn lookback_start(&self) -> i32 {
        crate::inputs::window_start(self.report_year, self.lookback_years)
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if self.report_year <= 0 {
            return Err(ValuationError::Configuration(format!(
                "report year must be positive, got {}",
                self.report_year
            )));
        }
        if self.projection_window == 0 {
            return Err(ValuationError::Configuration(
                "projection window must be at least one year".to_string(),
            ));
        }
        if self.projection_window > MAX_PROJECTION_WINDOW {
            return Err(ValuationError::Configuration(format!(
                "projection window must be at most {MAX_PROJECTION_WINDOW} years, got {}",
                self.projection_window
            )));
        }
        if self.lookback_years > MAX_LOOKBACK_YEARS {
            return Err(ValuationError::Configuration(format!(
                "lookback must be at most {MAX_LOOKBACK_YEARS} years, got {}",
                self.lookback_years
            )));
        }

        let rates = [
            ("risk_free_rate", self.risk_free_rate),
            ("market_risk_premium", self.market_risk_premium),
            ("gdp_growth_rate", self.gdp_growth_rate),
            ("margin_of_safety", self.margin_of_safety),
        ];
        for (name, value) in rates {
            if !value.is_finite() {
                return Err(ValuationError::Configuration(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }

        if !(0.0..1.0).contains(&self.margin_of_safety) {
            return Err(ValuationError::Configuration(format!(
                "margin_of_safety must be in [0, 1), got {}",
                self.margin_of_safety
            )));
        }

        Ok(())
    }
}
