//! Export of valuation runs.
//!
//! CSV and JSON export for valuation results, projection schedules and
//! per-symbol failures.

use intrinsic_valuation::{ProjectedYear, SymbolFailure, ValuationError, ValuationResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Format implied by a file path's extension.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| ExportError::InvalidFormat(format!("{} has no extension", path.display())))?
            .parse()
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty" | "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Flat record of one valuation result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValuationRecord {
    /// Ticker symbol.
    pub symbol: String,

    /// Report year.
    pub year: i32,

    /// Share price in the report year.
    pub stock_price: f64,

    /// Free cash flow in the report year.
    pub free_cash_flow: f64,

    /// Highest effective tax rate in the lookback window.
    pub max_tax_rate: f64,

    /// Highest interest rate in the lookback window.
    pub max_interest_rate: f64,

    /// Discount rate (WACC).
    pub discount_rate: f64,

    /// Assumed free cash flow growth rate.
    pub growth_rate: f64,

    /// Present value of the discounted free cash flows.
    pub present_value: f64,

    /// Final-year projected free cash flow.
    pub last_projected_fcf: f64,

    /// Final-year discount factor.
    pub last_discount_factor: f64,

    /// Long-term growth rate.
    pub long_term_growth_rate: f64,

    /// Terminal value.
    pub terminal_value: f64,

    /// Intrinsic value per share.
    pub intrinsic_value: f64,

    /// Intrinsic value after the margin of safety.
    pub margin_of_safety_value: f64,

    /// "Yes" or "No".
    pub buy_decision: String,
}

impl From<&ValuationResult> for ValuationRecord {
    fn from(result: &ValuationResult) -> Self {
        Self {
            symbol: result.symbol().to_string(),
            year: result.year(),
            stock_price: result.stock_price(),
            free_cash_flow: result.input.free_cash_flow,
            max_tax_rate: result.input.max_tax_rate,
            max_interest_rate: result.input.max_interest_rate,
            discount_rate: result.discount_rate(),
            growth_rate: result.growth_rate,
            present_value: result.present_value(),
            last_projected_fcf: result.projection.last_projected_fcf,
            last_discount_factor: result.projection.last_discount_factor,
            long_term_growth_rate: result.long_term_growth_rate,
            terminal_value: result.terminal_value,
            intrinsic_value: result.intrinsic_value,
            margin_of_safety_value: result.margin_of_safety_value,
            buy_decision: result.buy_decision.to_string(),
        }
    }
}

/// Flat record of a symbol removed from a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureRecord {
    /// Ticker symbol.
    pub symbol: String,

    /// Stage that rejected the symbol.
    pub stage: String,

    /// Error category: missing_data, degenerate or other.
    pub kind: String,

    /// Error message.
    pub reason: String,
}

impl From<&SymbolFailure> for FailureRecord {
    fn from(failure: &SymbolFailure) -> Self {
        let kind = match failure.error {
            ValuationError::MissingData { .. } => "missing_data",
            ValuationError::DegenerateComputation { .. } => "degenerate",
            _ => "other",
        };
        Self {
            symbol: failure.symbol.clone(),
            stage: failure.stage.to_string(),
            kind: kind.to_string(),
            reason: failure.error.to_string(),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Serialize flat records, one CSV row or JSON array element each.
fn records_to_string<T: Serialize>(records: &[T], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            for record in records {
                wtr.serialize(record)?;
            }
            let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
            String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
        }
        ExportFormat::Json => Ok(serde_json::to_string(records)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(records)?),
    }
}

impl Exporter for ValuationRecord {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => records_to_string(std::slice::from_ref(self), format),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<ValuationRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}

impl Exporter for Vec<ProjectedYear> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}

impl Exporter for Vec<FailureRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        records_to_string(self, format)
    }
}
