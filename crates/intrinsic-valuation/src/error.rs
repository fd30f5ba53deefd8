//! Valuation error types.

use intrinsic_data::DataError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while valuing a batch of companies.
#[derive(Debug, Error)]
pub enum ValuationError {
    /// A required input is absent for a symbol
    #[error("Missing data for {symbol}: {reason}")]
    MissingData {
        /// Symbol the input belongs to
        symbol: String,
        /// What is missing
        reason: String,
    },

    /// A formula has no finite answer for a symbol
    #[error("Degenerate computation for {symbol}: {reason}")]
    DegenerateComputation {
        /// Symbol being valued
        symbol: String,
        /// Which formula broke and why
        reason: String,
    },

    /// Invalid run configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error converting financial history
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// DataFrame operation error
    #[error("DataFrame error: {0}")]
    Polars(#[from] PolarsError),
}

impl ValuationError {
    /// Missing input for `symbol`.
    pub fn missing(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MissingData {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Formula without a finite answer for `symbol`.
    pub fn degenerate(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DegenerateComputation {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error concerns a single symbol rather than the whole run.
    pub const fn is_per_symbol(&self) -> bool {
        matches!(
            self,
            Self::MissingData { .. } | Self::DegenerateComputation { .. }
        )
    }
}

/// Result type for valuation operations
pub type Result<T> = std::result::Result<T, ValuationError>;
