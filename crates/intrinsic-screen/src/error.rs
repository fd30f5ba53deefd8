//! Screening error types.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while computing statistics or screening.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// A required column is absent from the input table
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Screening bounds that no value can satisfy
    #[error("Invalid bounds for {column}: min {min} must be below max {max}")]
    InvalidBounds {
        /// Column the bounds apply to
        column: String,
        /// Exclusive lower bound
        min: f64,
        /// Exclusive upper bound
        max: f64,
    },

    /// Unrecognised statistic name
    #[error("Unknown statistic: {0} (expected mean, median or change)")]
    UnknownStatistic(String),

    /// Invalid screening criteria file
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    /// DataFrame operation error
    #[error("DataFrame error: {0}")]
    Polars(#[from] PolarsError),
}

/// Result type for screening operations
pub type Result<T> = std::result::Result<T, ScreenError>;

/// Fail with [`ScreenError::MissingColumn`] for the first absent column.
pub(crate) fn require_columns<'a, I>(schema_names: &[String], required: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    for name in required {
        if !schema_names.iter().any(|n| n == name) {
            return Err(ScreenError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}
