//! Report generation for valuation runs.

use crate::export::{FailureRecord, ValuationRecord};
use chrono::{DateTime, Utc};
use intrinsic_valuation::{ValuationConfig, ValuationRun};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required field was not set on the builder.
    #[error("Missing report field: {0}")]
    MissingField(&'static str),
}

/// A timestamped record of a valuation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report title.
    pub title: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Configuration the run used.
    pub config: ValuationConfig,

    /// Report contents (JSON format).
    pub contents: serde_json::Value,
}

impl Report {
    /// Create a new report.
    pub fn new(title: String, config: ValuationConfig, contents: serde_json::Value) -> Self {
        Self {
            title,
            timestamp: Utc::now(),
            config,
            contents,
        }
    }

    /// Report of a run: its results and failures.
    pub fn for_run(config: ValuationConfig, run: &ValuationRun) -> Result<Self, ReportError> {
        let results: Vec<ValuationRecord> = run.results.iter().map(ValuationRecord::from).collect();
        let failures: Vec<FailureRecord> = run.failures.iter().map(FailureRecord::from).collect();

        ReportBuilder::new()
            .title(format!("Intrinsic value {}", config.report_year))
            .config(config)
            .contents(serde_json::json!({
                "results": results,
                "failures": failures,
                "dropped": run.dropped,
            }))
            .build()
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report to `path`.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ReportError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    title: Option<String>,
    config: Option<ValuationConfig>,
    contents: Option<serde_json::Value>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the run configuration.
    pub const fn config(mut self, config: ValuationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the report contents.
    pub fn contents(mut self, contents: serde_json::Value) -> Self {
        self.contents = Some(contents);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        let config = self.config.ok_or(ReportError::MissingField("config"))?;
        let title = self
            .title
            .unwrap_or_else(|| format!("Intrinsic value {}", config.report_year));

        Ok(Report::new(
            title,
            config,
            self.contents.unwrap_or(serde_json::Value::Null),
        ))
    }
}
