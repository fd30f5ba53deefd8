//! Statement file loading.
//!
//! A data directory holds one CSV export per statement type and period, named
//! `<statement>-<period>.csv` (for example `income-statement-10Y.csv` and
//! `balance-sheet-statement-10Y.csv`), plus an optional
//! `company-profiles.csv` written by [`crate::fmp::write_profiles_csv`].

use crate::error::{DataError, Result};
use crate::record::{columns, parse_year};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the company profile table inside a data directory.
pub const PROFILES_FILE: &str = "company-profiles.csv";

/// Suffix polars appends to right-hand duplicate columns during joins.
const DUPLICATE_SUFFIX: &str = "_x";

/// Load and merge every statement file for a period.
///
/// Statement files are inner-joined on (`symbol`, `date`), so only periods
/// present in every statement survive. The profile table, when present, is
/// left-joined on `symbol`. Columns duplicated by a join keep the left-hand
/// copy. A `year` column is derived from `date` when the exports lack one.
pub fn combine_statements(dir: impl AsRef<Path>, period: &str) -> Result<DataFrame> {
    let dir = dir.as_ref();
    let statement_paths = statement_files(dir, period)?;

    let mut master: Option<DataFrame> = None;
    for path in &statement_paths {
        let statement = read_csv(path)?;
        debug!(path = %path.display(), rows = statement.height(), "loaded statement file");

        master = Some(match master {
            None => statement,
            Some(merged) => join_frames(
                merged,
                statement,
                &[columns::SYMBOL, columns::DATE],
                JoinType::Inner,
            )?,
        });
    }

    let mut master = master.ok_or_else(|| DataError::MissingData {
        symbol: "batch".to_string(),
        reason: format!(
            "no statement files matching '*-{}.csv' in {}",
            period,
            dir.display()
        ),
    })?;

    let profiles_path = dir.join(PROFILES_FILE);
    if profiles_path.is_file() {
        let profiles = read_csv(&profiles_path)?;
        master = join_frames(master, profiles, &[columns::SYMBOL], JoinType::Left)?;
    }

    let master = with_year_column(master)?;
    info!(
        files = statement_paths.len(),
        rows = master.height(),
        "combined statement files"
    );

    Ok(master)
}

/// Statement files in `dir` whose stem ends with `-{period}`, sorted by name.
fn statement_files(dir: &Path, period: &str) -> Result<Vec<PathBuf>> {
    let suffix = format!("-{}", period);
    let mut paths = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path.extension().is_some_and(|ext| ext == "csv");
        let matches_period = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem.ends_with(&suffix));

        if path.is_file() && is_csv && matches_period {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

fn join_frames(left: DataFrame, right: DataFrame, on: &[&str], how: JoinType) -> Result<DataFrame> {
    let keys: Vec<Expr> = on.iter().map(|name| col(*name)).collect();

    let joined = left
        .lazy()
        .join(
            right.lazy(),
            keys.clone(),
            keys,
            JoinArgs::new(how).with_suffix(Some(DUPLICATE_SUFFIX.into())),
        )
        .collect()?;

    drop_duplicate_columns(joined)
}

fn drop_duplicate_columns(df: DataFrame) -> Result<DataFrame> {
    let keep: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| !name.ends_with(DUPLICATE_SUFFIX))
        .map(|name| name.to_string())
        .collect();

    Ok(df.select(keep)?)
}

fn with_year_column(mut df: DataFrame) -> Result<DataFrame> {
    if df.column(columns::YEAR).is_ok() {
        return Ok(df);
    }

    let date = df
        .column(columns::DATE)
        .map_err(|_| DataError::MissingColumn(columns::DATE.to_string()))?
        .cast(&DataType::String)?;
    let years: Vec<Option<i32>> = date
        .str()?
        .into_iter()
        .map(|d| d.and_then(parse_year))
        .collect();

    df.with_column(Series::new(columns::YEAR.into(), years))?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_duplicate_columns() {
        let df = df![
            "symbol" => ["AAPL"],
            "price" => [1.0],
            "price_x" => [2.0],
        ]
        .unwrap();

        let cleaned = drop_duplicate_columns(df).unwrap();
        let names: Vec<String> = cleaned
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["symbol".to_string(), "price".to_string()]);
    }

    #[test]
    fn test_year_column_added_from_date() {
        let df = df![
            "symbol" => ["AAPL", "MSFT"],
            "date" => ["2020-09-26", "2020-06-30"],
        ]
        .unwrap();

        let df = with_year_column(df).unwrap();
        let years: Vec<Option<i32>> = df.column("year").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(years, vec![Some(2020), Some(2020)]);
    }

    #[test]
    fn test_existing_year_column_kept() {
        let df = df![
            "symbol" => ["AAPL"],
            "year" => [2018],
        ]
        .unwrap();

        let df = with_year_column(df).unwrap();
        assert_eq!(df.width(), 2);
    }
}
