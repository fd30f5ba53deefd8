//! DataFrame helpers for the statistics and screening commands.

use intrinsic_screen::{ScreenCriteria, Statistic};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Write `df` as CSV with a header row.
pub(crate) fn write_csv(df: &mut DataFrame, path: &Path) -> PolarsResult<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)
}

/// Statement columns a criteria file refers to.
///
/// Criteria name statistic columns such as `5Y roe mean`; the statement column
/// is the name between the window prefix and the statistic suffix. Criteria
/// that do not follow that pattern are skipped.
pub(crate) fn criteria_columns(
    criteria: &ScreenCriteria,
    eval_period: u32,
    statistic: Statistic,
) -> Vec<String> {
    let prefix = format!("{eval_period}Y ");
    let suffix = format!(" {statistic}");

    let mut columns: Vec<String> = criteria
        .columns()
        .filter_map(|name| name.strip_prefix(prefix.as_str())?.strip_suffix(suffix.as_str()))
        .map(str::to_string)
        .collect();
    columns.dedup();
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use intrinsic_screen::Bounds;

    #[test]
    fn test_criteria_columns() {
        let criteria = ScreenCriteria::new()
            .with("5Y roe mean", Bounds::above(0.1))
            .with("5Y currentRatio mean", Bounds::new(1.0, 10.0))
            .with("10Y eps mean", Bounds::above(0.0))
            .with("5Y eps median", Bounds::above(0.0));

        let columns = criteria_columns(&criteria, 5, Statistic::Mean);
        assert_eq!(columns, vec!["currentRatio", "roe"]);
    }

    #[test]
    fn test_percent_change_suffix() {
        let criteria = ScreenCriteria::new().with("3Y eps % change", Bounds::above(0.05));
        assert_eq!(criteria_columns(&criteria, 3, Statistic::PercentChange), vec!["eps"]);
    }

    #[test]
    fn test_write_csv() {
        let mut df = df![
            "symbol" => ["AAA"],
            "5Y roe mean" => [0.2],
        ]
        .unwrap();

        let path = std::env::temp_dir().join("intrinsic_frames_test.csv");
        write_csv(&mut df, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("symbol,5Y roe mean"));

        std::fs::remove_file(path).ok();
    }
}
