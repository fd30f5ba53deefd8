//! Integration tests for exporting and summarising valuation runs.

use approx::assert_relative_eq;
use intrinsic_data::{CompanyFinancialRecord, FinancialHistory};
use intrinsic_output::{
    ExportFormat, Exporter, FailureRecord, Report, ValuationRecord, ValuationSummary,
};
use intrinsic_valuation::{
    GrowthAssumptions, ProjectedYear, ValuationConfig, ValuationPipeline, ValuationRun,
};

fn company(symbol: &str, price: f64) -> CompanyFinancialRecord {
    CompanyFinancialRecord {
        free_cash_flow: Some(1000.0),
        market_cap: Some(1000.0),
        beta: Some(1.5),
        cash_and_equivalents: Some(500.0),
        total_liabilities: Some(2000.0),
        number_of_shares: Some(100.0),
        stock_price: Some(price),
        effective_tax_rate: Some(0.2),
        ..CompanyFinancialRecord::new(symbol, 2020)
    }
}

fn config() -> ValuationConfig {
    ValuationConfig {
        projection_window: 3,
        risk_free_rate: 0.01,
        market_risk_premium: 0.06,
        ..ValuationConfig::new(2020)
    }
}

fn run() -> ValuationRun {
    let mut no_shares = company("NOSH", 10.0);
    no_shares.number_of_shares = Some(0.0);

    let history = FinancialHistory::new(vec![
        company("AAA", 150.0),
        company("CHEAP", 50.0),
        no_shares,
    ]);
    let growth = GrowthAssumptions::from_pairs(["AAA=0.05", "CHEAP=0.05", "NOSH=0.05"]).unwrap();

    ValuationPipeline::new(config(), growth)
        .unwrap()
        .run(&history, &["AAA", "CHEAP", "NOSH", "GONE"].map(String::from))
}

#[test]
fn test_full_export_workflow() {
    let run = run();
    assert_eq!(run.results.len(), 2);
    assert_eq!(run.failures.len(), 2);

    let records: Vec<ValuationRecord> = run.results.iter().map(ValuationRecord::from).collect();
    assert_relative_eq!(records[0].present_value, 2735.45, epsilon = 1e-9);

    let csv = records.export_to_string(ExportFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("CHEAP"));

    let schedule: Vec<ProjectedYear> = run.projection_schedule().cloned().collect();
    let json = schedule.export_to_string(ExportFormat::Json).unwrap();
    let parsed: Vec<ProjectedYear> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.len(), 6);

    let failures: Vec<FailureRecord> = run.failures.iter().map(FailureRecord::from).collect();
    let stages: Vec<&str> = failures.iter().map(|f| f.stage.as_str()).collect();
    assert_eq!(stages, vec!["input_assembly", "intrinsic_value"]);
    assert!(failures.iter().any(|f| f.symbol == "GONE" && f.kind == "missing_data"));
}

#[test]
fn test_full_summary_workflow() {
    let run = run();
    let summary = ValuationSummary::from_run(2020, 0.25, &run);

    assert_eq!(summary.buy_count(), 1);
    assert_eq!(summary.requested(), 4);

    let ascii = summary.to_ascii_table();
    assert!(ascii.contains("CHEAP"));
    assert!(ascii.contains("GONE"));

    let markdown = summary.to_markdown();
    assert!(markdown.contains("## Results"));
    assert!(markdown.contains("| CHEAP |"));
}

#[test]
fn test_report_round_trip() {
    let run = run();
    let report = Report::for_run(config(), &run).unwrap();
    let json = report.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["config"]["projection_window"], 3);
    assert_eq!(value["contents"]["results"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["contents"]["dropped"][0], "GONE");
}
