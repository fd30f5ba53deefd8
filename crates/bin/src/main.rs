//! Intrinsic CLI binary.
//!
//! Provides the command-line interface for fundamental screening and
//! discounted cash flow valuation.

mod integration;

use clap::{Parser, Subcommand};
use integration::data_dir::{print_data_info, resolve};
use integration::fetch::{api_key, fetch_profiles};
use integration::frames::{criteria_columns, write_csv};
use intrinsic::universe::DEFAULT_MIN_PRICE;
use intrinsic_data::combine_statements;
use intrinsic_data::fmp::FetchConfig;
use intrinsic_output::{ExportFormat, Exporter, FailureRecord, Report, ValuationRecord, ValuationSummary};
use intrinsic_screen::{
    PERFORMANCE_METRICS, ScreenCriteria, Statistic, calculate_stats, metric_info,
    performance_history, screen_stocks,
};
use intrinsic_valuation::{GrowthAssumptions, ValuationConfig, ValuationPipeline};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Default statement period suffix of the data files.
const DEFAULT_PERIOD: &str = "10Y";

#[derive(Parser)]
#[command(name = "intrinsic")]
#[command(about = "Intrinsic: fundamental screening and DCF valuation", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding statement and profile files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Statement period suffix of the data files
    #[arg(long, global = true, default_value = DEFAULT_PERIOD)]
    period: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download company profiles for major-exchange listings
    Fetch {
        /// Provider API key (defaults to FMP_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Minimum share price
        #[arg(long, default_value_t = DEFAULT_MIN_PRICE)]
        min_price: f64,

        /// Maximum in-flight profile requests
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// Summarise statement columns over an evaluation window
    Stats {
        /// Report year
        #[arg(long)]
        year: i32,

        /// Evaluation window in years
        #[arg(long, default_value = "5")]
        eval_period: u32,

        /// Statistic: mean, median or change
        #[arg(long, default_value = "mean")]
        statistic: String,

        /// Statement columns to summarise
        #[arg(long, num_args = 1.., required = true)]
        columns: Vec<String>,

        /// Write the statistics to a CSV file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Screen companies against statistic thresholds
    Screen {
        /// Criteria JSON file mapping statistic columns to [min, max]
        criteria: PathBuf,

        /// Report year
        #[arg(long)]
        year: i32,

        /// Evaluation window in years
        #[arg(long, default_value = "5")]
        eval_period: u32,

        /// Statistic: mean, median or change
        #[arg(long, default_value = "mean")]
        statistic: String,
    },

    /// Show performance metric history for a company
    Performance {
        /// Stock symbol
        symbol: String,

        /// Report year
        #[arg(long)]
        year: i32,

        /// Evaluation window in years
        #[arg(long, default_value = "10")]
        eval_period: u32,

        /// Metric to show (default: all)
        #[arg(long)]
        metric: Option<String>,
    },

    /// Run the DCF valuation pipeline
    Value {
        /// Stock symbols (default: every symbol with a growth assumption)
        symbols: Vec<String>,

        /// Valuation config JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Report year (overrides the config file)
        #[arg(long)]
        year: Option<i32>,

        /// Margin of safety (overrides the config file)
        #[arg(long)]
        margin: Option<f64>,

        /// Growth assumption as SYMBOL=RATE (repeatable)
        #[arg(long = "growth")]
        growth: Vec<String>,

        /// Growth assumptions JSON file
        #[arg(long)]
        growth_file: Option<PathBuf>,

        /// Export results (format from the extension: .csv or .json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Export the projection schedule
        #[arg(long)]
        schedule: Option<PathBuf>,

        /// Export failed symbols
        #[arg(long)]
        failures: Option<PathBuf>,

        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the summary as markdown
        #[arg(long)]
        markdown: bool,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("intrinsic=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let data_dir = resolve(cli.data_dir.as_deref());

    match cli.command {
        Commands::Fetch {
            api_key: key,
            min_price,
            concurrency,
        } => {
            let config = FetchConfig {
                concurrency,
                ..Default::default()
            };
            print_data_info(&data_dir);
            let path = fetch_profiles(api_key(key)?, &config, min_price, &data_dir).await?;
            println!("Wrote {}", path.display());
        }
        Commands::Stats {
            year,
            eval_period,
            statistic,
            columns,
            output,
        } => {
            let statistic: Statistic = statistic.parse()?;
            let master = combine_statements(&data_dir, &cli.period)?;
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            let mut stats = calculate_stats(&master, statistic, year, eval_period, &columns)?;

            match output {
                Some(path) => {
                    write_csv(&mut stats, &path)?;
                    println!("Wrote {} rows to {}", stats.height(), path.display());
                }
                None => println!("{}", stats),
            }
        }
        Commands::Screen {
            criteria,
            year,
            eval_period,
            statistic,
        } => {
            let statistic: Statistic = statistic.parse()?;
            screen(&data_dir, &cli.period, &criteria, year, eval_period, statistic)?;
        }
        Commands::Performance {
            symbol,
            year,
            eval_period,
            metric,
        } => {
            performance(&data_dir, &cli.period, &symbol, year, eval_period, metric.as_deref())?;
        }
        Commands::Value {
            symbols,
            config,
            year,
            margin,
            growth,
            growth_file,
            output,
            schedule,
            failures,
            report,
            markdown,
        } => {
            let config = valuation_config(config.as_deref(), year, margin)?;
            let mut assumptions = match growth_file {
                Some(path) => GrowthAssumptions::from_file(path)?,
                None => GrowthAssumptions::new(),
            };
            assumptions.extend(GrowthAssumptions::from_pairs(&growth)?);

            let symbols: Vec<String> = if symbols.is_empty() {
                assumptions.symbols()
            } else {
                symbols.iter().map(|s| s.trim().to_uppercase()).collect()
            };
            if symbols.is_empty() {
                return Err("no symbols: pass symbols or growth assumptions".into());
            }

            let outputs = ValueOutputs {
                output,
                schedule,
                failures,
                report,
                markdown,
            };
            value(&data_dir, &cli.period, config, assumptions, &symbols, &outputs)?;
        }
    }

    Ok(())
}

/// Config file (or defaults for the report year) with command-line overrides.
fn valuation_config(
    path: Option<&Path>,
    year: Option<i32>,
    margin: Option<f64>,
) -> Result<ValuationConfig, Box<dyn std::error::Error>> {
    let mut config = match (path, year) {
        (Some(path), _) => ValuationConfig::from_file(path)?,
        (None, Some(year)) => ValuationConfig::new(year),
        (None, None) => return Err("pass --year or --config".into()),
    };

    if let Some(year) = year {
        config.report_year = year;
    }
    if let Some(margin) = margin {
        config.margin_of_safety = margin;
    }
    config.validate()?;

    debug!(?config, "valuation config");
    Ok(config)
}

fn screen(
    data_dir: &Path,
    period: &str,
    criteria_path: &Path,
    year: i32,
    eval_period: u32,
    statistic: Statistic,
) -> Result<(), Box<dyn std::error::Error>> {
    let criteria = ScreenCriteria::from_file(criteria_path)?;
    let columns = criteria_columns(&criteria, eval_period, statistic);
    if columns.is_empty() {
        return Err(format!(
            "no criteria name a {}Y {} column",
            eval_period, statistic
        )
        .into());
    }

    let master = combine_statements(data_dir, period)?;
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    let stats = calculate_stats(&master, statistic, year, eval_period, &columns)?;
    let passed = screen_stocks(&stats, &criteria)?;

    info!(candidates = stats.height(), passed = passed.len(), "screen complete");
    println!("\n{} of {} companies passed the screen\n", passed.len(), stats.height());
    for symbol in &passed {
        println!("  {}", symbol);
    }

    Ok(())
}

fn performance(
    data_dir: &Path,
    period: &str,
    symbol: &str,
    year: i32,
    eval_period: u32,
    metric: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let symbol = symbol.trim().to_uppercase();
    let metrics: Vec<_> = match metric {
        Some(name) => vec![metric_info(name).ok_or_else(|| format!("unknown metric '{}'", name))?],
        None => PERFORMANCE_METRICS.iter().collect(),
    };

    let master = combine_statements(data_dir, period)?;
    let history = performance_history(&master, year, eval_period)?
        .lazy()
        .filter(col("symbol").eq(lit(symbol.as_str())))
        .collect()?;
    if history.height() == 0 {
        return Err(format!("no statement rows for {} since {}", symbol, year - eval_period as i32).into());
    }

    println!("\n{} performance since {}\n", symbol, year - eval_period as i32);
    for metric in metrics {
        println!("{}: {}", metric.name, metric.guidance);
        let values = history
            .clone()
            .lazy()
            .select([col("year"), col(metric.name)])
            .collect()?;
        println!("{}\n", values);
    }

    Ok(())
}

/// Where `value` writes its artifacts.
struct ValueOutputs {
    output: Option<PathBuf>,
    schedule: Option<PathBuf>,
    failures: Option<PathBuf>,
    report: Option<PathBuf>,
    markdown: bool,
}

fn value(
    data_dir: &Path,
    period: &str,
    config: ValuationConfig,
    growth: GrowthAssumptions,
    symbols: &[String],
    outputs: &ValueOutputs,
) -> Result<(), Box<dyn std::error::Error>> {
    print_data_info(data_dir);
    let master = combine_statements(data_dir, period)?;

    let pipeline = ValuationPipeline::new(config.clone(), growth)?;
    let run = pipeline.run_frame(&master, symbols)?;

    let summary = ValuationSummary::from_run(config.report_year, config.margin_of_safety, &run);
    if outputs.markdown {
        println!("{}", summary.to_markdown());
    } else {
        println!("{}", summary.to_ascii_table());
    }

    if let Some(path) = &outputs.output {
        let records: Vec<ValuationRecord> = run.results.iter().map(ValuationRecord::from).collect();
        records.export_to_file(path, ExportFormat::from_path(path)?)?;
        println!("Wrote {} results to {}", records.len(), path.display());
    }
    if let Some(path) = &outputs.schedule {
        let schedule: Vec<_> = run.projection_schedule().cloned().collect();
        schedule.export_to_file(path, ExportFormat::from_path(path)?)?;
        println!("Wrote {} projected years to {}", schedule.len(), path.display());
    }
    if let Some(path) = &outputs.failures {
        let failures: Vec<FailureRecord> = run.failures.iter().map(FailureRecord::from).collect();
        failures.export_to_file(path, ExportFormat::from_path(path)?)?;
        println!("Wrote {} failures to {}", failures.len(), path.display());
    }
    if let Some(path) = &outputs.report {
        Report::for_run(config, &run)?.write_to_file(path)?;
        println!("Wrote report to {}", path.display());
    }

    Ok(())
}
