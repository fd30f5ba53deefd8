//! Company profile download.
//!
//! Narrows the provider's stock list to major-exchange listings above a
//! minimum price, then fetches a profile per listing with a progress bar.

use indicatif::{ProgressBar, ProgressStyle};
use intrinsic::universe::{ListedUniverse, Universe};
use intrinsic_data::DataError;
use intrinsic_data::fmp::{CompanyProfile, FetchConfig, FmpClient};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable holding the provider API key.
pub(crate) const API_KEY_ENV: &str = "FMP_API_KEY";

/// Error type for profile downloads.
#[derive(Debug, thiserror::Error)]
pub(crate) enum FetchError {
    /// No API key on the command line or in the environment.
    #[error("no API key: pass --api-key or set {API_KEY_ENV}")]
    MissingApiKey,
    /// Provider or file error.
    #[error("Data fetch error: {0}")]
    Data(#[from] DataError),
}

/// API key from the flag, falling back to the environment.
pub(crate) fn api_key(flag: Option<String>) -> Result<String, FetchError> {
    flag.or_else(|| std::env::var(API_KEY_ENV).ok())
        .filter(|k| !k.trim().is_empty())
        .ok_or(FetchError::MissingApiKey)
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Download profiles for the filtered universe and write them to `dir`.
pub(crate) async fn fetch_profiles(
    api_key: String,
    config: &FetchConfig,
    min_price: f64,
    dir: &Path,
) -> Result<PathBuf, FetchError> {
    let client = FmpClient::with_config(api_key, config)?;

    let listings = client.fetch_stock_list().await?;
    let universe = ListedUniverse::new(listings)
        .select_major_exchanges()
        .select_minimum_price(min_price);
    info!(symbols = universe.size(), "profile universe selected");

    let pb = progress_bar(universe.size());
    pb.set_message("Fetching company profiles...");
    let profiles: Vec<CompanyProfile> = client
        .fetch_profiles(&universe.symbols(), |symbol, _ok| {
            pb.set_message(symbol.to_string());
            pb.inc(1);
        })
        .await;
    pb.finish_with_message(format!("Fetched {} profiles", profiles.len()));

    Ok(intrinsic_data::fmp::write_profiles_csv(&profiles, dir)?)
}
