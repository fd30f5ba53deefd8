//! FinancialModelingPrep API client with rate limiting.

use crate::error::{DataError, Result};
use crate::fmp::profile::{CompanyProfile, StockListing};
use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// FinancialModelingPrep API base URL
const FMP_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// User agent for provider requests
const USER_AGENT: &str = "intrinsic/0.1 (contact@example.com)";

/// Configuration for provider fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Minimum interval between requests in milliseconds (default: 250)
    pub min_interval_ms: u64,
    /// Maximum in-flight profile requests (default: 4)
    pub concurrency: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 250,
            concurrency: 4,
            timeout_secs: 30,
        }
    }
}

/// Error payload the provider returns with a 200 status.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(rename = "Error Message")]
    message: String,
}

/// Rate limiter to keep requests under the provider's plan limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// FinancialModelingPrep API client
#[derive(Debug)]
pub struct FmpClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    api_key: String,
    base_url: String,
    concurrency: usize,
}

impl FmpClient {
    /// Create a new client with default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, &FetchConfig::default())
    }

    /// Create a new client with custom rate limiting and concurrency
    ///
    /// # Example
    /// ```no_run
    /// use intrinsic_data::fmp::{FetchConfig, FmpClient};
    ///
    /// # async fn example() -> intrinsic_data::Result<()> {
    /// let config = FetchConfig { min_interval_ms: 500, ..Default::default() };
    /// let client = FmpClient::with_config("demo", &config)?;
    /// let listings = client.fetch_stock_list().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_config(api_key: impl Into<String>, config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(Duration::from_millis(
                config.min_interval_ms,
            )))),
            api_key: api_key.into(),
            base_url: FMP_BASE_URL.to_string(),
            concurrency: config.concurrency.max(1),
        })
    }

    /// Point the client at a different base URL (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}?apikey={}", self.base_url, path, self.api_key)
    }

    /// Make a rate-limited GET request and decode the JSON body
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.rate_limiter.lock().await.wait().await;

        debug!(path, "provider request");
        let response = self.client.get(self.endpoint(path)).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map_or(60_000, |secs| secs * 1_000);
            return Err(DataError::RateLimit { retry_after_ms });
        }
        if !status.is_success() {
            return Err(DataError::Http(format!("{} returned {}", path, status)));
        }

        let body = response.text().await?;
        if let Ok(payload) = serde_json::from_str::<ErrorPayload>(&body) {
            return Err(DataError::Api(payload.message));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch every listed security.
    pub async fn fetch_stock_list(&self) -> Result<Vec<StockListing>> {
        let listings: Vec<StockListing> = self.get_json("stock/list").await?;
        debug!(count = listings.len(), "fetched stock list");
        Ok(listings)
    }

    /// Fetch the profile of one company.
    pub async fn fetch_company_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let profile: Option<CompanyProfile> = self
            .get_json(&format!("company/profile/{}", symbol.to_uppercase()))
            .await
            .or_else(|e| match e {
                // Unknown tickers come back as an empty object
                DataError::Serialization(_) => Ok(None),
                other => Err(other),
            })?;

        profile.ok_or_else(|| DataError::MissingData {
            symbol: symbol.to_string(),
            reason: "provider returned no profile".to_string(),
        })
    }

    /// Fetch profiles for many symbols with bounded concurrency.
    ///
    /// Failed symbols are logged and skipped; `on_progress` is called once per
    /// symbol whether it succeeded or not.
    pub async fn fetch_profiles<F>(&self, symbols: &[String], on_progress: F) -> Vec<CompanyProfile>
    where
        F: Fn(&str, bool),
    {
        let results: Vec<(String, Result<CompanyProfile>)> = stream::iter(symbols.iter().cloned())
            .map(|symbol| async move {
                let result = self.fetch_company_profile(&symbol).await;
                (symbol, result)
            })
            .buffer_unordered(self.concurrency)
            .inspect(|(symbol, result)| on_progress(symbol.as_str(), result.is_ok()))
            .collect()
            .await;

        let mut profiles = Vec::with_capacity(results.len());
        for (symbol, result) in results {
            match result {
                Ok(profile) => profiles.push(profile),
                Err(e) => warn!(%symbol, error = %e, "failed to fetch company profile"),
            }
        }

        profiles.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        profiles
    }
}
