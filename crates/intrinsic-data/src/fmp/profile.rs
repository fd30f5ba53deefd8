//! Stock listing and company profile records.

use crate::PROFILES_FILE;
use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// A listed security from the provider's stock list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockListing {
    /// Ticker symbol
    pub symbol: String,
    /// Security name
    #[serde(default)]
    pub name: Option<String>,
    /// Last price
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    /// Exchange name (e.g. "Nasdaq Global Select")
    #[serde(default)]
    pub exchange: Option<String>,
    /// Short exchange code (e.g. "NASDAQ")
    #[serde(default)]
    pub exchange_short_name: Option<String>,
}

impl StockListing {
    /// Create a listing with a price and exchange.
    pub fn new(symbol: impl Into<String>, price: Option<f64>, exchange: Option<&str>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            price,
            exchange: exchange.map(str::to_string),
            exchange_short_name: None,
        }
    }
}

/// Company profile as returned by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Ticker symbol
    pub symbol: String,
    /// Profile details
    pub profile: ProfileDetails,
}

/// Descriptive and market fields of a company profile.
///
/// The provider encodes several numeric fields as strings, so numbers are
/// parsed leniently and unparseable values become `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    /// Last price
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    /// Equity beta
    #[serde(default, deserialize_with = "lenient_f64")]
    pub beta: Option<f64>,
    /// Average volume
    #[serde(default, deserialize_with = "lenient_f64")]
    pub vol_avg: Option<f64>,
    /// Market capitalization
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mkt_cap: Option<f64>,
    /// Last dividend
    #[serde(default, deserialize_with = "lenient_f64")]
    pub last_div: Option<f64>,
    /// Company name
    #[serde(default)]
    pub company_name: Option<String>,
    /// Exchange name
    #[serde(default)]
    pub exchange: Option<String>,
    /// Industry
    #[serde(default)]
    pub industry: Option<String>,
    /// Sector
    #[serde(default)]
    pub sector: Option<String>,
    /// Website
    #[serde(default)]
    pub website: Option<String>,
    /// Chief executive
    #[serde(default)]
    pub ceo: Option<String>,
}

impl CompanyProfile {
    /// Header of the flattened profile table.
    pub const CSV_HEADER: [&'static str; 12] = [
        "symbol",
        "profile.price",
        "profile.beta",
        "profile.volAvg",
        "profile.mktCap",
        "profile.lastDiv",
        "profile.companyName",
        "profile.exchange",
        "profile.industry",
        "profile.sector",
        "profile.website",
        "profile.ceo",
    ];

    fn csv_record(&self) -> [String; 12] {
        let number = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let p = &self.profile;

        [
            self.symbol.clone(),
            number(p.price),
            number(p.beta),
            number(p.vol_avg),
            number(p.mkt_cap),
            number(p.last_div),
            text(&p.company_name),
            text(&p.exchange),
            text(&p.industry),
            text(&p.sector),
            text(&p.website),
            text(&p.ceo),
        ]
    }
}

/// Write profiles to `dir/company-profiles.csv` with `profile.`-prefixed
/// column names. Returns the written path.
pub fn write_profiles_csv(profiles: &[CompanyProfile], dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(PROFILES_FILE);

    let mut wtr = csv::Writer::from_path(&path)?;
    wtr.write_record(CompanyProfile::CSV_HEADER)?;
    for profile in profiles {
        wtr.write_record(profile.csv_record())?;
    }
    wtr.flush()?;

    info!(path = %path.display(), profiles = profiles.len(), "wrote company profiles");
    Ok(path)
}

/// Accept a JSON number, a numeric string, or null.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parses_string_numbers() {
        let json = r#"{
            "symbol": "AAPL",
            "profile": {
                "price": 126.6,
                "beta": "1.228499",
                "volAvg": "108372430",
                "mktCap": "n/a",
                "companyName": "Apple Inc.",
                "exchange": "Nasdaq Global Select",
                "sector": "Technology"
            }
        }"#;

        let profile: CompanyProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.symbol, "AAPL");
        assert_eq!(profile.profile.price, Some(126.6));
        assert_eq!(profile.profile.beta, Some(1.228499));
        assert_eq!(profile.profile.vol_avg, Some(108_372_430.0));
        assert_eq!(profile.profile.mkt_cap, None);
        assert_eq!(profile.profile.last_div, None);
        assert_eq!(profile.profile.sector.as_deref(), Some("Technology"));
    }

    #[test]
    fn test_listing_parses() {
        let json = r#"[{"symbol":"SPY","name":"SPDR S&P 500","price":443.4,
            "exchange":"New York Stock Exchange Arca","exchangeShortName":"AMEX"}]"#;

        let listings: Vec<StockListing> = serde_json::from_str(json).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, Some(443.4));
        assert_eq!(listings[0].exchange_short_name.as_deref(), Some("AMEX"));
    }

    #[test]
    fn test_write_profiles_csv() {
        let profiles = vec![CompanyProfile {
            symbol: "MSFT".to_string(),
            profile: ProfileDetails {
                beta: Some(0.9),
                company_name: Some("Microsoft Corporation".to_string()),
                ..Default::default()
            },
        }];

        let dir = std::env::temp_dir().join("intrinsic_profiles_test");
        let path = write_profiles_csv(&profiles, &dir).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        assert!(content.starts_with("symbol,profile.price,profile.beta"));
        assert!(content.contains("MSFT,,0.9"));
        assert!(content.contains("Microsoft Corporation"));

        std::fs::remove_dir_all(dir).ok();
    }
}
