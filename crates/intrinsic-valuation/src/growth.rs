//! Per-symbol growth rate assumptions.

use crate::error::{Result, ValuationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Expected annual free cash flow growth rate per symbol.
///
/// Serializes as a flat JSON object, e.g. `{"AAPL": 0.08, "MSFT": 0.1}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrowthAssumptions {
    rates: BTreeMap<String, f64>,
}

impl GrowthAssumptions {
    /// Empty set of assumptions.
    pub const fn new() -> Self {
        Self {
            rates: BTreeMap::new(),
        }
    }

    /// Add or replace the rate for `symbol`, returning the previous rate.
    pub fn insert(&mut self, symbol: impl Into<String>, rate: f64) -> Result<Option<f64>> {
        let symbol = symbol.into();
        check_rate(&symbol, rate)?;
        Ok(self.rates.insert(symbol, rate))
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, symbol: impl Into<String>, rate: f64) -> Result<Self> {
        self.insert(symbol, rate)?;
        Ok(self)
    }

    /// Merge `other` into `self`; rates in `other` win.
    pub fn extend(&mut self, other: Self) {
        self.rates.extend(other.rates);
    }

    /// Growth rate for `symbol`.
    pub fn get(&self, symbol: &str) -> Result<f64> {
        self.rates
            .get(symbol)
            .copied()
            .ok_or_else(|| ValuationError::missing(symbol, "no growth rate assumption"))
    }

    /// Whether a rate exists for `symbol`.
    pub fn contains(&self, symbol: &str) -> bool {
        self.rates.contains_key(symbol)
    }

    /// Symbols with an assumption, sorted.
    pub fn symbols(&self) -> Vec<String> {
        self.rates.keys().cloned().collect()
    }

    /// Number of symbols with an assumption.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// True if there are no assumptions.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Iterate over (symbol, rate) pairs in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(s, r)| (s.as_str(), *r))
    }

    /// Parse a JSON object of symbol to rate.
    pub fn from_json(json: &str) -> Result<Self> {
        let rates: BTreeMap<String, f64> = serde_json::from_str(json)
            .map_err(|e| ValuationError::Configuration(format!("invalid growth rates: {e}")))?;
        rates.into_iter().try_fold(Self::new(), |acc, (s, r)| acc.with(s, r))
    }

    /// Read a JSON object of symbol to rate from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ValuationError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Parse `SYMBOL=RATE` pairs such as `AAPL=0.08`.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        pairs.into_iter().try_fold(Self::new(), |acc, pair| {
            let GrowthPair(symbol, rate) = pair.as_ref().parse()?;
            acc.with(symbol, rate)
        })
    }
}

/// One `SYMBOL=RATE` assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthPair(pub String, pub f64);

impl FromStr for GrowthPair {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self> {
        let (symbol, rate) = s.split_once('=').ok_or_else(|| {
            ValuationError::Configuration(format!("expected SYMBOL=RATE, got '{s}'"))
        })?;
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(ValuationError::Configuration(format!(
                "missing symbol in '{s}'"
            )));
        }
        let rate: f64 = rate.trim().parse().map_err(|_| {
            ValuationError::Configuration(format!("invalid growth rate in '{s}'"))
        })?;
        check_rate(symbol, rate)?;
        Ok(Self(symbol.to_string(), rate))
    }
}

fn check_rate(symbol: &str, rate: f64) -> Result<()> {
    if rate.is_finite() {
        Ok(())
    } else {
        Err(ValuationError::Configuration(format!(
            "growth rate for {symbol} must be finite, got {rate}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_symbol() {
        let growth = GrowthAssumptions::new().with("AAPL", 0.08).unwrap();
        assert_eq!(growth.get("AAPL").unwrap(), 0.08);
        assert!(matches!(
            growth.get("MSFT"),
            Err(ValuationError::MissingData { symbol, .. }) if symbol == "MSFT"
        ));
    }

    #[test]
    fn test_from_pairs() {
        let growth = GrowthAssumptions::from_pairs(["AAPL=0.08", " MSFT = 0.1 "]).unwrap();
        assert_eq!(growth.len(), 2);
        assert_eq!(growth.get("MSFT").unwrap(), 0.1);
        assert_eq!(growth.symbols(), vec!["AAPL".to_string(), "MSFT".to_string()]);
    }

    #[test]
    fn test_invalid_pairs() {
        assert!(GrowthAssumptions::from_pairs(["AAPL"]).is_err());
        assert!(GrowthAssumptions::from_pairs(["=0.1"]).is_err());
        assert!(GrowthAssumptions::from_pairs(["AAPL=fast"]).is_err());
        assert!(GrowthAssumptions::from_pairs(["AAPL=inf"]).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let growth = GrowthAssumptions::from_json(r#"{"AAPL": 0.08, "KO": -0.01}"#).unwrap();
        assert_eq!(growth.get("KO").unwrap(), -0.01);

        let json = serde_json::to_string(&growth).unwrap();
        assert_eq!(json, r#"{"AAPL":0.08,"KO":-0.01}"#);
    }

    #[test]
    fn test_extend_overrides() {
        let mut base = GrowthAssumptions::from_pairs(["AAPL=0.08", "KO=0.02"]).unwrap();
        base.extend(GrowthAssumptions::from_pairs(["AAPL=0.05"]).unwrap());
        assert_eq!(base.get("AAPL").unwrap(), 0.05);
        assert_eq!(base.get("KO").unwrap(), 0.02);
    }
}
