//! Universe of listed securities from the provider's stock list.

use intrinsic_data::fmp::StockListing;
use tracing::info;

/// Exchanges considered major listings.
pub const MAJOR_EXCHANGES: [&str; 6] = [
    "Nasdaq Global Select",
    "NasdaqGS",
    "Nasdaq",
    "New York Stock Exchange",
    "NYSE",
    "NYSE American",
];

/// Default minimum share price.
pub const DEFAULT_MIN_PRICE: f64 = 5.0;

/// Listed securities, narrowed by exchange and price filters.
#[derive(Debug, Clone, Default)]
pub struct ListedUniverse {
    listings: Vec<StockListing>,
}

impl ListedUniverse {
    /// Universe of every listing.
    pub const fn new(listings: Vec<StockListing>) -> Self {
        Self { listings }
    }

    /// Listings in the universe.
    pub fn listings(&self) -> &[StockListing] {
        &self.listings
    }

    /// Symbols in listing order.
    pub fn symbols(&self) -> Vec<String> {
        self.listings.iter().map(|l| l.symbol.clone()).collect()
    }

    /// Keep listings on one of [`MAJOR_EXCHANGES`].
    pub fn select_major_exchanges(self) -> Self {
        let before = self.listings.len();
        let listings: Vec<StockListing> = self
            .listings
            .into_iter()
            .filter(|l| {
                l.exchange
                    .as_deref()
                    .is_some_and(|e| MAJOR_EXCHANGES.contains(&e))
            })
            .collect();

        info!(before, after = listings.len(), "selected major exchange listings");
        Self { listings }
    }

    /// Keep listings priced at or above `min_price`. Listings without a
    /// price are removed.
    pub fn select_minimum_price(self, min_price: f64) -> Self {
        let before = self.listings.len();
        let listings: Vec<StockListing> = self
            .listings
            .into_iter()
            .filter(|l| l.price.is_some_and(|p| p >= min_price))
            .collect();

        info!(before, after = listings.len(), min_price, "selected listings by price");
        Self { listings }
    }
}

impl From<Vec<StockListing>> for ListedUniverse {
    fn from(listings: Vec<StockListing>) -> Self {
        Self::new(listings)
    }
}
