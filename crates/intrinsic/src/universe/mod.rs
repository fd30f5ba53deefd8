//! Stock universes.
//!
//! A universe is the set of symbols a screen or valuation run considers.

pub mod listed;

pub use listed::{DEFAULT_MIN_PRICE, ListedUniverse, MAJOR_EXCHANGES};

use intrinsic_data::FinancialHistory;

/// Trait for stock universes.
pub trait Universe {
    /// Get all symbols in the universe.
    fn symbols(&self) -> Vec<String>;

    /// Check if a symbol is in the universe.
    fn contains(&self, symbol: &str) -> bool {
        self.symbols().iter().any(|s| s == symbol)
    }

    /// Get the number of constituents.
    fn size(&self) -> usize {
        self.symbols().len()
    }
}

impl Universe for ListedUniverse {
    fn symbols(&self) -> Vec<String> {
        self.symbols()
    }

    fn size(&self) -> usize {
        self.listings().len()
    }
}

/// Every symbol with statement data.
impl Universe for FinancialHistory {
    fn symbols(&self) -> Vec<String> {
        self.symbols()
    }
}
