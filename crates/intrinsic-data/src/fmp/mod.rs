//! FinancialModelingPrep data provider.
//!
//! Covers the two endpoints the screening workflow starts from: the full stock
//! list and per-company profiles. Profiles can be written to
//! [`crate::PROFILES_FILE`] so that [`crate::combine_statements`] picks them up.

pub mod client;
pub mod profile;

pub use client::{FetchConfig, FmpClient};
pub use profile::{CompanyProfile, StockListing, write_profiles_csv};
