#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/intrinsic/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod fmp;
pub mod loader;
pub mod record;

pub use error::{DataError, Result};
pub use loader::{PROFILES_FILE, combine_statements};
pub use record::{CompanyFinancialRecord, FinancialHistory, columns};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
