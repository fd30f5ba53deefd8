#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/intrinsic/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod performance;
pub mod screen;
pub mod stats;

pub use error::{Result, ScreenError};
pub use performance::{PERFORMANCE_METRICS, PerformanceMetric, metric_info, performance_history};
pub use screen::{Bounds, ScreenCriteria, screen_frame, screen_stocks};
pub use stats::{Statistic, calculate_stats};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
