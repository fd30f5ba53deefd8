#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/intrinsic/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod discount;
pub mod error;
pub mod growth;
pub mod inputs;
pub mod intrinsic;
pub mod margin;
pub mod pipeline;
pub mod projection;
pub mod round;
pub mod stage;
pub mod table;
pub mod terminal;

pub use config::ValuationConfig;
pub use discount::{DiscountRateCalculator, DiscountedRow, WaccBreakdown};
pub use error::{Result, ValuationError};
pub use growth::GrowthAssumptions;
pub use inputs::{AssembledInputs, ValuationInputAssembler, ValuationInputRow};
pub use intrinsic::{IntrinsicRow, IntrinsicValueCalculator};
pub use margin::{BuyDecision, MarginOfSafetyEvaluator, ValuationResult};
pub use pipeline::{ValuationPipeline, ValuationRun};
pub use projection::{CashFlowProjection, CashFlowProjector, ProjectedRow, ProjectedYear};
pub use stage::{StageKind, StageOutcome, SymbolFailure, SymbolRow, ValuationStage};
pub use table::{results_to_dataframe, schedule_to_dataframe};
pub use terminal::{TerminalRow, TerminalValueCalculator};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
