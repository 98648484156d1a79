pub mod analysis;
pub mod config;
pub mod distribution;
pub mod error;
pub mod sequence;
pub mod types;

pub use analysis::Analysis;
pub use config::{AnalysisConfig, TestOptions};
pub use error::BenfordError;
pub use sequence::RawValue;
pub use types::*;

/// Standard result type for all Benford operations
pub type BenfordResult<T> = Result<T, BenfordError>;
