pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod taxonomy;

pub use config::{PipelineConfig, ScoringWeights, ThesisConfig};
pub use domain::{
    CleanedFiling, DealSizeCategory, FilingClass, FundType, InvestorBucket, OfferingAmount,
    QuarterLabel, Region,
};
pub use error::{PipelineError, Result};
pub use pipeline::quality::{IssueKind, QualityLog, QualityWarning, TableKind};
pub use pipeline::scoring::{ScoreBreakdown, ScoredFiling};
pub use pipeline::{FormDPipeline, PipelineRun};
