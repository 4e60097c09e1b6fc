use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV parsing failed: {0}")]
    Tsv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid quarter label: {0}")]
    QuarterLabel(String),

    #[error("Data root is not a directory: {0}")]
    InvalidRoot(PathBuf),

    #[error("No quarter directories could be resolved under {root} ({requested} quarters requested)")]
    NoQuartersResolved { root: PathBuf, requested: usize },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
