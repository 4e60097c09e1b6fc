//! The Form D pipeline: load the quarterly TSV tables, clean them into the
//! fund and operating-company analysis tables, and score operating companies
//! against the fund thesis. Data flows strictly one way; inputs are read-only
//! and a re-run over identical inputs reproduces identical outputs.

pub mod aggregate;
pub mod cleaner;
pub mod loader;
pub mod quality;
pub mod scoring;

use std::path::Path;

use tracing::info;

use crate::config::PipelineConfig;
use crate::domain::CleanedFiling;
use crate::error::Result;
use cleaner::FormDCleaner;
use loader::FormDLoader;
use quality::QualityLog;
use scoring::{ScoredFiling, ScoringEngine};

/// Everything a pipeline run produces: the two analysis tables, the scored
/// target table, and the data-quality log.
#[derive(Debug)]
pub struct PipelineRun {
    pub funds: Vec<CleanedFiling>,
    pub operating: Vec<CleanedFiling>,
    pub scored: Vec<ScoredFiling>,
    pub quality: QualityLog,
}

/// Orchestrates load, clean, and score for a configured quarter range.
pub struct FormDPipeline {
    config: PipelineConfig,
}

impl FormDPipeline {
    /// Validates and captures the configuration. Configuration problems are
    /// the only errors surfaced at construction.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Runs the full pipeline against a data root. Fatal only for
    /// configuration-level failures (invalid root, no resolvable quarters);
    /// every row-level problem degrades into the quality log instead.
    pub fn run(&self, root: &Path) -> Result<PipelineRun> {
        info!(root = %root.display(), quarters = self.config.quarters.len(), "starting Form D pipeline");
        let mut quality = QualityLog::new();

        let loader = FormDLoader::new(root, self.config.quarters.clone());
        let raw = loader.load(&mut quality)?;

        let cleaned = FormDCleaner::new().clean(&raw, &mut quality);

        let engine = ScoringEngine::new(&self.config.thesis);
        let scored = engine.score(&cleaned.operating);

        info!(
            funds = cleaned.funds.len(),
            operating = cleaned.operating.len(),
            scored = scored.len(),
            warnings = quality.warnings.len(),
            "pipeline run complete"
        );
        Ok(PipelineRun {
            funds: cleaned.funds,
            operating: cleaned.operating,
            scored,
            quality,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
