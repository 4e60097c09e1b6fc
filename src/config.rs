use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{DealSizeCategory, QuarterLabel};
use crate::error::{PipelineError, Result};

/// Top-level pipeline configuration: which quarters to ingest plus the fund
/// thesis driving the scoring engine. Loaded from TOML, with defaults that
/// match the built-in thesis so the pipeline runs without a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Quarter labels to ingest, e.g. `["2024Q1", "2024Q2"]`.
    pub quarters: Vec<QuarterLabel>,
    pub thesis: ThesisConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        // Full span of the published Form D datasets.
        let quarters = QuarterLabel::range(
            QuarterLabel { year: 2008, quarter: 1 },
            QuarterLabel { year: 2025, quarter: 4 },
        );
        Self { quarters, thesis: ThesisConfig::default() }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: PipelineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.quarters.is_empty() {
            return Err(PipelineError::Config("no quarters configured".to_string()));
        }
        self.thesis.validate()
    }
}

/// The fund thesis: target sectors and geographies, deal-size sweet spot, and
/// scoring weights. Passed explicitly into the scoring engine so runs with
/// different theses stay reproducible and testable in isolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThesisConfig {
    /// Sectors receiving full sector-fit credit.
    pub target_sectors: Vec<String>,
    /// Sectors receiving partial sector-fit credit.
    pub adjacent_sectors: Vec<String>,
    pub adjacent_sector_credit: f64,

    /// States receiving full geography credit.
    pub tier1_states: Vec<String>,
    /// States receiving partial geography credit.
    pub tier2_states: Vec<String>,
    pub tier2_state_credit: f64,

    /// Deal-size buckets receiving full deal-size credit.
    pub sweet_spot_buckets: Vec<DealSizeCategory>,
    /// Credit lost per bucket step away from the sweet spot.
    pub deal_size_decay: f64,

    /// Momentum sub-score for issuers with exactly one filing on record.
    pub momentum_single_filing_baseline: f64,

    pub weights: ScoringWeights,

    /// Display scale for the final score; sub-scores are weighted into [0, 1]
    /// and multiplied by this.
    pub max_score: f64,
}

impl Default for ThesisConfig {
    fn default() -> Self {
        Self {
            target_sectors: vec![
                "Enterprise Software".to_string(),
                "Data & Analytics".to_string(),
                "Fintech".to_string(),
                "Healthcare IT".to_string(),
            ],
            adjacent_sectors: vec![
                "Hardware".to_string(),
                "Insurtech".to_string(),
                "Healthcare".to_string(),
                "Biotech".to_string(),
                "Telecommunications".to_string(),
            ],
            adjacent_sector_credit: 0.3,
            tier1_states: vec![
                "CA".to_string(),
                "NY".to_string(),
                "MA".to_string(),
                "TX".to_string(),
                "WA".to_string(),
                "IL".to_string(),
                "FL".to_string(),
                "CO".to_string(),
            ],
            tier2_states: vec![
                "DE".to_string(),
                "MD".to_string(),
                "PA".to_string(),
                "NJ".to_string(),
                "OR".to_string(),
                "AZ".to_string(),
                "NV".to_string(),
                "MN".to_string(),
                "UT".to_string(),
                "GA".to_string(),
                "NC".to_string(),
                "VA".to_string(),
            ],
            tier2_state_credit: 0.6,
            sweet_spot_buckets: vec![DealSizeCategory::SeriesA, DealSizeCategory::SeriesB],
            deal_size_decay: 0.25,
            momentum_single_filing_baseline: 0.3,
            weights: ScoringWeights::default(),
            max_score: 21.0,
        }
    }
}

impl ThesisConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !(0.0..=1.0).contains(&self.adjacent_sector_credit)
            || !(0.0..=1.0).contains(&self.tier2_state_credit)
            || !(0.0..=1.0).contains(&self.momentum_single_filing_baseline)
        {
            return Err(PipelineError::Config(
                "partial credits must lie in [0, 1]".to_string(),
            ));
        }
        if self.max_score <= 0.0 {
            return Err(PipelineError::Config("max_score must be positive".to_string()));
        }
        if self.sweet_spot_buckets.iter().any(|b| b.ordinal().is_none()) {
            return Err(PipelineError::Config(
                "sweet spot buckets must be sized buckets, not Unknown".to_string(),
            ));
        }
        Ok(())
    }
}

/// Weights of the five scoring factors. Must sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub sector_fit: f64,
    pub momentum: f64,
    pub deal_size: f64,
    pub geography: f64,
    pub quality: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            sector_fit: 0.25,
            momentum: 0.25,
            deal_size: 0.20,
            geography: 0.15,
            quality: 0.15,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<()> {
        let parts = [self.sector_fit, self.momentum, self.deal_size, self.geography, self.quality];
        if parts.iter().any(|w| *w < 0.0) {
            return Err(PipelineError::Config("scoring weights must be non-negative".to_string()));
        }
        let sum: f64 = parts.iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(PipelineError::Config(format!(
                "scoring weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.quarters.first().map(|q| q.to_string()), Some("2008Q1".to_string()));
        assert_eq!(config.quarters.last().map(|q| q.to_string()), Some("2025Q4".to_string()));
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut weights = ScoringWeights::default();
        weights.sector_fit = 0.5;
        assert!(weights.validate().is_err());
    }

    #[test]
    fn unknown_sweet_spot_bucket_is_rejected() {
        let mut thesis = ThesisConfig::default();
        thesis.sweet_spot_buckets = vec![DealSizeCategory::Unknown];
        assert!(thesis.validate().is_err());
    }

    #[test]
    fn config_parses_from_toml() {
        let toml_src = r#"
            quarters = ["2024Q1", "2024Q2"]

            [thesis]
            target_sectors = ["Biotech"]
            max_score = 100.0
        "#;
        let config: PipelineConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.quarters.len(), 2);
        assert_eq!(config.thesis.target_sectors, vec!["Biotech".to_string()]);
        assert_eq!(config.thesis.max_score, 100.0);
        // Unspecified fields fall back to the built-in thesis.
        assert_eq!(config.thesis.weights.momentum, 0.25);
    }
}
