//! Deterministic multi-factor scoring of operating-company filings against a
//! fund thesis. A pure function of the cleaned table and the thesis config:
//! no randomness, no hidden state, identical inputs always produce identical
//! scores and rank order.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ThesisConfig;
use crate::domain::{CleanedFiling, InvestorBucket, QuarterLabel};

/// Per-factor sub-scores, each normalized to [0, 1] before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub sector_fit: f64,
    pub momentum: f64,
    pub deal_size: f64,
    pub geography: f64,
    pub quality: f64,
}

/// A scored operating-company filing, ready for target-list rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredFiling {
    pub accession: String,
    pub issuer_name: String,
    pub sector: String,
    pub state: Option<String>,
    pub quarter: QuarterLabel,
    pub filing_date: NaiveDate,
    pub deal_size: crate::domain::DealSizeCategory,
    pub investor_count: u32,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// 1-based position in the deterministic rank order.
    pub rank: u32,
}

pub struct ScoringEngine<'a> {
    thesis: &'a ThesisConfig,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(thesis: &'a ThesisConfig) -> Self {
        Self { thesis }
    }

    /// Scores every operating-company row. Missing inputs zero out the
    /// affected sub-score only; no row is excluded.
    pub fn score(&self, operating: &[CleanedFiling]) -> Vec<ScoredFiling> {
        let histories = issuer_histories(operating);

        let mut scored: Vec<ScoredFiling> = operating
            .iter()
            .map(|filing| {
                let breakdown = ScoreBreakdown {
                    sector_fit: self.sector_fit(filing),
                    momentum: self.momentum(filing, &histories),
                    deal_size: self.deal_size(filing),
                    geography: self.geography(filing),
                    quality: self.quality(filing),
                };
                let weights = &self.thesis.weights;
                let weighted = weights.sector_fit * breakdown.sector_fit
                    + weights.momentum * breakdown.momentum
                    + weights.deal_size * breakdown.deal_size
                    + weights.geography * breakdown.geography
                    + weights.quality * breakdown.quality;
                ScoredFiling {
                    accession: filing.accession.clone(),
                    issuer_name: filing.issuer_name.clone(),
                    sector: filing.sector.clone(),
                    state: filing.state.clone(),
                    quarter: filing.quarter,
                    filing_date: filing.filing_date,
                    deal_size: filing.deal_size,
                    investor_count: filing.investor_count,
                    score: self.thesis.max_score * weighted,
                    breakdown,
                    rank: 0,
                }
            })
            .collect();

        // Rank order: score desc, investor count desc, filing date asc
        // (earlier filing wins), accession asc as the final total tie-break.
        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.investor_count.cmp(&a.investor_count))
                .then_with(|| a.filing_date.cmp(&b.filing_date))
                .then_with(|| a.accession.cmp(&b.accession))
        });
        for (idx, row) in scored.iter_mut().enumerate() {
            row.rank = idx as u32 + 1;
        }

        info!(scored = scored.len(), "scored operating-company filings");
        scored
    }

    /// Full credit for thesis sectors, tiered partial credit for adjacent
    /// ones, zero otherwise (including the "Other" catch-all).
    fn sector_fit(&self, filing: &CleanedFiling) -> f64 {
        if self.thesis.target_sectors.iter().any(|s| s == &filing.sector) {
            1.0
        } else if self.thesis.adjacent_sectors.iter().any(|s| s == &filing.sector) {
            self.thesis.adjacent_sector_credit
        } else {
            0.0
        }
    }

    /// Growth signals across the issuer's filing history. Single-filing
    /// issuers receive the configured fixed baseline.
    fn momentum(
        &self,
        filing: &CleanedFiling,
        histories: &HashMap<(String, String), IssuerHistory>,
    ) -> f64 {
        if filing.issuer_name.is_empty() {
            return 0.0;
        }
        let Some(history) = histories.get(&filing.issuer_key()) else {
            return 0.0;
        };
        if history.filings == 1 {
            return self.thesis.momentum_single_filing_baseline;
        }
        let mut score: f64 = 0.4;
        if filing.is_follow_on {
            score += 0.3;
        }
        if filing.investor_count > history.first_investor_count {
            score += 0.3;
        }
        score.min(1.0)
    }

    /// Peak credit at the sweet-spot buckets, linear decay per bucket step
    /// away, zero for Unknown.
    fn deal_size(&self, filing: &CleanedFiling) -> f64 {
        let Some(ordinal) = filing.deal_size.ordinal() else {
            return 0.0;
        };
        let distance = self
            .thesis
            .sweet_spot_buckets
            .iter()
            .filter_map(|b| b.ordinal())
            .map(|sweet| sweet.abs_diff(ordinal))
            .min();
        match distance {
            Some(d) => (1.0 - self.thesis.deal_size_decay * d as f64).max(0.0),
            None => 0.0,
        }
    }

    fn geography(&self, filing: &CleanedFiling) -> f64 {
        let Some(state) = filing.state.as_deref() else {
            return 0.0;
        };
        if self.thesis.tier1_states.iter().any(|s| s.eq_ignore_ascii_case(state)) {
            1.0
        } else if self.thesis.tier2_states.iter().any(|s| s.eq_ignore_ascii_case(state)) {
            self.thesis.tier2_state_credit
        } else {
            0.0
        }
    }

    /// Placement-agent presence, investor bucket, and team size each
    /// contribute a fractional share.
    fn quality(&self, filing: &CleanedFiling) -> f64 {
        let mut score: f64 = 0.0;
        if filing.has_placement_agent {
            score += 0.4;
        }
        score += match filing.investor_bucket {
            InvestorBucket::None => 0.0,
            InvestorBucket::Few => 0.15,
            InvestorBucket::Some => 0.25,
            InvestorBucket::Many => 0.4,
        };
        if filing.multiple_related_persons {
            score += 0.2;
        }
        score.min(1.0)
    }
}

/// Per-issuer filing history needed by the momentum factor.
struct IssuerHistory {
    filings: usize,
    /// Investor count on the issuer's earliest filing, the growth baseline.
    first_investor_count: u32,
}

fn issuer_histories(operating: &[CleanedFiling]) -> HashMap<(String, String), IssuerHistory> {
    let mut histories: HashMap<(String, String), (usize, NaiveDate, String, u32)> = HashMap::new();
    for filing in operating {
        if filing.issuer_name.is_empty() {
            continue;
        }
        let entry = histories.entry(filing.issuer_key()).or_insert((
            0,
            filing.filing_date,
            filing.accession.clone(),
            filing.investor_count,
        ));
        entry.0 += 1;
        // Earliest filing wins the baseline; accession breaks date ties so the
        // baseline is independent of input order.
        if (filing.filing_date, filing.accession.as_str()) < (entry.1, entry.2.as_str()) {
            entry.1 = filing.filing_date;
            entry.2 = filing.accession.clone();
            entry.3 = filing.investor_count;
        }
    }
    histories
        .into_iter()
        .map(|(key, (filings, _, _, first_investor_count))| {
            (key, IssuerHistory { filings, first_investor_count })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DealSizeCategory, FilingClass, OfferingAmount, Region,
    };

    fn thesis() -> ThesisConfig {
        ThesisConfig::default()
    }

    fn filing(acc: &str, sector: &str, state: &str, deal_size: DealSizeCategory) -> CleanedFiling {
        CleanedFiling {
            accession: acc.to_string(),
            quarter: "2024Q1".parse().unwrap(),
            filing_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            date_imputed: false,
            is_amendment: false,
            is_follow_on: false,
            sic_code: None,
            class: FilingClass::OperatingCompany,
            fund_type: None,
            unclassified: false,
            sector: sector.to_string(),
            issuer_name: format!("{acc} issuer"),
            state: (!state.is_empty()).then(|| state.to_string()),
            region: Region::International,
            is_us: !state.is_empty(),
            city: None,
            entity_type: None,
            is_llc: false,
            is_corporation: false,
            is_partnership: false,
            incorporation_year: None,
            total_offering_amount: OfferingAmount::Value(7_500_000.0),
            total_amount_sold: OfferingAmount::Missing,
            total_remaining: OfferingAmount::Missing,
            deal_size,
            minimum_investment: None,
            sale_date: None,
            is_equity: true,
            is_debt: false,
            has_506b: true,
            has_506c: false,
            investor_count: 0,
            investor_bucket: InvestorBucket::None,
            has_non_accredited: false,
            has_placement_agent: false,
            related_person_count: 0,
            multiple_related_persons: false,
        }
    }

    #[test]
    fn scores_are_bounded_by_max_score() {
        let thesis = thesis();
        let engine = ScoringEngine::new(&thesis);

        let mut strong = filing("acc-1", "Enterprise Software", "CA", DealSizeCategory::SeriesA);
        strong.investor_count = 25;
        strong.investor_bucket = InvestorBucket::Many;
        strong.has_placement_agent = true;
        strong.multiple_related_persons = true;
        strong.is_follow_on = true;
        let weak = filing("acc-2", "Other", "", DealSizeCategory::Unknown);

        let scored = engine.score(&[strong, weak]);
        for row in &scored {
            assert!(row.score >= 0.0 && row.score <= thesis.max_score, "score {}", row.score);
        }
        assert_eq!(scored[0].accession, "acc-1");
    }

    #[test]
    fn scoring_is_deterministic() {
        let thesis = thesis();
        let engine = ScoringEngine::new(&thesis);
        let rows = vec![
            filing("acc-1", "Fintech", "NY", DealSizeCategory::Seed),
            filing("acc-2", "Biotech", "MA", DealSizeCategory::SeriesB),
            filing("acc-3", "Other", "", DealSizeCategory::Unknown),
        ];
        let first = engine.score(&rows);
        let second = engine.score(&rows);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.accession, b.accession);
            assert_eq!(a.score, b.score);
            assert_eq!(a.rank, b.rank);
        }
    }

    #[test]
    fn every_row_is_scored_even_when_all_factors_are_zero() {
        let thesis = thesis();
        let engine = ScoringEngine::new(&thesis);
        let mut row = filing("acc-1", "Other", "", DealSizeCategory::Unknown);
        row.issuer_name = String::new();

        let scored = engine.score(&[row]);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].score, 0.0);
        assert_eq!(scored[0].breakdown.sector_fit, 0.0);
        assert_eq!(scored[0].breakdown.momentum, 0.0);
    }

    #[test]
    fn sector_fit_tiers() {
        let thesis = thesis();
        let engine = ScoringEngine::new(&thesis);
        assert_eq!(
            engine.sector_fit(&filing("a", "Enterprise Software", "CA", DealSizeCategory::Seed)),
            1.0
        );
        assert_eq!(
            engine.sector_fit(&filing("a", "Biotech", "CA", DealSizeCategory::Seed)),
            thesis.adjacent_sector_credit
        );
        assert_eq!(engine.sector_fit(&filing("a", "Other", "CA", DealSizeCategory::Seed)), 0.0);
    }

    #[test]
    fn deal_size_decays_with_bucket_distance() {
        let thesis = thesis();
        let engine = ScoringEngine::new(&thesis);
        let at = |cat| engine.deal_size(&filing("a", "Other", "", cat));

        assert_eq!(at(DealSizeCategory::SeriesA), 1.0);
        assert_eq!(at(DealSizeCategory::SeriesB), 1.0);
        assert_eq!(at(DealSizeCategory::Seed), 0.75);
        assert_eq!(at(DealSizeCategory::SeriesC), 0.75);
        assert_eq!(at(DealSizeCategory::Micro), 0.5);
        assert_eq!(at(DealSizeCategory::Unknown), 0.0);
    }

    #[test]
    fn geography_tiers() {
        let thesis = thesis();
        let engine = ScoringEngine::new(&thesis);
        assert_eq!(engine.geography(&filing("a", "Other", "CA", DealSizeCategory::Seed)), 1.0);
        assert_eq!(
            engine.geography(&filing("a", "Other", "OR", DealSizeCategory::Seed)),
            thesis.tier2_state_credit
        );
        assert_eq!(engine.geography(&filing("a", "Other", "WY", DealSizeCategory::Seed)), 0.0);
        assert_eq!(engine.geography(&filing("a", "Other", "", DealSizeCategory::Seed)), 0.0);
    }

    #[test]
    fn single_filing_issuer_gets_momentum_baseline() {
        let thesis = thesis();
        let engine = ScoringEngine::new(&thesis);
        let rows = vec![filing("acc-1", "Fintech", "NY", DealSizeCategory::Seed)];
        let scored = engine.score(&rows);
        assert_eq!(scored[0].breakdown.momentum, thesis.momentum_single_filing_baseline);
    }

    #[test]
    fn follow_on_with_investor_growth_maxes_momentum() {
        let thesis = thesis();
        let engine = ScoringEngine::new(&thesis);

        let mut first = filing("acc-1", "Fintech", "NY", DealSizeCategory::Seed);
        first.investor_count = 2;
        let mut second = filing("acc-2", "Fintech", "NY", DealSizeCategory::SeriesA);
        second.issuer_name = first.issuer_name.clone();
        second.filing_date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        second.is_follow_on = true;
        second.investor_count = 8;

        let scored = engine.score(&[first, second]);
        let second_scored = scored.iter().find(|r| r.accession == "acc-2").unwrap();
        assert_eq!(second_scored.breakdown.momentum, 1.0);
        let first_scored = scored.iter().find(|r| r.accession == "acc-1").unwrap();
        assert_eq!(first_scored.breakdown.momentum, 0.4);
    }

    #[test]
    fn ties_break_by_investors_then_earlier_date() {
        let thesis = thesis();
        let engine = ScoringEngine::new(&thesis);

        let mut a = filing("acc-a", "Fintech", "NY", DealSizeCategory::SeriesA);
        let mut b = filing("acc-b", "Fintech", "NY", DealSizeCategory::SeriesA);
        // Same score inputs, but b has more investors within the same bucket.
        a.investor_count = 3;
        a.investor_bucket = InvestorBucket::Some;
        b.investor_count = 7;
        b.investor_bucket = InvestorBucket::Some;

        let scored = engine.score(&[a, b]);
        assert_eq!(scored[0].accession, "acc-b");

        let mut c = filing("acc-c", "Fintech", "NY", DealSizeCategory::SeriesA);
        let mut d = filing("acc-d", "Fintech", "NY", DealSizeCategory::SeriesA);
        c.filing_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        d.filing_date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let scored = engine.score(&[d.clone(), c.clone()]);
        // Earlier filing wins the tie.
        assert_eq!(scored[0].accession, "acc-c");
    }
}
