//! Grouped summary statistics over the cleaned tables, consumed by external
//! report and chart writers. Grouping uses BTreeMaps so output order is
//! deterministic across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{CleanedFiling, DealSizeCategory, QuarterLabel, Region};

/// Per-quarter deal volume and capital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalSummary {
    pub quarter: QuarterLabel,
    pub filings: usize,
    /// Filings that are neither amendments nor follow-ons: true new deal flow.
    pub new_deals: usize,
    pub amount_sold_total: f64,
    pub offering_amount_median: Option<f64>,
}

/// Per-sector deal volume, capital, and deal-size mix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorSummary {
    pub sector: String,
    pub filings: usize,
    pub amount_sold_total: f64,
    pub offering_amount_median: Option<f64>,
    /// Share of all filings in the input, in [0, 1].
    pub share: f64,
    pub deal_sizes: BTreeMap<DealSizeCategory, usize>,
}

/// Per-region deal volume and capital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: Region,
    pub filings: usize,
    pub amount_sold_total: f64,
    /// Filing counts per state within the region.
    pub states: BTreeMap<String, usize>,
}

/// Quarterly trend rows in chronological order.
pub fn temporal_summary(rows: &[CleanedFiling]) -> Vec<TemporalSummary> {
    let mut groups: BTreeMap<QuarterLabel, Vec<&CleanedFiling>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.quarter).or_default().push(row);
    }
    groups
        .into_iter()
        .map(|(quarter, group)| TemporalSummary {
            quarter,
            filings: group.len(),
            new_deals: group.iter().filter(|r| !r.is_amendment && !r.is_follow_on).count(),
            amount_sold_total: sum_sold(&group),
            offering_amount_median: median(offering_values(&group)),
        })
        .collect()
}

/// Sector rows ordered by filing count descending, then sector name for
/// stable ties.
pub fn sector_summary(rows: &[CleanedFiling]) -> Vec<SectorSummary> {
    let total = rows.len();
    let mut groups: BTreeMap<&str, Vec<&CleanedFiling>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.sector.as_str()).or_default().push(row);
    }
    let mut summaries: Vec<SectorSummary> = groups
        .into_iter()
        .map(|(sector, group)| {
            let mut deal_sizes = BTreeMap::new();
            for row in &group {
                *deal_sizes.entry(row.deal_size).or_insert(0) += 1;
            }
            SectorSummary {
                sector: sector.to_string(),
                filings: group.len(),
                amount_sold_total: sum_sold(&group),
                offering_amount_median: median(offering_values(&group)),
                share: if total == 0 { 0.0 } else { group.len() as f64 / total as f64 },
                deal_sizes,
            }
        })
        .collect();
    summaries.sort_by(|a, b| b.filings.cmp(&a.filings).then_with(|| a.sector.cmp(&b.sector)));
    summaries
}

/// Regional rows in the fixed `Region` order.
pub fn region_summary(rows: &[CleanedFiling]) -> Vec<RegionSummary> {
    let mut groups: BTreeMap<Region, Vec<&CleanedFiling>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.region).or_default().push(row);
    }
    groups
        .into_iter()
        .map(|(region, group)| {
            let mut states = BTreeMap::new();
            for row in &group {
                if let Some(state) = &row.state {
                    *states.entry(state.clone()).or_insert(0) += 1;
                }
            }
            RegionSummary {
                region,
                filings: group.len(),
                amount_sold_total: sum_sold(&group),
                states,
            }
        })
        .collect()
}

fn sum_sold(group: &[&CleanedFiling]) -> f64 {
    group.iter().filter_map(|r| r.total_amount_sold.value()).sum()
}

fn offering_values(group: &[&CleanedFiling]) -> Vec<f64> {
    group.iter().filter_map(|r| r.total_offering_amount.value()).collect()
}

/// Median of the observed values; `None` on an empty set. Indefinite and
/// missing amounts never enter the calculation.
fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilingClass, InvestorBucket, OfferingAmount};
    use chrono::NaiveDate;

    fn filing(quarter: &str, sector: &str, offered: f64, sold: f64) -> CleanedFiling {
        let quarter: QuarterLabel = quarter.parse().unwrap();
        let offered = OfferingAmount::Value(offered);
        CleanedFiling {
            accession: format!("acc-{quarter}-{sector}-{sold}"),
            quarter,
            filing_date: quarter.synthetic_date(),
            date_imputed: false,
            is_amendment: false,
            is_follow_on: false,
            sic_code: None,
            class: FilingClass::OperatingCompany,
            fund_type: None,
            unclassified: false,
            sector: sector.to_string(),
            issuer_name: "ISSUER".to_string(),
            state: Some("CA".to_string()),
            region: Region::WestCoast,
            is_us: true,
            city: None,
            entity_type: None,
            is_llc: false,
            is_corporation: false,
            is_partnership: false,
            incorporation_year: None,
            deal_size: DealSizeCategory::for_amount(&offered),
            total_offering_amount: offered,
            total_amount_sold: OfferingAmount::Value(sold),
            total_remaining: OfferingAmount::Missing,
            minimum_investment: None,
            sale_date: None,
            is_equity: true,
            is_debt: false,
            has_506b: false,
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
    fn temporal_groups_are_chronological() {
        let rows = vec![
            filing("2024Q2", "Fintech", 2_000_000.0, 500_000.0),
            filing("2024Q1", "Fintech", 4_000_000.0, 1_000_000.0),
            filing("2024Q1", "Biotech", 6_000_000.0, 2_000_000.0),
        ];
        let summary = temporal_summary(&rows);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].quarter.to_string(), "2024Q1");
        assert_eq!(summary[0].filings, 2);
        assert_eq!(summary[0].amount_sold_total, 3_000_000.0);
        assert_eq!(summary[0].offering_amount_median, Some(5_000_000.0));
    }

    #[test]
    fn new_deals_exclude_amendments_and_follow_ons() {
        let mut amended = filing("2024Q1", "Fintech", 1_000_000.0, 0.0);
        amended.is_amendment = true;
        let mut follow_on = filing("2024Q1", "Fintech", 1_000_000.0, 1.0);
        follow_on.is_follow_on = true;
        let fresh = filing("2024Q1", "Fintech", 1_000_000.0, 2.0);

        let summary = temporal_summary(&[amended, follow_on, fresh]);
        assert_eq!(summary[0].filings, 3);
        assert_eq!(summary[0].new_deals, 1);
    }

    #[test]
    fn sector_summary_orders_by_volume_and_computes_share() {
        let rows = vec![
            filing("2024Q1", "Fintech", 2_000_000.0, 1.0),
            filing("2024Q1", "Fintech", 8_000_000.0, 2.0),
            filing("2024Q1", "Biotech", 6_000_000.0, 3.0),
        ];
        let summary = sector_summary(&rows);
        assert_eq!(summary[0].sector, "Fintech");
        assert!((summary[0].share - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(summary[0].deal_sizes.get(&DealSizeCategory::Seed), Some(&1));
        assert_eq!(summary[0].deal_sizes.get(&DealSizeCategory::SeriesA), Some(&1));
    }

    #[test]
    fn region_summary_counts_states() {
        let mut ny = filing("2024Q1", "Fintech", 2_000_000.0, 1.0);
        ny.state = Some("NY".to_string());
        ny.region = Region::Northeast;
        let rows = vec![filing("2024Q1", "Fintech", 2_000_000.0, 1.0), ny];

        let summary = region_summary(&rows);
        assert_eq!(summary.len(), 2);
        let northeast = summary.iter().find(|s| s.region == Region::Northeast).unwrap();
        assert_eq!(northeast.states.get("NY"), Some(&1));
    }

    #[test]
    fn median_handles_even_and_odd_counts() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(Vec::new()), None);
    }
}
