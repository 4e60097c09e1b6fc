//! Cleaning and feature engineering: joins the raw tables into analysis-ready
//! filings, resolves heterogeneous dates, classifies fund vs. operating
//! company, maps sectors, buckets deal sizes, and derives quality signals.
//!
//! Row-level problems degrade, they never abort: unparseable dates are
//! imputed from the quarter tag, unmapped sectors fall to "Other", missing
//! amounts bucket to Unknown. Only provably corrupt rows (no accession
//! number) and orphaned child rows are dropped, and those drops are counted.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{
    CleanedFiling, DealSizeCategory, FilingClass, FundType, InvestorBucket, OfferingAmount,
    QuarterLabel, Region,
};
use crate::model::{IssuerRow, SubmissionRow};
use crate::pipeline::loader::RawTables;
use crate::pipeline::quality::{IssueKind, QualityLog, TableKind};
use crate::taxonomy;

/// Raw filing-date formats observed across the 2008-2025 archives, tried in
/// order after the primary `31-DEC-2025` style.
const DATE_FORMATS: [&str; 4] = ["%d-%b-%Y", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d", "%m/%d/%Y"];

/// The two analysis tables produced by cleaning. Both share the
/// `CleanedFiling` schema; funds additionally carry a parsed fund type.
#[derive(Debug, Default)]
pub struct CleanedTables {
    pub funds: Vec<CleanedFiling>,
    pub operating: Vec<CleanedFiling>,
}

impl CleanedTables {
    pub fn total_rows(&self) -> usize {
        self.funds.len() + self.operating.len()
    }
}

pub struct FormDCleaner;

impl FormDCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Cleans the raw tables into the fund and operating-company tables.
    /// Output order is (quarter, accession), so identical inputs always
    /// produce identical tables.
    pub fn clean(&self, raw: &RawTables, log: &mut QualityLog) -> CleanedTables {
        let submissions = index_submissions(raw, log);
        let issuers = index_primary_issuers(raw, &submissions, log);
        let related_counts = count_children(
            raw.related_persons.iter().map(|r| r.row.accession_number.as_deref()),
            &submissions,
            TableKind::RelatedPersons,
            log,
        );
        let recipient_counts = count_children(
            raw.recipients.iter().map(|r| r.row.accession_number.as_deref()),
            &submissions,
            TableKind::Recipients,
            log,
        );

        let mut rows: Vec<CleanedFiling> = Vec::with_capacity(raw.offerings.len());
        for offering in &raw.offerings {
            let Some(accession) = offering.row.accession_number.as_deref() else {
                log.record_corrupt(TableKind::Offerings);
                continue;
            };
            let Some(submission) = submissions.get(accession) else {
                log.record_orphan(TableKind::Offerings);
                continue;
            };
            let issuer = issuers.get(accession).copied();

            rows.push(build_filing(
                accession,
                offering.quarter,
                &offering.row,
                submission,
                issuer,
                related_counts.get(accession).copied().unwrap_or(0),
                recipient_counts.get(accession).copied().unwrap_or(0),
                log,
            ));
        }

        flag_follow_ons(&mut rows);
        rows.sort_by(|a, b| (a.quarter, a.accession.as_str()).cmp(&(b.quarter, b.accession.as_str())));

        let mut tables = CleanedTables::default();
        for row in rows {
            match row.class {
                FilingClass::Fund => tables.funds.push(row),
                FilingClass::OperatingCompany => tables.operating.push(row),
            }
        }

        info!(
            funds = tables.funds.len(),
            operating = tables.operating.len(),
            orphans_dropped = log.orphan_total(),
            dates_imputed = log.count_of(IssueKind::DateImputed),
            "cleaned Form D tables"
        );
        tables
    }
}

impl Default for FormDCleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Submissions keyed by accession number; first occurrence wins on
/// duplicates. Rows without an accession number are provably corrupt.
fn index_submissions<'a>(
    raw: &'a RawTables,
    log: &mut QualityLog,
) -> HashMap<&'a str, &'a SubmissionRow> {
    let mut index = HashMap::with_capacity(raw.submissions.len());
    for sourced in &raw.submissions {
        match sourced.row.accession_number.as_deref() {
            Some(accession) => {
                index.entry(accession).or_insert(&sourced.row);
            }
            None => log.record_corrupt(TableKind::Submissions),
        }
    }
    index
}

/// Primary issuer per accession: the row flagged `IS_PRIMARYISSUER_FLAG=YES`
/// wins, otherwise the first issuer listed. Issuers referencing an unknown
/// filing are orphans.
fn index_primary_issuers<'a>(
    raw: &'a RawTables,
    submissions: &HashMap<&str, &SubmissionRow>,
    log: &mut QualityLog,
) -> HashMap<&'a str, &'a IssuerRow> {
    let mut index: HashMap<&'a str, &'a IssuerRow> = HashMap::new();
    for sourced in &raw.issuers {
        let Some(accession) = sourced.row.accession_number.as_deref() else {
            log.record_corrupt(TableKind::Issuers);
            continue;
        };
        if !submissions.contains_key(accession) {
            log.record_orphan(TableKind::Issuers);
            continue;
        }
        let is_primary = sourced
            .row
            .is_primary_issuer
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("yes"));
        match index.entry(accession) {
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(&sourced.row);
            }
            std::collections::hash_map::Entry::Occupied(mut e) => {
                let current_primary = e
                    .get()
                    .is_primary_issuer
                    .as_deref()
                    .is_some_and(|f| f.eq_ignore_ascii_case("yes"));
                if is_primary && !current_primary {
                    e.insert(&sourced.row);
                }
            }
        }
    }
    index
}

/// Counts child rows per accession, dropping (and counting) orphans and
/// corrupt rows.
fn count_children<'a>(
    accessions: impl Iterator<Item = Option<&'a str>>,
    submissions: &HashMap<&str, &SubmissionRow>,
    table: TableKind,
    log: &mut QualityLog,
) -> HashMap<String, u32> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for accession in accessions {
        match accession {
            Some(acc) if submissions.contains_key(acc) => {
                *counts.entry(acc.to_string()).or_insert(0) += 1;
            }
            Some(_) => log.record_orphan(table),
            None => log.record_corrupt(table),
        }
    }
    counts
}

#[allow(clippy::too_many_arguments)]
fn build_filing(
    accession: &str,
    quarter: QuarterLabel,
    offering: &crate::model::OfferingRow,
    submission: &SubmissionRow,
    issuer: Option<&IssuerRow>,
    related_person_count: u32,
    recipient_count: u32,
    log: &mut QualityLog,
) -> CleanedFiling {
    // Date resolution: strict formats first, then the synthetic quarter date.
    let (filing_date, date_imputed) = match parse_date(submission.filing_date.as_deref()) {
        Some(date) => (date, false),
        None => {
            log.warn(
                quarter,
                Some(TableKind::Submissions),
                IssueKind::DateImputed,
                format!(
                    "unparseable filing date {:?} for {accession}, imputed from {quarter}",
                    submission.filing_date.as_deref().unwrap_or("")
                ),
            );
            (quarter.synthetic_date(), true)
        }
    };

    let is_amendment = submission
        .submission_type
        .as_deref()
        .map(|t| t.to_uppercase().contains("D/A"))
        .unwrap_or_else(|| flag(offering.is_amendment.as_deref()));

    // Fund vs. operating classification.
    let industry = offering.industry_group_type.as_deref();
    let fund_type = offering.investment_fund_type.as_deref().and_then(FundType::parse);
    let is_pooled = industry
        .map(|i| fold_ws(i).eq_ignore_ascii_case("pooled investment fund"))
        .unwrap_or(false)
        || flag(offering.is_pooled_investment_fund.as_deref());
    let is_fund = is_pooled || fund_type.is_some();
    let unclassified =
        industry.is_none() && offering.investment_fund_type.is_none() && !is_fund;
    let class = if is_fund { FilingClass::Fund } else { FilingClass::OperatingCompany };

    let issuer_name = issuer
        .and_then(|i| i.entity_name.clone())
        .unwrap_or_default();
    let state = issuer
        .and_then(|i| i.state_or_country.as_deref())
        .map(|s| s.to_uppercase());
    let region = taxonomy::region_for_state(state.as_deref());

    let sector = taxonomy::map_sector(industry, submission.sic_code.as_deref(), &issuer_name);
    if sector == taxonomy::OTHER_SECTOR && industry.is_some() && !is_fund {
        log.warn(
            quarter,
            Some(TableKind::Offerings),
            IssueKind::SectorUnmapped,
            format!("no sector rule matched {accession} (industry {:?})", industry.unwrap_or("")),
        );
    }

    let total_offering_amount = OfferingAmount::parse(offering.total_offering_amount.as_deref());
    if total_offering_amount == OfferingAmount::Missing {
        log.warn(
            quarter,
            Some(TableKind::Offerings),
            IssueKind::AmountMissing,
            format!("missing total offering amount for {accession}"),
        );
    }
    let total_amount_sold = OfferingAmount::parse(offering.total_amount_sold.as_deref());
    let total_remaining = OfferingAmount::parse(offering.total_remaining.as_deref());
    let deal_size = DealSizeCategory::for_amount(&total_offering_amount);

    let investor_count = parse_count(offering.total_number_already_invested.as_deref());
    let sales_comp = parse_money(offering.sales_commission.as_deref()).unwrap_or(0.0)
        + parse_money(offering.finders_fee.as_deref()).unwrap_or(0.0);

    let entity_type = issuer.and_then(|i| i.entity_type.clone());
    let entity_type_upper = entity_type.as_deref().map(str::to_uppercase).unwrap_or_default();

    CleanedFiling {
        accession: accession.to_string(),
        quarter,
        filing_date,
        date_imputed,
        is_amendment,
        is_follow_on: false, // set by the follow-on pass
        sic_code: submission.sic_code.clone(),
        class,
        fund_type: is_fund.then(|| fund_type.unwrap_or(FundType::Unspecified)),
        unclassified,
        sector: sector.to_string(),
        issuer_name,
        is_us: region != Region::International,
        region,
        state,
        city: issuer.and_then(|i| i.city.clone()),
        is_llc: entity_type_upper.contains("LLC") || entity_type_upper.contains("LIMITED LIABILITY"),
        is_corporation: entity_type_upper.contains("CORPORATION"),
        is_partnership: entity_type_upper.contains("PARTNERSHIP"),
        entity_type,
        incorporation_year: issuer
            .and_then(|i| i.year_of_inc.as_deref())
            .and_then(|y| y.parse::<f64>().ok())
            .map(|y| y as i32),
        total_offering_amount,
        total_amount_sold,
        total_remaining,
        deal_size,
        minimum_investment: parse_money(offering.minimum_investment.as_deref()),
        sale_date: parse_date(offering.sale_date.as_deref()),
        is_equity: flag(offering.is_equity_type.as_deref()),
        is_debt: flag(offering.is_debt_type.as_deref()),
        has_506b: exemption_contains(offering.federal_exemptions.as_deref(), "06B"),
        has_506c: exemption_contains(offering.federal_exemptions.as_deref(), "06C"),
        investor_count,
        investor_bucket: InvestorBucket::for_count(investor_count),
        has_non_accredited: flag(offering.has_non_accredited_investors.as_deref()),
        has_placement_agent: recipient_count > 0 || sales_comp > 0.0,
        related_person_count,
        multiple_related_persons: related_person_count > 1,
    }
}

/// A filing is a follow-on when another filing for the same issuer name and
/// state carries a strictly earlier filing date. Amendments are independent.
fn flag_follow_ons(rows: &mut [CleanedFiling]) {
    let mut by_issuer: HashMap<(String, String), Vec<usize>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        if row.issuer_name.is_empty() {
            continue;
        }
        by_issuer.entry(row.issuer_key()).or_default().push(idx);
    }
    for indexes in by_issuer.values() {
        if indexes.len() < 2 {
            continue;
        }
        let Some(earliest) = indexes.iter().map(|&i| rows[i].filing_date).min() else {
            continue;
        };
        for &idx in indexes {
            if rows[idx].filing_date > earliest {
                rows[idx].is_follow_on = true;
            }
        }
    }
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn fold_ws(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_money(raw: Option<&str>) -> Option<f64> {
    raw?.replace(',', "").trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_count(raw: Option<&str>) -> u32 {
    parse_money(raw).filter(|v| *v >= 0.0).map(|v| v as u32).unwrap_or(0)
}

fn exemption_contains(raw: Option<&str>, item: &str) -> bool {
    raw.is_some_and(|list| list.to_uppercase().contains(item))
}
