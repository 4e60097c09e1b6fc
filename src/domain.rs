use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// A source quarter tag like `2024Q1`, derived from the directory a row was
/// loaded from. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuarterLabel {
    pub year: i32,
    pub quarter: u8,
}

impl QuarterLabel {
    pub fn new(year: i32, quarter: u8) -> Option<Self> {
        if (1..=4).contains(&quarter) && (1900..=2999).contains(&year) {
            Some(Self { year, quarter })
        } else {
            None
        }
    }

    /// Middle month of the quarter (Q1 -> Feb, Q2 -> May, ...).
    pub fn middle_month(&self) -> u32 {
        (self.quarter as u32 - 1) * 3 + 2
    }

    /// Synthetic filing date used when the raw date is unparseable: the first
    /// day of the quarter's middle month.
    pub fn synthetic_date(&self) -> NaiveDate {
        // Month is always 2, 5, 8, or 11, so this cannot fail.
        NaiveDate::from_ymd_opt(self.year, self.middle_month(), 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// All quarters from `start` through `end` inclusive, in chronological order.
    pub fn range(start: QuarterLabel, end: QuarterLabel) -> Vec<QuarterLabel> {
        let mut out = Vec::new();
        let mut cur = start;
        while cur <= end {
            out.push(cur);
            cur = if cur.quarter == 4 {
                QuarterLabel { year: cur.year + 1, quarter: 1 }
            } else {
                QuarterLabel { year: cur.year, quarter: cur.quarter + 1 }
            };
        }
        out
    }
}

impl fmt::Display for QuarterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for QuarterLabel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PipelineError::QuarterLabel(s.to_string());
        let (year, quarter) = s.trim().split_once(['Q', 'q']).ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let quarter: u8 = quarter.parse().map_err(|_| err())?;
        QuarterLabel::new(year, quarter).ok_or_else(err)
    }
}

impl TryFrom<String> for QuarterLabel {
    type Error = PipelineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<QuarterLabel> for String {
    fn from(q: QuarterLabel) -> Self {
        q.to_string()
    }
}

/// Fund vs. operating-company classification. Every cleaned filing carries
/// exactly one of these; unclassifiable rows become operating companies with
/// the `unclassified` flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilingClass {
    Fund,
    OperatingCompany,
}

/// Pooled-investment-fund sub-type from the offering record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundType {
    HedgeFund,
    PrivateEquityFund,
    VentureCapitalFund,
    OtherInvestmentFund,
    Unspecified,
}

impl FundType {
    /// Matches the Form D `INVESTMENTFUNDTYPE` values, tolerant of case and
    /// stray whitespace.
    pub fn parse(raw: &str) -> Option<FundType> {
        let folded: String = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        match folded.as_str() {
            "hedge fund" => Some(FundType::HedgeFund),
            "private equity fund" => Some(FundType::PrivateEquityFund),
            "venture capital fund" => Some(FundType::VentureCapitalFund),
            "other investment fund" => Some(FundType::OtherInvestmentFund),
            _ => None,
        }
    }
}

/// Deal-size buckets in ascending amount order. `Unknown` collects missing,
/// indefinite, zero, and negative amounts and is never comparable credit-wise
/// with the sized buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DealSizeCategory {
    Unknown,
    Micro,
    Seed,
    SeriesA,
    SeriesB,
    SeriesC,
    Growth,
    Large,
}

impl DealSizeCategory {
    const BINS: [(DealSizeCategory, f64, f64); 7] = [
        (DealSizeCategory::Micro, 0.0, 1_000_000.0),
        (DealSizeCategory::Seed, 1_000_000.0, 5_000_000.0),
        (DealSizeCategory::SeriesA, 5_000_000.0, 10_000_000.0),
        (DealSizeCategory::SeriesB, 10_000_000.0, 25_000_000.0),
        (DealSizeCategory::SeriesC, 25_000_000.0, 50_000_000.0),
        (DealSizeCategory::Growth, 50_000_000.0, 100_000_000.0),
        (DealSizeCategory::Large, 100_000_000.0, f64::INFINITY),
    ];

    /// Buckets a parsed offering amount. Missing and indefinite amounts map to
    /// `Unknown`, as do zero and negative values.
    pub fn for_amount(amount: &OfferingAmount) -> DealSizeCategory {
        let value = match amount {
            OfferingAmount::Value(v) if *v > 0.0 => *v,
            _ => return DealSizeCategory::Unknown,
        };
        for (category, lower, upper) in Self::BINS {
            if value >= lower && value < upper {
                return category;
            }
        }
        DealSizeCategory::Unknown
    }

    /// Position in the bucket ordering, used for sweet-spot distance. `None`
    /// for `Unknown`, which has no place on the size axis.
    pub fn ordinal(&self) -> Option<u8> {
        match self {
            DealSizeCategory::Unknown => None,
            DealSizeCategory::Micro => Some(0),
            DealSizeCategory::Seed => Some(1),
            DealSizeCategory::SeriesA => Some(2),
            DealSizeCategory::SeriesB => Some(3),
            DealSizeCategory::SeriesC => Some(4),
            DealSizeCategory::Growth => Some(5),
            DealSizeCategory::Large => Some(6),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DealSizeCategory::Unknown => "Unknown",
            DealSizeCategory::Micro => "Micro (<$1M)",
            DealSizeCategory::Seed => "Seed ($1-5M)",
            DealSizeCategory::SeriesA => "Series A ($5-10M)",
            DealSizeCategory::SeriesB => "Series B ($10-25M)",
            DealSizeCategory::SeriesC => "Series C ($25-50M)",
            DealSizeCategory::Growth => "Growth ($50-100M)",
            DealSizeCategory::Large => "Large ($100M+)",
        }
    }
}

impl fmt::Display for DealSizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A monetary field from the offering record. Form D reports "Indefinite" for
/// uncapped raises; that is a real answer, distinct from a blank field, and
/// the distinction is preserved here even though both bucket to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OfferingAmount {
    Value(f64),
    Indefinite,
    Missing,
}

impl OfferingAmount {
    const INDEFINITE_VALUES: [&'static str; 2] = ["INDEFINITE", "UNLIMITED"];

    /// Parses a raw amount field. Commas are stripped; indefinite sentinels
    /// and unparseable text map to their own variants rather than zero.
    pub fn parse(raw: Option<&str>) -> OfferingAmount {
        let raw = match raw {
            Some(r) if !r.trim().is_empty() => r.trim(),
            _ => return OfferingAmount::Missing,
        };
        let upper = raw.to_uppercase();
        if Self::INDEFINITE_VALUES.contains(&upper.as_str()) {
            return OfferingAmount::Indefinite;
        }
        match raw.replace(',', "").parse::<f64>() {
            Ok(v) if v.is_finite() => OfferingAmount::Value(v),
            _ => OfferingAmount::Missing,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            OfferingAmount::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// Investor-count buckets used by the momentum and quality sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InvestorBucket {
    None,
    Few,
    Some,
    Many,
}

impl InvestorBucket {
    pub fn for_count(count: u32) -> InvestorBucket {
        match count {
            0 => InvestorBucket::None,
            1..=2 => InvestorBucket::Few,
            3..=9 => InvestorBucket::Some,
            _ => InvestorBucket::Many,
        }
    }
}

/// Coarse US region grouping; anything without a mapped state is
/// `International`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    WestCoast,
    Northeast,
    Southeast,
    Midwest,
    Southwest,
    MountainWest,
    Pacific,
    International,
}

impl Region {
    pub fn label(&self) -> &'static str {
        match self {
            Region::WestCoast => "West Coast",
            Region::Northeast => "Northeast",
            Region::Southeast => "Southeast",
            Region::Midwest => "Midwest",
            Region::Southwest => "Southwest",
            Region::MountainWest => "Mountain West",
            Region::Pacific => "Pacific",
            Region::International => "International",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One analysis-ready Form D filing: the offering joined with its submission
/// metadata, primary issuer, and per-filing quality signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanedFiling {
    pub accession: String,
    pub quarter: QuarterLabel,

    // Filing metadata
    pub filing_date: NaiveDate,
    pub date_imputed: bool,
    pub is_amendment: bool,
    pub is_follow_on: bool,
    pub sic_code: Option<String>,

    // Classification
    pub class: FilingClass,
    pub fund_type: Option<FundType>,
    pub unclassified: bool,
    pub sector: String,

    // Issuer
    pub issuer_name: String,
    pub state: Option<String>,
    pub region: Region,
    pub is_us: bool,
    pub city: Option<String>,
    pub entity_type: Option<String>,
    pub is_llc: bool,
    pub is_corporation: bool,
    pub is_partnership: bool,
    pub incorporation_year: Option<i32>,

    // Offering terms
    pub total_offering_amount: OfferingAmount,
    pub total_amount_sold: OfferingAmount,
    pub total_remaining: OfferingAmount,
    pub deal_size: DealSizeCategory,
    pub minimum_investment: Option<f64>,
    pub sale_date: Option<NaiveDate>,
    pub is_equity: bool,
    pub is_debt: bool,
    pub has_506b: bool,
    pub has_506c: bool,

    // Quality signals
    pub investor_count: u32,
    pub investor_bucket: InvestorBucket,
    pub has_non_accredited: bool,
    pub has_placement_agent: bool,
    pub related_person_count: u32,
    pub multiple_related_persons: bool,
}

impl CleanedFiling {
    /// Key used to group an issuer's filing history for follow-on detection
    /// and momentum scoring.
    pub fn issuer_key(&self) -> (String, String) {
        (
            self.issuer_name.to_uppercase(),
            self.state.clone().unwrap_or_default(),
        )
    }
}
