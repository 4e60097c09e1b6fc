//! Static taxonomy tables: the sector rule list, state-to-region grouping,
//! and the tech-keyword patterns used when industry codes are silent.
//!
//! The sector mapping is an ordered list of (matcher, sector) pairs evaluated
//! first-match-wins, defaulting to "Other". Keeping it as data means a thesis
//! change edits a table, not the cleaner.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::Region;

/// The twelve canonical sectors plus the catch-all.
pub const SECTORS: [&str; 13] = [
    "Enterprise Software",
    "Data & Analytics",
    "Hardware",
    "Telecommunications",
    "Fintech",
    "Insurtech",
    "Healthcare",
    "Healthcare IT",
    "Biotech",
    "Energy",
    "Consumer",
    "Industrial",
    "Other",
];

pub const OTHER_SECTOR: &str = "Other";

/// How a single sector rule matches a filing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectorMatcher {
    /// Exact Form D `INDUSTRYGROUPTYPE` value (case-insensitive).
    IndustryGroup(&'static str),
    /// Exact four-digit SIC code from the submission record.
    SicCode(&'static str),
    /// Uppercase substring of the issuer's entity name.
    NameKeyword(&'static str),
}

/// One ordered mapping rule.
#[derive(Debug, Clone)]
pub struct SectorRule {
    pub matcher: SectorMatcher,
    pub sector: &'static str,
}

const fn rule(matcher: SectorMatcher, sector: &'static str) -> SectorRule {
    SectorRule { matcher, sector }
}

/// Ordered rule list: industry-group names first (the most direct signal),
/// then SIC codes, then entity-name keywords as a last resort.
pub static SECTOR_RULES: Lazy<Vec<SectorRule>> = Lazy::new(|| {
    use SectorMatcher::*;
    vec![
        // Industry group names
        rule(IndustryGroup("Computers"), "Enterprise Software"),
        rule(IndustryGroup("Computer Software"), "Enterprise Software"),
        rule(IndustryGroup("Technology"), "Enterprise Software"),
        rule(IndustryGroup("Other Technology"), "Enterprise Software"),
        rule(IndustryGroup("Internet and Information Services"), "Enterprise Software"),
        rule(IndustryGroup("Telecommunications"), "Telecommunications"),
        rule(IndustryGroup("Electronics"), "Hardware"),
        rule(IndustryGroup("Banking and Financial Services"), "Fintech"),
        rule(IndustryGroup("Commercial Banking"), "Fintech"),
        rule(IndustryGroup("Investing"), "Fintech"),
        rule(IndustryGroup("Insurance"), "Insurtech"),
        rule(IndustryGroup("Health Care"), "Healthcare"),
        rule(IndustryGroup("Hospitals and Physicians"), "Healthcare"),
        rule(IndustryGroup("Biotechnology"), "Biotech"),
        rule(IndustryGroup("Pharmaceuticals"), "Biotech"),
        rule(IndustryGroup("Energy"), "Energy"),
        rule(IndustryGroup("Oil and Gas"), "Energy"),
        rule(IndustryGroup("Electric Utilities"), "Energy"),
        rule(IndustryGroup("Retailing"), "Consumer"),
        rule(IndustryGroup("Restaurants"), "Consumer"),
        rule(IndustryGroup("Consumer Services"), "Consumer"),
        rule(IndustryGroup("Travel"), "Consumer"),
        rule(IndustryGroup("Manufacturing"), "Industrial"),
        rule(IndustryGroup("Transportation"), "Industrial"),
        rule(IndustryGroup("Construction"), "Industrial"),
        rule(IndustryGroup("Agriculture"), "Industrial"),
        // SIC codes: software and data processing (737x)
        rule(SicCode("7370"), "Enterprise Software"),
        rule(SicCode("7371"), "Enterprise Software"),
        rule(SicCode("7372"), "Enterprise Software"),
        rule(SicCode("7373"), "Enterprise Software"),
        rule(SicCode("7374"), "Data & Analytics"),
        rule(SicCode("7375"), "Enterprise Software"),
        // Computer hardware (357x) and communications equipment
        rule(SicCode("3571"), "Hardware"),
        rule(SicCode("3572"), "Hardware"),
        rule(SicCode("3576"), "Hardware"),
        rule(SicCode("3577"), "Hardware"),
        rule(SicCode("3661"), "Telecommunications"),
        rule(SicCode("4813"), "Telecommunications"),
        // Finance
        rule(SicCode("6022"), "Fintech"),
        rule(SicCode("6036"), "Fintech"),
        rule(SicCode("6211"), "Fintech"),
        rule(SicCode("6282"), "Fintech"),
        rule(SicCode("6311"), "Insurtech"),
        // Healthcare and life sciences
        rule(SicCode("8000"), "Healthcare"),
        rule(SicCode("8011"), "Healthcare"),
        rule(SicCode("8060"), "Healthcare"),
        rule(SicCode("8071"), "Healthcare IT"),
        rule(SicCode("2834"), "Biotech"),
        rule(SicCode("2836"), "Biotech"),
        rule(SicCode("3841"), "Healthcare"),
        rule(SicCode("3845"), "Healthcare"),
        // Energy
        rule(SicCode("1311"), "Energy"),
        rule(SicCode("1381"), "Energy"),
        rule(SicCode("4911"), "Energy"),
        rule(SicCode("4922"), "Energy"),
        // Entity-name keywords (uppercase substring match)
        rule(NameKeyword("MACHINE LEARNING"), "Data & Analytics"),
        rule(NameKeyword("ARTIFICIAL INTELLIGENCE"), "Data & Analytics"),
        rule(NameKeyword("DEEP LEARNING"), "Data & Analytics"),
        rule(NameKeyword("DATA SCIENCE"), "Data & Analytics"),
        rule(NameKeyword("ANALYTICS"), "Data & Analytics"),
        rule(NameKeyword("CYBERSECURITY"), "Enterprise Software"),
        rule(NameKeyword("CYBER SECURITY"), "Enterprise Software"),
        rule(NameKeyword("SOFTWARE"), "Enterprise Software"),
        rule(NameKeyword("SAAS"), "Enterprise Software"),
        rule(NameKeyword("CLOUD"), "Enterprise Software"),
        rule(NameKeyword("DEVOPS"), "Enterprise Software"),
        rule(NameKeyword("FINTECH"), "Fintech"),
        rule(NameKeyword("INSURTECH"), "Insurtech"),
        rule(NameKeyword("TELEHEALTH"), "Healthcare IT"),
        rule(NameKeyword("DIGITAL HEALTH"), "Healthcare IT"),
        rule(NameKeyword("HEALTHTECH"), "Healthcare IT"),
        rule(NameKeyword("MEDTECH"), "Healthcare"),
        rule(NameKeyword("THERAPEUTICS"), "Biotech"),
        rule(NameKeyword("BIOSCIENCES"), "Biotech"),
        rule(NameKeyword("GENOMICS"), "Biotech"),
        rule(NameKeyword("SOLAR"), "Energy"),
        rule(NameKeyword("ROBOTIC"), "Industrial"),
    ]
});

/// Standalone "AI" token in an entity name. Word-bounded so CHAIR, REPAIR,
/// CERTAIN and friends do not match.
static AI_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bAI\b").expect("static AI token pattern"));

/// Name fragments that defeat the standalone-AI signal: fund and holding
/// vehicles that happen to contain the token.
const AI_FALSE_POSITIVES: [&str; 5] = ["CAPITAL", "FUND", "VENTURE", "PARTNER", "HOLDINGS"];

/// Maps a filing to its canonical sector. Rules are tried in order and the
/// first match wins; anything unmatched lands in "Other".
pub fn map_sector(
    industry_group: Option<&str>,
    sic_code: Option<&str>,
    entity_name: &str,
) -> &'static str {
    let industry = industry_group.map(|s| s.trim().to_lowercase());
    let sic = sic_code.map(str::trim);
    let name_upper = entity_name.to_uppercase();

    for rule in SECTOR_RULES.iter() {
        let hit = match &rule.matcher {
            SectorMatcher::IndustryGroup(g) => {
                industry.as_deref() == Some(g.to_lowercase().as_str())
            }
            SectorMatcher::SicCode(code) => sic == Some(*code),
            SectorMatcher::NameKeyword(kw) => name_upper.contains(kw),
        };
        if hit {
            return rule.sector;
        }
    }

    if AI_TOKEN.is_match(&name_upper)
        && !AI_FALSE_POSITIVES.iter().any(|fp| name_upper.contains(fp))
    {
        return "Data & Analytics";
    }

    OTHER_SECTOR
}

/// State code to region grouping for US filings.
pub static STATE_TO_REGION: Lazy<HashMap<&'static str, Region>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for state in ["CA", "OR", "WA"] {
        m.insert(state, Region::WestCoast);
    }
    for state in ["NY", "MA", "CT", "NJ", "PA", "NH", "VT", "RI", "ME"] {
        m.insert(state, Region::Northeast);
    }
    for state in [
        "FL", "GA", "NC", "SC", "VA", "TN", "AL", "MS", "LA", "AR", "KY", "WV", "DE", "MD", "DC",
    ] {
        m.insert(state, Region::Southeast);
    }
    for state in ["IL", "OH", "MI", "IN", "WI", "MN", "IA", "MO", "KS", "NE", "SD", "ND"] {
        m.insert(state, Region::Midwest);
    }
    for state in ["TX", "AZ", "NM", "OK"] {
        m.insert(state, Region::Southwest);
    }
    for state in ["CO", "UT", "NV", "ID", "MT", "WY"] {
        m.insert(state, Region::MountainWest);
    }
    for state in ["HI", "AK"] {
        m.insert(state, Region::Pacific);
    }
    m
});

/// Region for a (possibly missing) state code; unmapped codes are treated as
/// international filings.
pub fn region_for_state(state: Option<&str>) -> Region {
    state
        .map(|s| s.trim().to_uppercase())
        .and_then(|s| STATE_TO_REGION.get(s.as_str()).copied())
        .unwrap_or(Region::International)
}
