//! Raw Form D table rows exactly as they appear in the quarterly TSV
//! datasets. Every field is an optional string: column sets drift between
//! years, so nothing here is required and all typing happens in the cleaner.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::QuarterLabel;

/// Trims a raw TSV field and turns blanks into `None` at deserialization
/// time, so downstream code never sees padded or empty strings.
fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// A raw row annotated with the quarter directory it was loaded from, so
/// provenance survives concatenation across quarters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub quarter: QuarterLabel,
    pub row: T,
}

impl<T> Sourced<T> {
    pub fn new(quarter: QuarterLabel, row: T) -> Self {
        Self { quarter, row }
    }
}

/// `FORMDSUBMISSION.tsv` — one row per filing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionRow {
    #[serde(rename = "ACCESSIONNUMBER", default, deserialize_with = "trimmed")]
    pub accession_number: Option<String>,
    #[serde(rename = "SUBMISSIONTYPE", default, deserialize_with = "trimmed")]
    pub submission_type: Option<String>,
    #[serde(rename = "FILING_DATE", default, deserialize_with = "trimmed")]
    pub filing_date: Option<String>,
    #[serde(rename = "SIC_CODE", default, deserialize_with = "trimmed")]
    pub sic_code: Option<String>,
    #[serde(rename = "CIK", default, deserialize_with = "trimmed")]
    pub cik: Option<String>,
    #[serde(rename = "SCHEMAVERSION", default, deserialize_with = "trimmed")]
    pub schema_version: Option<String>,
    #[serde(rename = "TESTORLIVE", default, deserialize_with = "trimmed")]
    pub test_or_live: Option<String>,
}

/// `ISSUERS.tsv` — one or more issuers per filing; exactly one should carry
/// the primary-issuer flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssuerRow {
    #[serde(rename = "ACCESSIONNUMBER", default, deserialize_with = "trimmed")]
    pub accession_number: Option<String>,
    #[serde(rename = "IS_PRIMARYISSUER_FLAG", default, deserialize_with = "trimmed")]
    pub is_primary_issuer: Option<String>,
    #[serde(rename = "ENTITYNAME", default, deserialize_with = "trimmed")]
    pub entity_name: Option<String>,
    #[serde(rename = "CITY", default, deserialize_with = "trimmed")]
    pub city: Option<String>,
    #[serde(rename = "STATEORCOUNTRY", default, deserialize_with = "trimmed")]
    pub state_or_country: Option<String>,
    #[serde(rename = "ZIPCODE", default, deserialize_with = "trimmed")]
    pub zip_code: Option<String>,
    #[serde(rename = "ENTITYTYPE", default, deserialize_with = "trimmed")]
    pub entity_type: Option<String>,
    #[serde(rename = "JURISDICTIONOFINC", default, deserialize_with = "trimmed")]
    pub jurisdiction_of_inc: Option<String>,
    #[serde(rename = "YEAROFINC_VALUE_ENTERED", default, deserialize_with = "trimmed")]
    pub year_of_inc: Option<String>,
}

/// `OFFERING.tsv` — the capital-raise terms; the driving table for analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferingRow {
    #[serde(rename = "ACCESSIONNUMBER", default, deserialize_with = "trimmed")]
    pub accession_number: Option<String>,
    #[serde(rename = "INDUSTRYGROUPTYPE", default, deserialize_with = "trimmed")]
    pub industry_group_type: Option<String>,
    #[serde(rename = "INVESTMENTFUNDTYPE", default, deserialize_with = "trimmed")]
    pub investment_fund_type: Option<String>,
    #[serde(rename = "ISPOOLEDINVESTMENTFUNDTYPE", default, deserialize_with = "trimmed")]
    pub is_pooled_investment_fund: Option<String>,
    #[serde(rename = "FEDERALEXEMPTIONS_ITEMS_LIST", default, deserialize_with = "trimmed")]
    pub federal_exemptions: Option<String>,
    #[serde(rename = "ISAMENDMENT", default, deserialize_with = "trimmed")]
    pub is_amendment: Option<String>,
    #[serde(rename = "PREVIOUSACCESSIONNUMBER", default, deserialize_with = "trimmed")]
    pub previous_accession_number: Option<String>,
    #[serde(rename = "SALE_DATE", default, deserialize_with = "trimmed")]
    pub sale_date: Option<String>,
    #[serde(rename = "YETTOOCCUR", default, deserialize_with = "trimmed")]
    pub sale_yet_to_occur: Option<String>,
    #[serde(rename = "ISEQUITYTYPE", default, deserialize_with = "trimmed")]
    pub is_equity_type: Option<String>,
    #[serde(rename = "ISDEBTTYPE", default, deserialize_with = "trimmed")]
    pub is_debt_type: Option<String>,
    #[serde(rename = "MINIMUMINVESTMENTACCEPTED", default, deserialize_with = "trimmed")]
    pub minimum_investment: Option<String>,
    #[serde(rename = "TOTALOFFERINGAMOUNT", default, deserialize_with = "trimmed")]
    pub total_offering_amount: Option<String>,
    #[serde(rename = "TOTALAMOUNTSOLD", default, deserialize_with = "trimmed")]
    pub total_amount_sold: Option<String>,
    #[serde(rename = "TOTALREMAINING", default, deserialize_with = "trimmed")]
    pub total_remaining: Option<String>,
    #[serde(rename = "HASNONACCREDITEDINVESTORS", default, deserialize_with = "trimmed")]
    pub has_non_accredited_investors: Option<String>,
    #[serde(rename = "TOTALNUMBERALREADYINVESTED", default, deserialize_with = "trimmed")]
    pub total_number_already_invested: Option<String>,
    #[serde(rename = "SALESCOMM_DOLLARAMOUNT", default, deserialize_with = "trimmed")]
    pub sales_commission: Option<String>,
    #[serde(rename = "FINDERSFEE_DOLLARAMOUNT", default, deserialize_with = "trimmed")]
    pub finders_fee: Option<String>,
}

/// `RELATEDPERSONS.tsv` — directors, officers, and promoters; many per filing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelatedPersonRow {
    #[serde(rename = "ACCESSIONNUMBER", default, deserialize_with = "trimmed")]
    pub accession_number: Option<String>,
    #[serde(rename = "FIRSTNAME", default, deserialize_with = "trimmed")]
    pub first_name: Option<String>,
    #[serde(rename = "LASTNAME", default, deserialize_with = "trimmed")]
    pub last_name: Option<String>,
    #[serde(rename = "RELATIONSHIP_1", default, deserialize_with = "trimmed")]
    pub relationship: Option<String>,
}

/// `RECIPIENTS.tsv` — sales-compensation recipients (placement agents and
/// brokers); zero or more per filing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipientRow {
    #[serde(rename = "ACCESSIONNUMBER", default, deserialize_with = "trimmed")]
    pub accession_number: Option<String>,
    #[serde(rename = "RECIPIENTNAME", default, deserialize_with = "trimmed")]
    pub recipient_name: Option<String>,
    #[serde(rename = "RECIPIENTCRDNUMBER", default, deserialize_with = "trimmed")]
    pub recipient_crd_number: Option<String>,
    #[serde(rename = "STATESOFSOLICITATIONLIST", default, deserialize_with = "trimmed")]
    pub states_of_solicitation: Option<String>,
}

/// `SIGNATURES.tsv` — filing signatures; loaded for completeness of the raw
/// dataset but not used by the analysis tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignatureRow {
    #[serde(rename = "ACCESSIONNUMBER", default, deserialize_with = "trimmed")]
    pub accession_number: Option<String>,
    #[serde(rename = "NAMEOFSIGNER", default, deserialize_with = "trimmed")]
    pub name_of_signer: Option<String>,
    #[serde(rename = "SIGNATURETITLE", default, deserialize_with = "trimmed")]
    pub signature_title: Option<String>,
    #[serde(rename = "SIGNATUREDATE", default, deserialize_with = "trimmed")]
    pub signature_date: Option<String>,
}
