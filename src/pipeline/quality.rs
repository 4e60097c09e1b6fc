//! Structured data-quality surface of the pipeline. Row-level problems never
//! abort a run; they land here as `(quarter, file, issue)` records plus
//! aggregated drop counters, and an external report writer renders them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::QuarterLabel;

/// The six fixed-name tables of a quarterly Form D dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Submissions,
    Issuers,
    Offerings,
    Recipients,
    RelatedPersons,
    Signatures,
}

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        TableKind::Submissions,
        TableKind::Issuers,
        TableKind::Offerings,
        TableKind::Recipients,
        TableKind::RelatedPersons,
        TableKind::Signatures,
    ];

    /// Fixed file name inside a quarter directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            TableKind::Submissions => "FORMDSUBMISSION.tsv",
            TableKind::Issuers => "ISSUERS.tsv",
            TableKind::Offerings => "OFFERING.tsv",
            TableKind::Recipients => "RECIPIENTS.tsv",
            TableKind::RelatedPersons => "RELATEDPERSONS.tsv",
            TableKind::Signatures => "SIGNATURES.tsv",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// What went wrong for a warning record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    /// No directory layout matched the quarter label.
    QuarterUnresolved,
    /// The quarter directory exists but one of the six files does not.
    FileMissing,
    /// A TSV record failed to deserialize and was skipped.
    MalformedRecord,
    /// The filing date was unparseable and replaced with a synthetic date.
    DateImputed,
    /// No sector rule matched a filing with industry data present.
    SectorUnmapped,
    /// The total offering amount was absent or unparseable.
    AmountMissing,
}

/// One structured data-quality warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityWarning {
    pub quarter: QuarterLabel,
    pub file: Option<TableKind>,
    pub kind: IssueKind,
    pub detail: String,
}

/// Accumulates warnings and aggregated drop counts across a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityLog {
    pub warnings: Vec<QualityWarning>,
    /// Child rows dropped because their accession number had no matching
    /// submission. Reported once per table, not per row.
    pub orphans_dropped: BTreeMap<TableKind, usize>,
    /// Rows dropped because every identifying field was missing.
    pub corrupt_dropped: BTreeMap<TableKind, usize>,
}

impl QualityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(
        &mut self,
        quarter: QuarterLabel,
        file: Option<TableKind>,
        kind: IssueKind,
        detail: impl Into<String>,
    ) {
        self.warnings.push(QualityWarning { quarter, file, kind, detail: detail.into() });
    }

    pub fn record_orphan(&mut self, table: TableKind) {
        *self.orphans_dropped.entry(table).or_insert(0) += 1;
    }

    pub fn record_corrupt(&mut self, table: TableKind) {
        *self.corrupt_dropped.entry(table).or_insert(0) += 1;
    }

    pub fn count_of(&self, kind: IssueKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    pub fn orphan_total(&self) -> usize {
        self.orphans_dropped.values().sum()
    }

    /// Plain-text summary for the data-quality report.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Data quality warnings: {}", self.warnings.len()));
        for kind in [
            IssueKind::QuarterUnresolved,
            IssueKind::FileMissing,
            IssueKind::MalformedRecord,
            IssueKind::DateImputed,
            IssueKind::SectorUnmapped,
            IssueKind::AmountMissing,
        ] {
            let count = self.count_of(kind);
            if count > 0 {
                lines.push(format!("  {kind:?}: {count}"));
            }
        }
        if !self.orphans_dropped.is_empty() {
            lines.push("Orphaned child rows dropped:".to_string());
            for (table, count) in &self.orphans_dropped {
                lines.push(format!("  {table}: {count}"));
            }
        }
        if !self.corrupt_dropped.is_empty() {
            lines.push("Corrupt rows dropped:".to_string());
            for (table, count) in &self.corrupt_dropped {
                lines.push(format!("  {table}: {count}"));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(label: &str) -> QuarterLabel {
        label.parse().unwrap()
    }

    #[test]
    fn warnings_are_countable_by_kind() {
        let mut log = QualityLog::new();
        log.warn(q("2024Q1"), Some(TableKind::Submissions), IssueKind::DateImputed, "acc-1");
        log.warn(q("2024Q1"), Some(TableKind::Submissions), IssueKind::DateImputed, "acc-2");
        log.warn(q("2024Q2"), None, IssueKind::QuarterUnresolved, "2024Q2");

        assert_eq!(log.count_of(IssueKind::DateImputed), 2);
        assert_eq!(log.count_of(IssueKind::QuarterUnresolved), 1);
        assert_eq!(log.count_of(IssueKind::FileMissing), 0);
    }

    #[test]
    fn orphan_counts_aggregate_per_table() {
        let mut log = QualityLog::new();
        log.record_orphan(TableKind::Offerings);
        log.record_orphan(TableKind::Offerings);
        log.record_orphan(TableKind::Recipients);

        assert_eq!(log.orphans_dropped.get(&TableKind::Offerings), Some(&2));
        assert_eq!(log.orphan_total(), 3);
    }

    #[test]
    fn summary_mentions_every_populated_section() {
        let mut log = QualityLog::new();
        log.warn(q("2024Q1"), Some(TableKind::Offerings), IssueKind::AmountMissing, "acc-9");
        log.record_orphan(TableKind::RelatedPersons);

        let summary = log.summary();
        assert!(summary.contains("AmountMissing: 1"));
        assert!(summary.contains("RELATEDPERSONS.tsv: 1"));
    }
}
