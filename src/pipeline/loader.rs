//! Multi-format loader for the quarterly Form D datasets.
//!
//! The published archives have used three incompatible directory layouts over
//! the years. Each layout is a pure path-template resolver tried in fixed
//! priority order; adding a fourth layout is a one-line extension of
//! `LAYOUTS`. Per-quarter problems are recorded as warnings and never abort
//! the run. Only a bad root path or a fully unresolvable quarter set is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::domain::QuarterLabel;
use crate::error::{PipelineError, Result};
use crate::model::{
    IssuerRow, OfferingRow, RecipientRow, RelatedPersonRow, SignatureRow, Sourced, SubmissionRow,
};
use crate::pipeline::quality::{IssueKind, QualityLog, TableKind};

/// A pure path-template attempt: `(root, quarter) -> candidate directory`.
type LayoutResolver = fn(&Path, QuarterLabel) -> PathBuf;

fn double_nested(root: &Path, q: QuarterLabel) -> PathBuf {
    // Archive extracted into a folder of its own name: 2024Q1_d/2024Q1_d/.
    root.join(format!("{q}_d")).join(format!("{q}_d"))
}

fn year_nested(root: &Path, q: QuarterLabel) -> PathBuf {
    root.join(q.year.to_string()).join(format!("{q}_d"))
}

fn flat(root: &Path, q: QuarterLabel) -> PathBuf {
    root.join(format!("{q}_d"))
}

/// Layouts in resolution priority order; first existing directory wins.
const LAYOUTS: [(&str, LayoutResolver); 3] = [
    ("double-nested", double_nested),
    ("year-nested", year_nested),
    ("flat", flat),
];

/// Resolves the on-disk directory for a quarter, or `None` when no layout
/// matches.
pub fn resolve_quarter_dir(root: &Path, quarter: QuarterLabel) -> Option<PathBuf> {
    for (name, resolver) in LAYOUTS {
        let candidate = resolver(root, quarter);
        if candidate.is_dir() {
            debug!(quarter = %quarter, layout = name, path = %candidate.display(), "resolved quarter directory");
            return Some(candidate);
        }
    }
    None
}

/// The six concatenated raw tables, each row tagged with its source quarter.
#[derive(Debug, Default)]
pub struct RawTables {
    pub submissions: Vec<Sourced<SubmissionRow>>,
    pub issuers: Vec<Sourced<IssuerRow>>,
    pub offerings: Vec<Sourced<OfferingRow>>,
    pub recipients: Vec<Sourced<RecipientRow>>,
    pub related_persons: Vec<Sourced<RelatedPersonRow>>,
    pub signatures: Vec<Sourced<SignatureRow>>,
}

/// Loads and concatenates the quarterly TSV files for a configured set of
/// quarter labels.
pub struct FormDLoader {
    root: PathBuf,
    quarters: Vec<QuarterLabel>,
}

impl FormDLoader {
    pub fn new(root: impl Into<PathBuf>, quarters: Vec<QuarterLabel>) -> Self {
        Self { root: root.into(), quarters }
    }

    /// Loads every resolvable quarter. Missing quarters and missing files are
    /// recorded in `log`; the only fatal outcomes are an invalid root and an
    /// empty quarter set or zero resolvable quarters.
    pub fn load(&self, log: &mut QualityLog) -> Result<RawTables> {
        if !self.root.is_dir() {
            return Err(PipelineError::InvalidRoot(self.root.clone()));
        }
        if self.quarters.is_empty() {
            return Err(PipelineError::Config("no quarters requested".to_string()));
        }

        let mut tables = RawTables::default();
        let mut resolved = 0usize;

        for &quarter in &self.quarters {
            let Some(dir) = resolve_quarter_dir(&self.root, quarter) else {
                warn!(quarter = %quarter, "no directory layout matched; skipping quarter");
                log.warn(
                    quarter,
                    None,
                    IssueKind::QuarterUnresolved,
                    format!("no directory found for {quarter}"),
                );
                continue;
            };
            resolved += 1;
            self.load_quarter(&dir, quarter, &mut tables, log)?;
        }

        if resolved == 0 {
            return Err(PipelineError::NoQuartersResolved {
                root: self.root.clone(),
                requested: self.quarters.len(),
            });
        }

        info!(
            quarters = resolved,
            submissions = tables.submissions.len(),
            issuers = tables.issuers.len(),
            offerings = tables.offerings.len(),
            "loaded raw Form D tables"
        );
        Ok(tables)
    }

    fn load_quarter(
        &self,
        dir: &Path,
        quarter: QuarterLabel,
        tables: &mut RawTables,
        log: &mut QualityLog,
    ) -> Result<()> {
        for table in TableKind::ALL {
            let path = dir.join(table.file_name());
            if !path.is_file() {
                log.warn(
                    quarter,
                    Some(table),
                    IssueKind::FileMissing,
                    format!("{} missing under {}", table.file_name(), dir.display()),
                );
                continue;
            }
            match table {
                TableKind::Submissions => {
                    read_table(&path, quarter, table, &mut tables.submissions, log)?
                }
                TableKind::Issuers => read_table(&path, quarter, table, &mut tables.issuers, log)?,
                TableKind::Offerings => {
                    read_table(&path, quarter, table, &mut tables.offerings, log)?
                }
                TableKind::Recipients => {
                    read_table(&path, quarter, table, &mut tables.recipients, log)?
                }
                TableKind::RelatedPersons => {
                    read_table(&path, quarter, table, &mut tables.related_persons, log)?
                }
                TableKind::Signatures => {
                    read_table(&path, quarter, table, &mut tables.signatures, log)?
                }
            }
        }
        Ok(())
    }
}

/// Reads one TSV file into typed rows tagged with their source quarter.
/// Invalid UTF-8 is replaced, not raised; records that still fail to
/// deserialize are skipped and reported once per file.
fn read_table<T: DeserializeOwned>(
    path: &Path,
    quarter: QuarterLabel,
    table: TableKind,
    out: &mut Vec<Sourced<T>>,
    log: &mut QualityLog,
) -> Result<()> {
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let before = out.len();
    let mut skipped = 0usize;
    for record in reader.deserialize::<T>() {
        match record {
            Ok(row) => out.push(Sourced::new(quarter, row)),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        log.warn(
            quarter,
            Some(table),
            IssueKind::MalformedRecord,
            format!("skipped {skipped} malformed records in {}", table.file_name()),
        );
    }
    debug!(quarter = %quarter, file = table.file_name(), rows = out.len() - before, "loaded table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn q(label: &str) -> QuarterLabel {
        label.parse().unwrap()
    }

    fn write_file(dir: &Path, name: &str, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    const SUBMISSIONS_HEADER: &str = "ACCESSIONNUMBER\tSUBMISSIONTYPE\tFILING_DATE\tSIC_CODE\n";

    #[test]
    fn layout_priority_prefers_double_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let quarter = q("2024Q1");

        // Both flat and double-nested exist; double-nested must win.
        fs::create_dir_all(root.join("2024Q1_d/2024Q1_d")).unwrap();
        let resolved = resolve_quarter_dir(root, quarter).unwrap();
        assert_eq!(resolved, root.join("2024Q1_d/2024Q1_d"));
    }

    #[test]
    fn year_nested_layout_resolves() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("2015/2015Q3_d")).unwrap();
        let resolved = resolve_quarter_dir(tmp.path(), q("2015Q3")).unwrap();
        assert_eq!(resolved, tmp.path().join("2015/2015Q3_d"));
    }

    #[test]
    fn unresolvable_quarter_is_a_warning_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let quarter_dir = tmp.path().join("2024Q1_d");
        write_file(
            &quarter_dir,
            "FORMDSUBMISSION.tsv",
            &format!("{SUBMISSIONS_HEADER}0001-24-000001\tD\t02-JAN-2024\t7372\n"),
        );

        let loader = FormDLoader::new(tmp.path(), vec![q("2024Q1"), q("2024Q2")]);
        let mut log = QualityLog::new();
        let tables = loader.load(&mut log).unwrap();

        assert_eq!(tables.submissions.len(), 1);
        assert_eq!(log.count_of(IssueKind::QuarterUnresolved), 1);
    }

    #[test]
    fn zero_resolvable_quarters_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = FormDLoader::new(tmp.path(), vec![q("2024Q1")]);
        let mut log = QualityLog::new();
        let err = loader.load(&mut log).unwrap_err();
        assert!(matches!(err, PipelineError::NoQuartersResolved { .. }));
    }

    #[test]
    fn invalid_root_is_fatal() {
        let loader = FormDLoader::new("/definitely/not/a/real/root", vec![q("2024Q1")]);
        let mut log = QualityLog::new();
        let err = loader.load(&mut log).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRoot(_)));
    }

    #[test]
    fn missing_file_contributes_no_rows_and_one_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let quarter_dir = tmp.path().join("2024Q1_d");
        write_file(
            &quarter_dir,
            "FORMDSUBMISSION.tsv",
            &format!("{SUBMISSIONS_HEADER}0001-24-000001\tD\t02-JAN-2024\t7372\n"),
        );
        // The other five files are absent.

        let loader = FormDLoader::new(tmp.path(), vec![q("2024Q1")]);
        let mut log = QualityLog::new();
        let tables = loader.load(&mut log).unwrap();

        assert_eq!(tables.submissions.len(), 1);
        assert!(tables.offerings.is_empty());
        assert_eq!(log.count_of(IssueKind::FileMissing), 5);
    }

    #[test]
    fn rows_are_tagged_with_their_source_quarter() {
        let tmp = tempfile::tempdir().unwrap();
        for label in ["2024Q1", "2024Q2"] {
            let dir = tmp.path().join(format!("{label}_d"));
            write_file(
                &dir,
                "FORMDSUBMISSION.tsv",
                &format!("{SUBMISSIONS_HEADER}acc-{label}\tD\t\t\n"),
            );
        }

        let loader = FormDLoader::new(tmp.path(), vec![q("2024Q1"), q("2024Q2")]);
        let mut log = QualityLog::new();
        let tables = loader.load(&mut log).unwrap();

        assert_eq!(tables.submissions.len(), 2);
        assert_eq!(tables.submissions[0].quarter, q("2024Q1"));
        assert_eq!(tables.submissions[1].quarter, q("2024Q2"));
        assert_eq!(tables.submissions[0].row.accession_number.as_deref(), Some("acc-2024Q1"));
    }

    #[test]
    fn column_drift_and_padding_are_tolerated() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("2012Q1_d");
        // Extra unknown column, missing SIC_CODE column, padded fields.
        write_file(
            &dir,
            "FORMDSUBMISSION.tsv",
            "ACCESSIONNUMBER\tSUBMISSIONTYPE\tFILING_DATE\tNEWCOLUMN\n  acc-1  \tD/A\t05-MAR-2012\tx\n",
        );

        let loader = FormDLoader::new(tmp.path(), vec![q("2012Q1")]);
        let mut log = QualityLog::new();
        let tables = loader.load(&mut log).unwrap();

        let row = &tables.submissions[0].row;
        assert_eq!(row.accession_number.as_deref(), Some("acc-1"));
        assert_eq!(row.submission_type.as_deref(), Some("D/A"));
        assert_eq!(row.sic_code, None);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("2024Q1_d");
        fs::create_dir_all(&dir).unwrap();
        let mut bytes = SUBMISSIONS_HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"acc-1\tD\t02-JAN-2024\t73\xFF72\n");
        fs::write(dir.join("FORMDSUBMISSION.tsv"), bytes).unwrap();

        let loader = FormDLoader::new(tmp.path(), vec![q("2024Q1")]);
        let mut log = QualityLog::new();
        let tables = loader.load(&mut log).unwrap();
        assert_eq!(tables.submissions.len(), 1);
        let sic = tables.submissions[0].row.sic_code.as_deref().unwrap();
        assert!(sic.contains('\u{FFFD}'));
    }
}
