// ============================================================
// Layer 2 — ScanUseCase
// ============================================================
// Audits an already-canonical JSON file:
//
//   Step 1: Load the records                  (serde_json)
//   Step 2: Scan                              (Layer 4)
//   Step 3: Optionally clean and scan again   (Layer 4)
//
// The file itself is never modified. With --clean the caller
// gets a before/after delta to check that cleaning does what
// it should on this corpus.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::application::cleaning::{clean_dialogues, clean_instructions, Cleaned};
use crate::data::normalizer::TextNormalizer;
use crate::data::scanner::{IssueScanner, ScanPatterns};
use crate::domain::issue::{IssueCount, IssueKind};
use crate::domain::record::{DialogueRecord, InstructionRecord};
use crate::domain::traits::TextUnits;

/// Which canonical shape the input file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Dialogue,
    Instruction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub records: usize,
    pub before:  IssueCount,
    /// Present only when cleaning was requested
    pub after:   Option<IssueCount>,
}

impl ScanOutcome {
    pub fn delta(&self) -> Option<BTreeMap<IssueKind, i64>> {
        self.after.as_ref().map(|after| self.before.delta(after))
    }
}

pub struct ScanUseCase {
    input:   PathBuf,
    kind:    RecordKind,
    clean:   bool,
    verbose: bool,
}

impl ScanUseCase {
    pub fn new(input: impl Into<PathBuf>, kind: RecordKind, clean: bool, verbose: bool) -> Self {
        Self { input: input.into(), kind, clean, verbose }
    }

    pub fn execute(&self) -> Result<ScanOutcome> {
        let scanner = IssueScanner::new(ScanPatterns::default()).verbose(self.verbose);
        let cleaner = TextNormalizer::default();

        match self.kind {
            RecordKind::Dialogue => {
                let records: Vec<DialogueRecord> = load_canonical(&self.input)?;
                Ok(self.run(&scanner, records, |r| clean_dialogues(&cleaner, r)))
            }
            RecordKind::Instruction => {
                let records: Vec<InstructionRecord> = load_canonical(&self.input)?;
                Ok(self.run(&scanner, records, |r| clean_instructions(&cleaner, r, &BTreeSet::new())))
            }
        }
    }

    fn run<R, F>(&self, scanner: &IssueScanner, records: Vec<R>, clean: F) -> ScanOutcome
    where
        R: TextUnits,
        F: FnOnce(Vec<R>) -> Cleaned<R>,
    {
        let total  = records.len();
        let before = scanner.scan_records(&records);

        let after = if self.clean {
            let cleaned = clean(records);
            Some(scanner.scan_records(&cleaned.records))
        } else {
            None
        };

        ScanOutcome { records: total, before, after }
    }
}

fn load_canonical<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("'{}' does not hold canonical records of this kind", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleaning_lowers_html_and_quote_counts() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.json");
        fs::write(
            &path,
            r#"[{"source":"s","dialogue":[
                {"role":"user","text":"I’m <i>so</i> happy"},
                {"role":"bot","text":"“great”  news"}
            ]}]"#,
        )
        .unwrap();

        let outcome = ScanUseCase::new(&path, RecordKind::Dialogue, true, false).execute().unwrap();
        assert_eq!(outcome.records, 1);
        assert_eq!(outcome.before.get(IssueKind::HtmlTags), 1);
        assert_eq!(outcome.before.get(IssueKind::CurlyQuotes), 2);

        let after = outcome.after.as_ref().unwrap();
        assert_eq!(after.get(IssueKind::HtmlTags), 0);
        assert_eq!(after.get(IssueKind::CurlyQuotes), 0);
        assert_eq!(after.get(IssueKind::ExtraWhitespace), 0);
        assert_eq!(outcome.delta().unwrap()[&IssueKind::CurlyQuotes], -2);
    }

    #[test]
    fn test_instruction_file_without_source_field() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("i.json");
        fs::write(&path, r#"[{"instruction":"visit www.example.com","output":"ok ."}]"#).unwrap();

        let outcome = ScanUseCase::new(&path, RecordKind::Instruction, false, false).execute().unwrap();
        assert_eq!(outcome.before.get(IssueKind::Urls), 1);
        assert_eq!(outcome.before.get(IssueKind::SpacedPunctuation), 1);
        assert!(outcome.after.is_none());
        assert!(outcome.delta().is_none());
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.json");
        fs::write(&path, r#"[{"instruction":"q","output":"a"}]"#).unwrap();
        assert!(ScanUseCase::new(&path, RecordKind::Dialogue, false, false).execute().is_err());
    }
}
