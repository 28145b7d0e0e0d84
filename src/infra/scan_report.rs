// ============================================================
// Layer 6 — Scan Report Logger
// ============================================================
// Appends before/after issue counts to a CSV file, one row per
// dataset, subset and issue kind:
//
//   dataset,subset,issue,before,after
//   persona,train,html_tags,12,0
//   persona,train,curly_quotes,40,0
//   ...
//
// Every issue kind gets a row, including zero counts, so runs
// can be diffed line by line. The header is written only when
// the file is new; later runs append.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::issue::{IssueCount, IssueKind};

pub const SCAN_REPORT_FILE: &str = "scan_report.csv";
const HEADER: &str = "dataset,subset,issue,before,after";

pub struct ScanReportLogger {
    csv_path: PathBuf,
}

impl ScanReportLogger {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create report directory '{}'", dir.display()))?;

        let csv_path = dir.join(SCAN_REPORT_FILE);
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created scan report: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(
        &self,
        dataset: &str,
        subset:  &str,
        before:  &IssueCount,
        after:   &IssueCount,
    ) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        for kind in IssueKind::ALL {
            writeln!(
                f,
                "{},{},{},{},{}",
                csv_field(dataset),
                csv_field(subset),
                kind,
                before.get(kind),
                after.get(kind),
            )?;
        }

        tracing::debug!(
            "Logged scan for {dataset}/{subset}: {} → {} issues",
            before.total(),
            after.total()
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// Quote a value if it would break the row.
fn csv_field(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_per_issue_and_single_header() {
        let dir = tempfile::tempdir().unwrap();

        let mut before = IssueCount::new();
        before.increment(IssueKind::HtmlTags);
        before.increment(IssueKind::HtmlTags);
        let after = IssueCount::new();

        ScanReportLogger::new(dir.path()).unwrap().log("persona", "train", &before, &after).unwrap();
        // reopening must not write the header again
        let logger = ScanReportLogger::new(dir.path()).unwrap();
        logger.log("daily", "test", &after, &after).unwrap();

        let text  = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.iter().filter(|l| **l == HEADER).count(), 1);
        assert_eq!(lines.len(), 1 + 2 * IssueKind::ALL.len());
        assert!(lines.contains(&"persona,train,html_tags,2,0"));
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
