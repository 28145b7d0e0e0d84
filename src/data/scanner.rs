// ============================================================
// Layer 4 — Issue Scanner
// ============================================================
// Read-only audit of text quality. For every text unit (one
// dialogue turn, or one instruction/output field) and every
// diagnostic pattern, the unit counts once if it contains at
// least one hit, however many hits it has.
//
// Running the scanner before and after normalization gives a
// per-issue delta for checking that cleaning did its job. It
// never touches the records.
//
// The scanning patterns are deliberately separate from (and
// milder than) the cleaning patterns: e.g. only spaced hyphens
// are flagged, not "well-made".

use regex::Regex;
use std::collections::BTreeSet;

use crate::data::normalizer::{compile, EMAIL_PLACEHOLDER, URL_PLACEHOLDER};
use crate::domain::issue::{IssueCount, IssueKind};
use crate::domain::traits::TextUnits;

/// Diagnostic patterns keyed by issue kind, plus literal tokens that
/// are never counted as hits (cleaning placeholders, difficulty tags).
#[derive(Debug, Clone)]
pub struct ScanPatterns {
    pub patterns:  Vec<(IssueKind, Regex)>,
    pub protected: BTreeSet<String>,
}

impl ScanPatterns {
    pub fn with_protected<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected.extend(tokens.into_iter().map(Into::into));
        self
    }
}

impl Default for ScanPatterns {
    fn default() -> Self {
        let patterns = vec![
            (IssueKind::HtmlTags,           compile(r"<[^>]+>")),
            (IssueKind::Urls,               compile(r"(?i)https?://\S+|www\.\S+")),
            (IssueKind::Emails,             compile(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")),
            (IssueKind::CurlyQuotes,        compile(r"[\x{2018}\x{2019}\x{201C}\x{201D}]")),
            (IssueKind::BrokenContractions, compile(r"\b([A-Za-z]+)\s+['\x{2019}]\s+([A-Za-z]+)\b")),
            (IssueKind::SpacedHyphens,      compile(r"\s+-\s+")),
            (IssueKind::UnicodeDashes,      compile(r"[\x{2013}\x{2014}]")),
            (IssueKind::SpacedPunctuation,  compile(r"\s+[.,!?;:]")),
            (IssueKind::ExtraWhitespace,    compile(r"\s{2,}")),
        ];
        Self {
            patterns,
            protected: [URL_PLACEHOLDER, EMAIL_PLACEHOLDER]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

pub struct IssueScanner {
    patterns: ScanPatterns,
    verbose:  bool,
}

impl IssueScanner {
    pub fn new(patterns: ScanPatterns) -> Self {
        Self { patterns, verbose: false }
    }

    /// Log every hit with its record id and text.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Scan `records`, pulling text units out of each with `extract`.
    pub fn scan<R, F>(&self, records: &[R], extract: F) -> IssueCount
    where
        F: for<'a> Fn(&'a R) -> Vec<&'a str>,
    {
        let mut counts = IssueCount::new();

        for (idx, record) in records.iter().enumerate() {
            for text in extract(record) {
                self.scan_text(text, &mut counts, idx);
            }
        }

        tracing::info!("Scan complete over {} records. Issues: {}", records.len(), counts);
        counts
    }

    /// Scan records that know their own text units.
    pub fn scan_records<R: TextUnits>(&self, records: &[R]) -> IssueCount {
        self.scan(records, |r| r.text_units())
    }

    fn scan_text(&self, text: &str, counts: &mut IssueCount, record_idx: usize) {
        for (kind, pattern) in &self.patterns.patterns {
            let hits: Vec<&str> = pattern
                .find_iter(text)
                .map(|m| m.as_str())
                .filter(|m| !self.patterns.protected.contains(*m))
                .collect();

            if hits.is_empty() {
                continue;
            }

            counts.increment(*kind);
            if self.verbose {
                tracing::info!("Issue '{kind}' in record_{record_idx}: {hits:?} | Text: {text}");
            }
        }
    }
}

impl Default for IssueScanner {
    fn default() -> Self {
        Self::new(ScanPatterns::default())
    }
}
