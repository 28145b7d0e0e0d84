// ============================================================
// Layer 3 — Text Quality Issues
// ============================================================
// IssueKind names one diagnostic pattern. IssueCount is the
// result of one scan: how many text units contained at least
// one hit for each kind. Counts only ever go up, and a fresh
// IssueCount is created per scan call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    HtmlTags,
    Urls,
    Emails,
    CurlyQuotes,
    BrokenContractions,
    SpacedHyphens,
    UnicodeDashes,
    SpacedPunctuation,
    ExtraWhitespace,
}

impl IssueKind {
    pub const ALL: [IssueKind; 9] = [
        IssueKind::HtmlTags,
        IssueKind::Urls,
        IssueKind::Emails,
        IssueKind::CurlyQuotes,
        IssueKind::BrokenContractions,
        IssueKind::SpacedHyphens,
        IssueKind::UnicodeDashes,
        IssueKind::SpacedPunctuation,
        IssueKind::ExtraWhitespace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::HtmlTags           => "html_tags",
            IssueKind::Urls               => "urls",
            IssueKind::Emails             => "emails",
            IssueKind::CurlyQuotes        => "curly_quotes",
            IssueKind::BrokenContractions => "broken_contractions",
            IssueKind::SpacedHyphens      => "spaced_hyphens",
            IssueKind::UnicodeDashes      => "unicode_dashes",
            IssueKind::SpacedPunctuation  => "spaced_punctuation",
            IssueKind::ExtraWhitespace    => "extra_whitespace",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Per-kind hit counts for one scanned corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCount {
    counts: BTreeMap<IssueKind, usize>,
}

impl IssueCount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more text unit exhibiting `kind`.
    pub fn increment(&mut self, kind: IssueKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    /// Hits for `kind`; zero when the kind never matched.
    pub fn get(&self, kind: IssueKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Kinds that matched at least once, in stable order.
    pub fn iter(&self) -> impl Iterator<Item = (IssueKind, usize)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }

    /// Signed change from `self` (before) to `after`, for every kind
    /// present on either side.
    pub fn delta(&self, after: &IssueCount) -> BTreeMap<IssueKind, i64> {
        IssueKind::ALL
            .iter()
            .filter(|k| self.counts.contains_key(*k) || after.counts.contains_key(*k))
            .map(|k| (*k, after.get(*k) as i64 - self.get(*k) as i64))
            .collect()
    }
}

impl fmt::Display for IssueCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.counts.is_empty() {
            return f.write_str("{}");
        }
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_and_get() {
        let mut c = IssueCount::new();
        c.increment(IssueKind::Urls);
        c.increment(IssueKind::Urls);
        c.increment(IssueKind::HtmlTags);
        assert_eq!(c.get(IssueKind::Urls), 2);
        assert_eq!(c.get(IssueKind::Emails), 0);
        assert_eq!(c.total(), 3);
    }

    #[test]
    fn test_delta_covers_both_sides() {
        let mut before = IssueCount::new();
        before.increment(IssueKind::CurlyQuotes);
        let mut after = IssueCount::new();
        after.increment(IssueKind::SpacedHyphens);

        let d = before.delta(&after);
        assert_eq!(d[&IssueKind::CurlyQuotes], -1);
        assert_eq!(d[&IssueKind::SpacedHyphens], 1);
        assert!(!d.contains_key(&IssueKind::Urls));
    }

    #[test]
    fn test_display_uses_issue_names() {
        let mut c = IssueCount::new();
        c.increment(IssueKind::HtmlTags);
        assert_eq!(c.to_string(), "{html_tags: 1}");
        assert_eq!(IssueCount::new().to_string(), "{}");
    }
}
