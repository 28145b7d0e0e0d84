// ============================================================
// Layer 4 — Difficulty Merger
// ============================================================
// Pairs instruction records with a parallel list of difficulty
// labels by position and prefixes each instruction with a tag:
//
//   labels:  ["easy", "hard"]
//   records: [{instruction: "a"}, {instruction: "b"}, {instruction: "c"}]
//   result:  "<easy> a", "<hard> b", "<unknown> c"
//
// A length mismatch is only a warning. Extra labels are ignored;
// records without a label get the "unknown" sentinel. Labels are
// NFKC-folded and reduced to word characters and '-' so the tag
// passes the instruction whitelist intact ("a&b" → "<a_b>"). Runs
// before normalization, so the tags it produces are returned
// for the normalizer and scanner to protect.

use std::collections::BTreeSet;

use regex::Regex;
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use crate::data::normalizer::{coerce_text, compile};
use crate::domain::record::RawRecord;

pub const UNKNOWN_DIFFICULTY: &str = "unknown";

/// Records with tagged instructions, plus every tag that was applied.
#[derive(Debug, Clone)]
pub struct AnnotatedRecords {
    pub records: Vec<RawRecord>,
    pub tags:    BTreeSet<String>,
}

pub struct DifficultyMerger {
    instruction_key: String,
    label_noise:     Regex,
}

impl DifficultyMerger {
    pub fn new() -> Self {
        Self {
            instruction_key: "instruction".to_string(),
            label_noise:     compile(r"[^\w-]+"),
        }
    }

    /// The literal tag written in front of an instruction.
    pub fn tag(&self, label: &str) -> String {
        let folded: String = label.nfkc().collect();
        let clean = self.label_noise.replace_all(&folded, "_");
        let clean = match clean.trim_matches('_') {
            "" => UNKNOWN_DIFFICULTY,
            c  => c,
        };
        if clean != label {
            tracing::warn!("Difficulty label '{label}' tagged as '<{clean}>'");
        }
        format!("<{clean}>")
    }

    pub fn merge(&self, records: Vec<RawRecord>, labels: &[String]) -> AnnotatedRecords {
        if records.len() != labels.len() {
            tracing::warn!(
                "Length mismatch: dataset={}, difficulties={}",
                records.len(),
                labels.len()
            );
        }

        let mut tags   = BTreeSet::new();
        let mut merged = Vec::with_capacity(records.len());

        for (i, mut record) in records.into_iter().enumerate() {
            let label = labels.get(i).map(String::as_str).unwrap_or(UNKNOWN_DIFFICULTY);
            let tag   = self.tag(label);

            match record.get(&self.instruction_key).map(coerce_text) {
                // blank stays blank so the formatter still drops it
                Some(text) if text.trim().is_empty() => {
                    tracing::debug!("Record {i} has a blank instruction; left untagged");
                }
                Some(text) => {
                    let tagged = format!("{tag} {text}");
                    record.insert(self.instruction_key.clone(), Value::String(tagged));
                    tags.insert(tag);
                }
                None => {
                    tracing::warn!("Record {i} has no '{}' field; left untagged", self.instruction_key);
                }
            }
            merged.push(record);
        }

        tracing::info!("Merged difficulty into {} records", merged.len());
        AnnotatedRecords { records: merged, tags }
    }
}

impl Default for DifficultyMerger {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<RawRecord> {
        (0..n)
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "instruction": format!("q{i}"),
                    "output": format!("a{i}")
                }))
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_tags_by_position() {
        let labels = vec!["easy".to_string(), "hard".to_string()];
        let out = DifficultyMerger::new().merge(records(2), &labels);
        assert_eq!(out.records[0]["instruction"], "<easy> q0");
        assert_eq!(out.records[1]["instruction"], "<hard> q1");
        assert_eq!(out.records[1]["output"], "a1");
    }

    #[test]
    fn test_missing_labels_get_unknown() {
        let labels = vec!["easy".to_string(), "hard".to_string()];
        let out = DifficultyMerger::new().merge(records(3), &labels);
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.records[2]["instruction"], "<unknown> q2");
        assert!(out.tags.contains("<unknown>"));
        assert_eq!(out.tags.len(), 3);
    }

    #[test]
    fn test_extra_labels_are_ignored() {
        let labels: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let out = DifficultyMerger::new().merge(records(1), &labels);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0]["instruction"], "<a> q0");
    }

    #[test]
    fn test_labels_are_reduced_to_tag_safe_characters() {
        let m = DifficultyMerger::new();
        assert_eq!(m.tag("hard"), "<hard>");
        assert_eq!(m.tag("very-hard_2"), "<very-hard_2>");
        assert_eq!(m.tag("a&b"), "<a_b>");
        assert_eq!(m.tag(" very hard "), "<very_hard>");
        assert_eq!(m.tag("ｈａｒｄ"), "<hard>");
        assert_eq!(m.tag("<>"), "<unknown>");
    }

    #[test]
    fn test_sanitized_tag_survives_instruction_cleaning() {
        use crate::data::normalizer::{CleaningPatterns, TextNormalizer};

        let out = DifficultyMerger::new().merge(records(1), &["a&b".to_string()]);
        assert_eq!(out.records[0]["instruction"], "<a_b> q0");

        let cleaner = TextNormalizer::new(CleaningPatterns::default().with_protected(out.tags.iter().cloned()));
        let text = out.records[0]["instruction"].as_str().unwrap();
        assert_eq!(cleaner.normalize_instruction(text), "<a_b> q0");
    }

    #[test]
    fn test_blank_instruction_is_not_tagged() {
        let rec: RawRecord = serde_json::from_str(r#"{"instruction":"   ","output":"x"}"#).unwrap();
        let out = DifficultyMerger::new().merge(vec![rec], &["hard".to_string()]);
        assert_eq!(out.records[0]["instruction"], "   ");
        assert!(out.tags.is_empty());
    }

    #[test]
    fn test_record_without_instruction_is_left_alone() {
        let rec: RawRecord = serde_json::from_str(r#"{"output":"x"}"#).unwrap();
        let out = DifficultyMerger::new().merge(vec![rec], &["hard".to_string()]);
        assert!(out.records[0].get("instruction").is_none());
        assert!(out.tags.is_empty());
    }
}
