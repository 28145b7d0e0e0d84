// ============================================================
// Layer 4 — Text Normalizer
// ============================================================
// Cleans dialogue turns and instruction text before they are
// written to the training corpus.
//
// Common steps (applied in this order; reordering changes output):
//    1. Strip HTML-like tags (protected tokens survive)
//    2. Replace URLs with <URL>
//    3. Replace email addresses with <EMAIL>
//    4. Curly quotes → straight quotes
//    5. Repair contractions broken by spaces or escapes
//       ("don ' t", "can 't", "it\'s" → "don't", "can't", "it's")
//    6. Runs of em/en dashes (with any surrounding spaces) → " - "
//    7. Remaining unicode dashes → "-"
//    8. Hyphens with whitespace on one side only → single space
//       ("well-made" has none and is kept; " - " has both and is kept)
//    9. Collapse whitespace runs to one space
//   10. Drop the " - - " artifact left when two dash runs meet
//   11. Remove whitespace before . ! ? ; :
//   12. Remove whitespace before ,
//   13. Trim
//
// Instruction profile adds, after the common steps:
//   - drop fenced ``` code blocks
//   - unwrap `inline code`
//   - strip characters outside the whitelist
//   - Unicode NFKC
//   - trim
//
// The ordered steps form one pass. A pass can expose new work
// for an earlier step (e.g. removing a symbol leaves a double
// space), so passes repeat until the text stops changing. The
// result is therefore a fixed point, and normalizing it again
// returns it unchanged. If the text has not settled after
// MAX_PASSES the input is returned untouched and the failure
// is logged; one bad record never aborts a batch.
//
// Reference: regex crate documentation (Regex::replace_all)
//            unicode-normalization crate (nfkc)

use regex::{Captures, NoExpand, Regex};
use serde_json::Value;
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

use crate::domain::error::PrepError;

pub const URL_PLACEHOLDER:   &str = "<URL>";
pub const EMAIL_PLACEHOLDER: &str = "<EMAIL>";

/// Upper bound on full passes before giving up on a text.
const MAX_PASSES: usize = 6;

/// Which step list to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dialogue,
    Instruction,
}

// ─── Cleaning Pattern Set ─────────────────────────────────────────────────────
/// Compiled regexes for the cleaning path, plus the literal tokens the
/// HTML step must leave alone. Built once and handed to the normalizer.
#[derive(Debug, Clone)]
pub struct CleaningPatterns {
    pub html_tags:            Regex,
    pub urls:                 Regex,
    pub emails:               Regex,
    pub escaped_apostrophes:  Regex,
    pub escaped_quotes:       Regex,
    pub broken_contractions:  Regex,
    pub split_contractions:   Regex,
    pub dash_runs:            Regex,
    pub unicode_dashes:       Regex,
    pub hyphen_space_after:   Regex,
    pub hyphen_space_before:  Regex,
    pub whitespace:           Regex,
    pub double_dash_artifact: Regex,
    pub spaced_punctuation:   Regex,
    pub spaced_commas:        Regex,
    pub code_blocks:          Regex,
    pub inline_code:          Regex,
    pub special_chars:        Regex,
    /// Tag-shaped tokens that are content, not markup
    pub protected:            BTreeSet<String>,
}

impl CleaningPatterns {
    /// Add tokens (e.g. difficulty tags like `<hard>`) that step 1 keeps.
    pub fn with_protected<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected.extend(tokens.into_iter().map(Into::into));
        self
    }
}

impl Default for CleaningPatterns {
    fn default() -> Self {
        Self {
            html_tags:            compile(r"<[^<>]*>"),
            urls:                 compile(r"https?://\S+|www\.\S+"),
            emails:               compile(r"\b[\w.-]+@[\w.-]+\.\w+\b"),
            escaped_apostrophes:  compile(r"\\+'"),
            escaped_quotes:       compile(r#"\\+""#),
            broken_contractions:  compile(r"\b([A-Za-z]+)\s+'\s+([A-Za-z]+)\b"),
            split_contractions:   compile(r"(?i)\b([a-z]+)\s*'\s*(t|s|re|ve|ll|d|m)\b"),
            dash_runs:            compile(r"\s*[\x{2013}\x{2014}]+\s*"),
            unicode_dashes:       compile(r"[\x{2010}-\x{2015}\x{2212}\x{FE58}\x{FE63}\x{FF0D}]"),
            hyphen_space_after:   compile(r"(\w)-+\s+"),
            hyphen_space_before:  compile(r"\s+-+(\w)"),
            whitespace:           compile(r"\s+"),
            double_dash_artifact: compile(r" -(?: -)+ "),
            spaced_punctuation:   compile(r"\s+([.!?;:])"),
            spaced_commas:        compile(r"\s+,"),
            code_blocks:          compile(r"(?s)```.*?```"),
            inline_code:          compile(r"`([^`]*)`"),
            special_chars:        compile(r#"[^\w\s.,!?;:'"()\-+/=<>\x{80}-\x{FFFF}]"#),
            protected: [URL_PLACEHOLDER, EMAIL_PLACEHOLDER]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Compile a built-in pattern. These are literals, so failure is a bug.
pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

// ─── TextNormalizer ───────────────────────────────────────────────────────────
pub struct TextNormalizer {
    patterns: CleaningPatterns,
}

impl TextNormalizer {
    pub fn new(patterns: CleaningPatterns) -> Self {
        Self { patterns }
    }

    /// Clean every turn of a conversation independently.
    pub fn normalize_dialogue(&self, turns: &[String]) -> Vec<String> {
        turns
            .iter()
            .map(|t| self.normalize(t, Profile::Dialogue))
            .collect()
    }

    /// Clean one instruction or output field.
    pub fn normalize_instruction(&self, text: &str) -> String {
        self.normalize(text, Profile::Instruction)
    }

    /// Never fails: on error the input comes back unchanged.
    pub fn normalize(&self, text: &str, profile: Profile) -> String {
        match self.try_normalize(text, profile) {
            Ok(clean) => clean,
            Err(e) => {
                tracing::error!("Cleaning failed: {e} | snippet: {}", snippet(text));
                text.to_string()
            }
        }
    }

    /// Run passes until the text is a fixed point of one pass.
    pub fn try_normalize(&self, text: &str, profile: Profile) -> Result<String, PrepError> {
        let mut current = self.apply_pass(text, profile);

        for _ in 1..MAX_PASSES {
            let next = self.apply_pass(&current, profile);
            if next == current {
                return Ok(current);
            }
            current = next;
        }

        Err(PrepError::Unstable(MAX_PASSES))
    }

    fn apply_pass(&self, text: &str, profile: Profile) -> String {
        match profile {
            Profile::Dialogue    => self.apply_common(text),
            Profile::Instruction => self.apply_instruction(text),
        }
    }

    fn apply_common(&self, text: &str) -> String {
        let p = &self.patterns;

        // ── Steps 1-3: structural noise ───────────────────────────────────────
        let t = p.html_tags.replace_all(text, |caps: &Captures| {
            let tag = &caps[0];
            if p.protected.contains(tag) { tag.to_string() } else { String::new() }
        });
        let t = p.urls.replace_all(&t, NoExpand(URL_PLACEHOLDER));
        let t = p.emails.replace_all(&t, NoExpand(EMAIL_PLACEHOLDER));

        // ── Step 4: quotes ────────────────────────────────────────────────────
        let t: String = t
            .chars()
            .map(|c| match c {
                '\u{2018}' | '\u{2019}' => '\'',
                '\u{201C}' | '\u{201D}' => '"',
                c => c,
            })
            .collect();

        // ── Step 5: contractions ──────────────────────────────────────────────
        let t = p.escaped_apostrophes.replace_all(&t, "'");
        let t = p.escaped_quotes.replace_all(&t, "\"");
        let t = p.broken_contractions.replace_all(&t, "${1}'${2}");
        let t = p.split_contractions.replace_all(&t, "${1}'${2}");

        // ── Steps 6-8: dashes and hyphens ─────────────────────────────────────
        let t = p.dash_runs.replace_all(&t, " - ");
        let t = p.unicode_dashes.replace_all(&t, "-");
        let t = p.hyphen_space_after.replace_all(&t, "${1} ");
        let t = p.hyphen_space_before.replace_all(&t, " ${1}");

        // ── Steps 9-10: whitespace ────────────────────────────────────────────
        let t = p.whitespace.replace_all(&t, " ");
        let t = p.double_dash_artifact.replace_all(&t, " ");

        // ── Steps 11-13: punctuation spacing ──────────────────────────────────
        let t = p.spaced_punctuation.replace_all(&t, "${1}");
        let t = p.spaced_commas.replace_all(&t, ",");

        t.trim().to_string()
    }

    fn apply_instruction(&self, text: &str) -> String {
        let p = &self.patterns;
        let common = self.apply_common(text);

        let t = p.code_blocks.replace_all(&common, "");
        let t = p.inline_code.replace_all(&t, "${1}");
        let t = p.special_chars.replace_all(&t, "");
        let t: String = t.chars().nfkc().collect();

        t.trim().to_string()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(CleaningPatterns::default())
    }
}

/// String form of a JSON value for cleaning. Strings pass through;
/// anything else is rendered and a warning is logged.
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => {
            tracing::warn!("Non-string input converted: null");
            String::new()
        }
        other => {
            tracing::warn!("Non-string input converted: {other}");
            other.to_string()
        }
    }
}

/// First 80 characters, for log lines.
fn snippet(text: &str) -> String {
    text.chars().take(80).collect()
}
