// ============================================================
// Layer 4 — Instruction Formatter
// ============================================================
// Maps raw {instruction, output} records into InstructionRecord.
//
// Both fields are trimmed. A record where either one is empty
// after trimming is dropped. This is silent filtering, visible
// only as a debug line per record and the final info count.
//
// The column check is structural: when the first record has no
// instruction or output column at all, the subset has the wrong
// schema and formatting fails. Later records missing a field are
// treated as empty and dropped like any other empty record.

use crate::data::normalizer::coerce_text;
use crate::domain::error::PrepError;
use crate::domain::record::{InstructionRecord, RawRecord};
use crate::domain::traits::RecordFormatter;

pub const INSTRUCTION_KEY: &str = "instruction";
pub const OUTPUT_KEY:      &str = "output";

pub struct InstructionFormatter {
    source: String,
}

impl InstructionFormatter {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }
}

impl RecordFormatter for InstructionFormatter {
    type Output = InstructionRecord;

    fn format_records(&self, records: &[RawRecord]) -> Result<Vec<InstructionRecord>, PrepError> {
        if let Some(first) = records.first() {
            for key in [INSTRUCTION_KEY, OUTPUT_KEY] {
                if !first.contains_key(key) {
                    return Err(PrepError::MissingField { field: key.to_string(), index: 0 });
                }
            }
        }

        let mut formatted = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let instruction = field_text(record, INSTRUCTION_KEY);
            let output      = field_text(record, OUTPUT_KEY);

            if instruction.is_empty() || output.is_empty() {
                tracing::debug!("Skipped record {index} with empty instruction or output.");
                continue;
            }
            formatted.push(InstructionRecord::new(self.source.clone(), instruction, output));
        }

        tracing::info!("{}: formatted {} instruction records.", self.source, formatted.len());
        Ok(formatted)
    }
}

fn field_text(record: &RawRecord, key: &str) -> String {
    record
        .get(key)
        .map(|v| coerce_text(v).trim().to_string())
        .unwrap_or_default()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> Vec<RawRecord> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_blank_instruction_is_dropped() {
        let out = InstructionFormatter::new("alpaca")
            .format_records(&raw(r#"[{"instruction":"  ","output":"x"}]"#))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_fields_are_trimmed_and_tagged_with_source() {
        let out = InstructionFormatter::new("alpaca")
            .format_records(&raw(r#"[
                {"instruction":"  What is Rust? ","output":" A language.\n"},
                {"instruction":"q","output":""},
                {"instruction":"only"}
            ]"#))
            .unwrap();
        assert_eq!(out, vec![InstructionRecord::new("alpaca", "What is Rust?", "A language.")]);
    }

    #[test]
    fn test_numeric_fields_are_coerced() {
        let out = InstructionFormatter::new("math")
            .format_records(&raw(r#"[{"instruction":"2+2?","output":4}]"#))
            .unwrap();
        assert_eq!(out[0].output, "4");
    }

    #[test]
    fn test_wrong_schema_fails() {
        let err = InstructionFormatter::new("x")
            .format_records(&raw(r#"[{"question":"q","answer":"a"}]"#))
            .unwrap_err();
        assert_eq!(err, PrepError::MissingField { field: "instruction".into(), index: 0 });
    }

    #[test]
    fn test_empty_input_is_ok() {
        assert!(InstructionFormatter::new("x").format_records(&[]).unwrap().is_empty());
    }
}
