// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between pipeline stages:
//
//   RecordFormatter  raw source records → canonical records
//   ModelFormatter   canonical records  → flat training text
//   FieldLookup      named string fields, used for dedup keys
//   TextUnits        the text fields a scanner should audit
//
// Each canonical record type implements the last two, so the
// deduplicator and scanner stay generic over record shape.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::borrow::Cow;

use crate::domain::error::PrepError;
use crate::domain::record::RawRecord;

// ─── RecordFormatter ──────────────────────────────────────────────────────────
/// Maps one source schema into a canonical record shape.
///
/// Implementations:
///   - DialogueFormatter    → DialogueRecord
///   - InstructionFormatter → InstructionRecord
pub trait RecordFormatter {
    type Output;

    /// Format a whole subset. Per-record problems are logged and
    /// skipped; structural problems are returned as errors.
    fn format_records(&self, records: &[RawRecord]) -> Result<Vec<Self::Output>, PrepError>;
}

// ─── ModelFormatter ───────────────────────────────────────────────────────────
/// Flattens canonical records into plain text for direct model input.
pub trait ModelFormatter<R> {
    fn format_for_model(&self, records: &[R]) -> String;
}

// ─── FieldLookup ──────────────────────────────────────────────────────────────
/// String view of a named field. `None` means the field is absent;
/// callers decide what absence means (dedup uses an empty string).
pub trait FieldLookup {
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;
}

// ─── TextUnits ────────────────────────────────────────────────────────────────
/// The independent pieces of text a record contributes to a scan.
pub trait TextUnits {
    fn text_units(&self) -> Vec<&str>;
}
