// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Every stage from raw JSON records to split, deduplicated,
// clean training partitions.
//
//   JSON files
//       │
//       ▼
//   JsonLoader          → raw records per subset
//       │
//       ▼
//   DifficultyMerger    → (one instruction source) tag prefixes
//       │
//       ▼
//   Formatter           → canonical DialogueRecord / InstructionRecord
//       │
//       ▼
//   TextNormalizer      → clean text    ┄┄ IssueScanner before/after
//       │
//       ▼
//   Deduplicator        → first occurrence per key
//       │
//       ▼
//   DataSplitter        → train / validation / test
//       │
//       ▼
//   DatasetMerger       → partitions combined across sources
//       │
//       ▼
//   ModelFormatter      → flat text for model input
//
// Each module is one step and is tested on its own.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Reads raw records, subsets and label files
pub mod loader;

/// Difficulty labels merged into instruction text
pub mod difficulty;

/// Source schema → canonical records
pub mod formatter;

/// Ordered regex cleaning with dialogue and instruction profiles
pub mod normalizer;

/// Read-only quality audit
pub mod scanner;

/// Key-based exact deduplication
pub mod dedup;

/// Seeded two-stage train/validation/test split
pub mod splitter;

/// Cross-source partition merging
pub mod merger;

/// Canonical records → plain training text
pub mod model_formatter;
