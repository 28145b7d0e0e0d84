// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain data types and traits that every other layer speaks:
// canonical records, issue counts, the error taxonomy, and
// the abstractions pipeline stages are written against.
//
// Rules for this layer:
//   - NO file I/O
//   - NO regex or RNG code
//   - Only structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Typed errors for validation and configuration failures
pub mod error;

// Text-quality issue kinds and per-scan counts
pub mod issue;

// Raw, dialogue and instruction record shapes
pub mod record;

// Core abstractions (traits) that other layers implement
pub mod traits;
