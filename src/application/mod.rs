// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the data and infra layers for one command.
//
// Rules for this layer:
//   - No regex or split math here (that's Layer 4)
//   - No printing here (that's Layer 1)
//   - File access only through the loader and infra stores
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// PrepareConfig and its sections
pub mod config;

/// Normalizer applied to canonical records
pub mod cleaning;

/// The full preparation pipeline
pub mod prepare_use_case;

/// Standalone audit of a canonical file
pub mod scan_use_case;
