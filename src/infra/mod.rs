// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Filesystem concerns shared by the use cases:
//
//   config_store.rs  — PrepareConfig to and from JSON
//                      (`init-config` writes the defaults).
//
//   output_store.rs  — pretty JSON and plain text outputs
//                      under the configured base directory.
//
//   scan_report.rs   — before/after issue counts appended to
//                      scan_report.csv for later comparison.
//
// Nothing here knows about cleaning or splitting; the data
// layer never touches the filesystem except through the loader.
//
// Reference: Rust Book §9 (Error Handling with anyhow)

/// Config file load/save
pub mod config_store;

/// JSON and text output writer
pub mod output_store;

/// Scan delta CSV logger
pub mod scan_report;
