// ============================================================
// Layer 3 — Pipeline Errors
// ============================================================
// Typed errors raised by the data layer. Validation and
// configuration problems stop the current stage; the
// application layer wraps them in anyhow with context.
//
// Per-record problems (bad prefixes, empty fields, label
// count mismatch) are NOT errors — they are logged and the
// record is skipped or patched.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PrepError {
    /// `test_size` must lie strictly between 0 and 1
    #[error("test_size must be between 0 and 1 (exclusive), got {0}")]
    InvalidTestSize(f64),

    /// `val_ratio_of_test` must lie in [0, 1]
    #[error("val_ratio_of_test must be between 0 and 1 (inclusive), got {0}")]
    InvalidValRatio(f64),

    /// A dialogue source names a format with no formatter variant
    #[error("unsupported dialogue source format '{format}' for source '{source_name}'")]
    UnsupportedSource { source_name: String, format: String },

    /// A record is missing a column the formatter needs
    #[error("record {index}: missing required field '{field}'")]
    MissingField { field: String, index: usize },

    /// A column holds the wrong JSON type (e.g. a string instead of a list)
    #[error("record {index}: field '{field}' must be {expected}")]
    InvalidField { field: String, index: usize, expected: &'static str },

    /// The configured subset does not exist in the loaded dataset
    #[error("dataset '{source_name}' has no subset '{subset}'")]
    MissingSubset { source_name: String, subset: String },

    /// Anything else wrong with the configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Normalization kept changing the text
    #[error("text did not stabilise after {0} normalization passes")]
    Unstable(usize),
}
