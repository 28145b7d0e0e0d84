// ============================================================
// Layer 4 — JSON Dataset Loader
// ============================================================
// Reads raw records from local JSON files.
//
// Three shapes are understood:
//
//   records file   [ {...}, {...} ]
//   subset file    { "train": [ {...} ], "validation": [ ... ] }
//   subset dir     data/daily/
//                    ├── train.json        ← records file
//                    ├── validation.json
//                    └── test.json
//
//   label file     [ "easy", "hard", ... ]   (difficulty labels)
//
// A path pointing at a directory is read as a subset dir; a file
// is read as a subset file. Subsets come back in a BTreeMap so
// iteration order does not depend on the filesystem.
//
// Reference: serde_json crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::{fs, path::Path};

use crate::data::normalizer::coerce_text;
use crate::domain::record::RawRecord;

/// Raw records keyed by subset name (train / validation / test / ...).
pub type SubsetMap = BTreeMap<String, Vec<RawRecord>>;

pub struct JsonLoader;

impl JsonLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a JSON array of objects.
    pub fn load_records(&self, path: &Path) -> Result<Vec<RawRecord>> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;

        let records: Vec<RawRecord> = serde_json::from_str(&text)
            .with_context(|| format!("'{}' is not a JSON array of objects", path.display()))?;

        tracing::debug!("Loaded {} records from '{}'", records.len(), path.display());
        Ok(records)
    }

    /// Load every subset of a dataset, from a subset file or a subset dir.
    pub fn load_subsets(&self, path: &Path) -> Result<SubsetMap> {
        let subsets = if path.is_dir() {
            self.load_subset_dir(path)?
        } else {
            self.load_subset_file(path)?
        };

        let total: usize = subsets.values().map(Vec::len).sum();
        tracing::info!(
            "Loaded {} subsets ({} records) from '{}'",
            subsets.len(),
            total,
            path.display()
        );
        Ok(subsets)
    }

    /// Load a JSON array of difficulty labels. Non-string entries are
    /// converted to their text form with a warning.
    pub fn load_labels(&self, path: &Path) -> Result<Vec<String>> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read labels '{}'", path.display()))?;

        let values: Vec<Value> = serde_json::from_str(&text)
            .with_context(|| format!("'{}' is not a JSON array", path.display()))?;

        Ok(values.iter().map(coerce_text).collect())
    }

    fn load_subset_file(&self, path: &Path) -> Result<SubsetMap> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;

        let subsets: SubsetMap = serde_json::from_str(&text).with_context(|| {
            format!(
                "'{}' must be an object mapping subset names to record arrays",
                path.display()
            )
        })?;
        Ok(subsets)
    }

    fn load_subset_dir(&self, dir: &Path) -> Result<SubsetMap> {
        let mut subsets = SubsetMap::new();

        for entry in fs::read_dir(dir)
            .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
        {
            let entry = entry?;
            let path  = entry.path();

            // Only <subset>.json files; anything else is ignored
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(subset) = path.file_stem().and_then(|s| s.to_str()) else {
                tracing::warn!("Skipping '{}': file name is not valid UTF-8", path.display());
                continue;
            };

            let records = self.load_records(&path)?;
            subsets.insert(subset.to_string(), records);
        }

        if subsets.is_empty() {
            bail!("No <subset>.json files found in '{}'", dir.display());
        }
        Ok(subsets)
    }
}

impl Default for JsonLoader {
    fn default() -> Self {
        Self::new()
    }
}
