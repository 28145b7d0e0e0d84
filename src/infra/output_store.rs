// ============================================================
// Layer 6 — Output Store
// ============================================================
// Writes pipeline results under one base directory:
//
//   out/
//     persona_train.json         ← pretty JSON array
//     merged_train.json
//     formatted_train.txt        ← flat model input text
//     ...
//
// JSON uses a 2-space indent and keeps non-ASCII characters
// literal (serde_json never escapes them). Parent directories
// are created on every write.

use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct OutputStore {
    base_dir: PathBuf,
}

impl OutputStore {
    /// Create the store, making sure the base directory exists.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("Cannot create output directory '{}'", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `<base>/<prefix>_<partition>.json`
    pub fn json_path(&self, prefix: &str, partition: &str) -> PathBuf {
        self.base_dir.join(format!("{prefix}_{partition}.json"))
    }

    /// `<base>/<prefix>_<partition>.txt`
    pub fn text_path(&self, prefix: &str, partition: &str) -> PathBuf {
        self.base_dir.join(format!("{prefix}_{partition}.txt"))
    }

    pub fn save_json<T: Serialize + ?Sized>(&self, data: &T, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let json = serde_json::to_string_pretty(data)
            .with_context(|| format!("Cannot serialise data for '{}'", path.display()))?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    pub fn save_text(&self, text: &str, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        fs::write(path, text)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
    }
    Ok(())
}
