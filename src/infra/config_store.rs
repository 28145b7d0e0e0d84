// ============================================================
// Layer 6 — Config Store
// ============================================================
// Reads and writes PrepareConfig as pretty JSON.
//
// `init-config` uses save() to write the defaults as a starting
// point; `prepare` uses load(). Loading only parses: validation
// is the caller's job so CLI overrides can be applied first.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::application::config::PrepareConfig;

pub struct ConfigStore;

impl ConfigStore {
    pub fn load(path: &Path) -> Result<PrepareConfig> {
        let json = fs::read_to_string(path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Run 'init-config' to create one.",
                path.display()
            )
        })?;

        let config = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config JSON in '{}'", path.display()))?;

        tracing::debug!("Loaded config from '{}'", path.display());
        Ok(config)
    }

    pub fn save(config: &PrepareConfig, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(config)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved config to '{}'", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load_gives_same_config() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf/prepare.json");

        let mut cfg = PrepareConfig::default();
        cfg.splitting.random_state = 1234;
        ConfigStore::save(&cfg, &path).unwrap();

        assert_eq!(ConfigStore::load(&path).unwrap(), cfg);
    }

    #[test]
    fn test_missing_config_hints_at_init() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigStore::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("init-config"));
    }
}
