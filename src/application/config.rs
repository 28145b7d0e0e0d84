// ============================================================
// Layer 2 — Pipeline Configuration
// ============================================================
// Everything a `prepare` run needs, loaded from one JSON file.
// Every section carries defaults (#[serde(default)]), so a
// partial file is valid:
//
//   {
//     "output":    { "base_dir": "out" },
//     "splitting": { "random_state": 7 },
//     "dialogue_sources": [ ... ]
//   }
//
// validate() checks ratios, formats and per-format keys before
// any data is read, so a bad config stops the run up front.
//
// Reference: serde documentation (container attributes)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::data::formatter::{DialogueFormat, RolePrefix};
use crate::data::splitter::DataSplitter;
use crate::domain::error::PrepError;
use crate::domain::record::Role;

pub const TRAIN:      &str = "train";
pub const VALIDATION: &str = "validation";
pub const TEST:       &str = "test";

/// Partition names in output order.
pub const PARTITIONS: [&str; 3] = [TRAIN, VALIDATION, TEST];

// ─── Top Level ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    pub output:              OutputConfig,
    pub splitting:           SplittingConfig,
    pub scanning:            ScanningConfig,
    pub dedup:               DedupConfig,
    pub merging:             MergingConfig,
    pub dialogue_sources:    Vec<DialogueSourceConfig>,
    pub instruction_sources: Vec<InstructionSourceConfig>,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            output:    OutputConfig::default(),
            splitting: SplittingConfig::default(),
            scanning:  ScanningConfig::default(),
            dedup:     DedupConfig::default(),
            merging:   MergingConfig::default(),
            dialogue_sources: vec![
                DialogueSourceConfig {
                    name:          "persona-chat".to_string(),
                    path:          "data/raw/persona-chat.json".to_string(),
                    format:        DialogueFormat::PERSONA_TAGGED.to_string(),
                    text_key:      "dialogue".to_string(),
                    id_key:        None,
                    role_prefixes: vec![
                        RolePrefix::new("User 1:", Role::User),
                        RolePrefix::new("User 2:", Role::Bot),
                    ],
                    resplit:       true,
                    split_subset:  TRAIN.to_string(),
                    subsets:       Vec::new(),
                    output_prefix: "persona".to_string(),
                },
                DialogueSourceConfig {
                    name:          "daily_dialog".to_string(),
                    path:          "data/raw/daily_dialog".to_string(),
                    format:        DialogueFormat::ID_GROUPED.to_string(),
                    text_key:      "utterance".to_string(),
                    id_key:        Some("dialog_id".to_string()),
                    role_prefixes: Vec::new(),
                    resplit:       false,
                    split_subset:  TRAIN.to_string(),
                    subsets:       PARTITIONS.iter().map(|s| s.to_string()).collect(),
                    output_prefix: "daily".to_string(),
                },
            ],
            instruction_sources: vec![InstructionSourceConfig {
                name:            "instructions".to_string(),
                path:            "data/raw/instructions.json".to_string(),
                difficulty_file: Some("data/raw/difficulty.json".to_string()),
            }],
        }
    }
}

// ─── Sections ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub base_dir:              String,
    pub merged:                String,
    pub formatted:             String,
    pub instruction:           String,
    pub formatted_instruction: String,
    pub combined:              String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir:              "data/processed".to_string(),
            merged:                "merged".to_string(),
            formatted:             "formatted".to_string(),
            instruction:           "instruction".to_string(),
            formatted_instruction: "formatted_instruction".to_string(),
            combined:              "combined".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplittingConfig {
    /// Holdout share for dialogue sources that are re-split
    pub test_size:             f64,
    /// Holdout share for instruction sources
    pub instruction_test_size: f64,
    /// Share of the holdout that goes to test; the rest is validation
    pub val_ratio_of_test:     f64,
    pub random_state:          u64,
}

impl Default for SplittingConfig {
    fn default() -> Self {
        Self {
            test_size:             0.15,
            instruction_test_size: 0.1,
            val_ratio_of_test:     0.48,
            random_state:          42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    pub enabled: bool,
    pub verbose: bool,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self { enabled: true, verbose: false }
    }
}

/// Deduplication policy per record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub instruction:      bool,
    pub instruction_keys: Vec<String>,
    pub dialogue:         bool,
    pub dialogue_keys:    Vec<String>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            instruction:      true,
            instruction_keys: vec!["instruction".to_string(), "output".to_string()],
            dialogue:         false,
            dialogue_keys:    vec!["source".to_string(), "dialogue".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergingConfig {
    /// Also write dialogue + instruction partitions as one combined list
    pub include_instruction: bool,
}

impl Default for MergingConfig {
    fn default() -> Self {
        Self { include_instruction: true }
    }
}

// ─── Sources ──────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueSourceConfig {
    pub name:   String,
    /// Subset JSON file or directory of <subset>.json files
    pub path:   String,
    /// "persona_tagged" or "id_grouped"
    pub format: String,
    pub text_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_prefixes: Vec<RolePrefix>,
    /// Re-split `split_subset` instead of using predefined subsets
    #[serde(default)]
    pub resplit: bool,
    #[serde(default = "default_split_subset")]
    pub split_subset: String,
    /// Predefined subsets to process when not re-splitting
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsets: Vec<String>,
    pub output_prefix: String,
}

fn default_split_subset() -> String {
    TRAIN.to_string()
}

impl DialogueSourceConfig {
    /// Resolve the configured format string to a formatter variant.
    pub fn dialogue_format(&self) -> Result<DialogueFormat, PrepError> {
        match self.format.as_str() {
            DialogueFormat::PERSONA_TAGGED => {
                if self.role_prefixes.is_empty() {
                    return Err(PrepError::InvalidConfig(format!(
                        "source '{}': persona_tagged format needs role_prefixes",
                        self.name
                    )));
                }
                Ok(DialogueFormat::PersonaTagged {
                    text_key:      self.text_key.clone(),
                    role_prefixes: self.role_prefixes.clone(),
                })
            }
            DialogueFormat::ID_GROUPED => {
                let id_key = self.id_key.clone().ok_or_else(|| {
                    PrepError::InvalidConfig(format!(
                        "source '{}': id_grouped format needs id_key",
                        self.name
                    ))
                })?;
                Ok(DialogueFormat::IdGrouped { id_key, text_key: self.text_key.clone() })
            }
            other => Err(PrepError::UnsupportedSource {
                source_name: self.name.clone(),
                format:      other.to_string(),
            }),
        }
    }

    /// Subsets this source reads: the re-split one, or the configured list
    /// (all three partitions when left empty).
    pub fn subsets_to_process(&self) -> Vec<String> {
        if self.resplit {
            vec![self.split_subset.clone()]
        } else if self.subsets.is_empty() {
            PARTITIONS.iter().map(|s| s.to_string()).collect()
        } else {
            self.subsets.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionSourceConfig {
    pub name: String,
    /// JSON array of {instruction, output} records
    pub path: String,
    /// Optional JSON array of difficulty labels, aligned by position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_file: Option<String>,
}

// ─── Validation ───────────────────────────────────────────────────────────────
impl PrepareConfig {
    pub fn validate(&self) -> Result<(), PrepError> {
        let s = &self.splitting;
        DataSplitter::validate(s.test_size, s.val_ratio_of_test)?;
        DataSplitter::validate(s.instruction_test_size, s.val_ratio_of_test)?;

        if self.output.base_dir.trim().is_empty() {
            return Err(PrepError::InvalidConfig("output.base_dir is empty".to_string()));
        }
        if self.dedup.instruction && self.dedup.instruction_keys.is_empty() {
            return Err(PrepError::InvalidConfig("dedup.instruction_keys is empty".to_string()));
        }
        if self.dedup.dialogue && self.dedup.dialogue_keys.is_empty() {
            return Err(PrepError::InvalidConfig("dedup.dialogue_keys is empty".to_string()));
        }

        let mut prefixes = HashSet::new();
        for source in &self.dialogue_sources {
            source.dialogue_format()?;

            if source.output_prefix.trim().is_empty() {
                return Err(PrepError::InvalidConfig(format!(
                    "source '{}': output_prefix is empty",
                    source.name
                )));
            }
            // two sources writing the same files would overwrite each other
            if !prefixes.insert(source.output_prefix.as_str()) {
                return Err(PrepError::InvalidConfig(format!(
                    "output_prefix '{}' is used by more than one source",
                    source.output_prefix
                )));
            }
        }

        for source in &self.instruction_sources {
            if source.path.trim().is_empty() {
                return Err(PrepError::InvalidConfig(format!(
                    "instruction source '{}': path is empty",
                    source.name
                )));
            }
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PrepareConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: PrepareConfig = serde_json::from_str(
            r#"{"splitting": {"random_state": 7}, "dialogue_sources": []}"#,
        )
        .unwrap();
        assert_eq!(cfg.splitting.random_state, 7);
        assert_eq!(cfg.splitting.test_size, 0.15);
        assert!(cfg.dialogue_sources.is_empty());
        assert_eq!(cfg.instruction_sources.len(), 1);
        assert!(cfg.dedup.instruction);
        assert!(!cfg.dedup.dialogue);
    }

    #[test]
    fn test_role_prefixes_round_trip_through_json() {
        let json = r#"{
            "name": "p", "path": "p.json", "format": "persona_tagged",
            "text_key": "dialogue", "output_prefix": "p",
            "role_prefixes": [{"prefix": "A:", "role": "user"}, {"prefix": "B:", "role": "bot"}]
        }"#;
        let src: DialogueSourceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(src.split_subset, "train");
        assert!(!src.resplit);
        match src.dialogue_format().unwrap() {
            DialogueFormat::PersonaTagged { role_prefixes, .. } => {
                assert_eq!(role_prefixes[1], RolePrefix::new("B:", Role::Bot));
            }
            other => panic!("unexpected format {other:?}"),
        }
    }

    #[test]
    fn test_unknown_format_is_unsupported() {
        let mut cfg = PrepareConfig::default();
        cfg.dialogue_sources[0].format = "reddit_threads".to_string();
        assert_eq!(
            cfg.validate(),
            Err(PrepError::UnsupportedSource {
                source_name: "persona-chat".to_string(),
                format:      "reddit_threads".to_string(),
            })
        );
    }

    #[test]
    fn test_id_grouped_requires_id_key() {
        let mut cfg = PrepareConfig::default();
        cfg.dialogue_sources[1].id_key = None;
        assert!(matches!(cfg.validate(), Err(PrepError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_ratios_fail_validation() {
        let mut cfg = PrepareConfig::default();
        cfg.splitting.instruction_test_size = 1.2;
        assert_eq!(cfg.validate(), Err(PrepError::InvalidTestSize(1.2)));

        let mut cfg = PrepareConfig::default();
        cfg.splitting.val_ratio_of_test = -0.5;
        assert_eq!(cfg.validate(), Err(PrepError::InvalidValRatio(-0.5)));
    }

    #[test]
    fn test_duplicate_output_prefix_rejected() {
        let mut cfg = PrepareConfig::default();
        cfg.dialogue_sources[1].output_prefix = "persona".to_string();
        assert!(matches!(cfg.validate(), Err(PrepError::InvalidConfig(_))));
    }

    #[test]
    fn test_subsets_to_process() {
        let cfg = PrepareConfig::default();
        assert_eq!(cfg.dialogue_sources[0].subsets_to_process(), vec!["train"]);
        assert_eq!(
            cfg.dialogue_sources[1].subsets_to_process(),
            vec!["train", "validation", "test"]
        );
    }
}
