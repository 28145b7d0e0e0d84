// ============================================================
// Layer 4 — Dialogue Formatter
// ============================================================
// Maps source-specific dialogue schemas into DialogueRecord.
// One enum variant per source family:
//
//   PersonaTagged  every record holds a list of lines, each
//                  starting with a speaker prefix
//                  ("User 1: hi") that maps to a role.
//                  Lines with no known prefix are dropped.
//
//   IdGrouped      every record is ONE utterance tagged with a
//                  conversation id. Utterances are grouped by id
//                  (first-seen order) and roles alternate by
//                  position, starting with the user.
//
// New source families get a new variant, not a new string test.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::data::normalizer::coerce_text;
use crate::domain::error::PrepError;
use crate::domain::record::{DialogueRecord, RawRecord, Role, Turn};
use crate::domain::traits::RecordFormatter;

/// Maps a line prefix to the speaker role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePrefix {
    pub prefix: String,
    pub role:   Role,
}

impl RolePrefix {
    pub fn new(prefix: impl Into<String>, role: Role) -> Self {
        Self { prefix: prefix.into(), role }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogueFormat {
    PersonaTagged {
        text_key:      String,
        role_prefixes: Vec<RolePrefix>,
    },
    IdGrouped {
        id_key:   String,
        text_key: String,
    },
}

impl DialogueFormat {
    pub const PERSONA_TAGGED: &'static str = "persona_tagged";
    pub const ID_GROUPED:     &'static str = "id_grouped";
}

pub struct DialogueFormatter {
    source: String,
    format: DialogueFormat,
}

impl DialogueFormatter {
    pub fn new(source: impl Into<String>, format: DialogueFormat) -> Self {
        Self { source: source.into(), format }
    }

    fn format_persona_tagged(
        &self,
        records:       &[RawRecord],
        text_key:      &str,
        role_prefixes: &[RolePrefix],
    ) -> Result<Vec<DialogueRecord>, PrepError> {
        let mut dialogues = Vec::new();
        let mut dropped   = 0usize;

        for (index, record) in records.iter().enumerate() {
            let lines = match record.get(text_key) {
                Some(Value::Array(lines)) => lines,
                Some(_) => {
                    return Err(PrepError::InvalidField {
                        field:    text_key.to_string(),
                        index,
                        expected: "a list of strings",
                    })
                }
                None => {
                    return Err(PrepError::MissingField { field: text_key.to_string(), index })
                }
            };

            let mut turns = Vec::with_capacity(lines.len());
            for line in lines {
                let line = coerce_text(line);
                let matched = role_prefixes
                    .iter()
                    .find(|rp| line.starts_with(rp.prefix.as_str()));

                match matched {
                    Some(rp) => {
                        let text = line[rp.prefix.len()..].trim();
                        turns.push(Turn::new(rp.role, text));
                    }
                    None => {
                        dropped += 1;
                        tracing::debug!("Unrecognized line in record {index}: {line}");
                    }
                }
            }

            if !turns.is_empty() {
                dialogues.push(DialogueRecord::new(self.source.clone(), turns));
            }
        }

        if dropped > 0 {
            tracing::warn!("{}: dropped {} lines with no known speaker prefix", self.source, dropped);
        }
        Ok(dialogues)
    }

    fn format_id_grouped(
        &self,
        records:  &[RawRecord],
        id_key:   &str,
        text_key: &str,
    ) -> Result<Vec<DialogueRecord>, PrepError> {
        // id → position in `groups`, so conversations keep first-seen order
        let mut index_of: HashMap<String, usize> = HashMap::new();
        let mut groups:   Vec<Vec<String>>       = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let id = record
                .get(id_key)
                .map(id_string)
                .ok_or_else(|| PrepError::MissingField { field: id_key.to_string(), index })?;
            let text = record
                .get(text_key)
                .map(coerce_text)
                .ok_or_else(|| PrepError::MissingField { field: text_key.to_string(), index })?;

            let slot = *index_of.entry(id).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(text);
        }

        let dialogues = groups
            .into_iter()
            .map(|utterances| {
                let turns = utterances
                    .into_iter()
                    .enumerate()
                    .map(|(pos, text)| Turn::new(Role::alternating(pos), text))
                    .collect();
                DialogueRecord::new(self.source.clone(), turns)
            })
            .collect();

        Ok(dialogues)
    }
}

impl RecordFormatter for DialogueFormatter {
    type Output = DialogueRecord;

    fn format_records(&self, records: &[RawRecord]) -> Result<Vec<DialogueRecord>, PrepError> {
        let dialogues = match &self.format {
            DialogueFormat::PersonaTagged { text_key, role_prefixes } => {
                self.format_persona_tagged(records, text_key, role_prefixes)?
            }
            DialogueFormat::IdGrouped { id_key, text_key } => {
                self.format_id_grouped(records, id_key, text_key)?
            }
        };

        tracing::info!(
            "{}: formatted {} records into {} dialogues",
            self.source,
            records.len(),
            dialogues.len()
        );
        Ok(dialogues)
    }
}

/// Conversation ids may be strings or numbers; both group the same way.
fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other            => other.to_string(),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> Vec<RawRecord> {
        serde_json::from_str(json).unwrap()
    }

    fn persona() -> DialogueFormatter {
        DialogueFormatter::new(
            "persona-chat",
            DialogueFormat::PersonaTagged {
                text_key: "dialogue".to_string(),
                role_prefixes: vec![
                    RolePrefix::new("User 1:", Role::User),
                    RolePrefix::new("User 2:", Role::Bot),
                ],
            },
        )
    }

    fn daily() -> DialogueFormatter {
        DialogueFormatter::new(
            "daily_dialog",
            DialogueFormat::IdGrouped {
                id_key:   "dialog_id".to_string(),
                text_key: "utterance".to_string(),
            },
        )
    }

    #[test]
    fn test_persona_prefixes_map_to_roles() {
        let records = raw(r#"[{"dialogue": ["User 1: hi there", "User 2:  hello ", "User 1: bye"]}]"#);
        let out = persona().format_records(&records).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "persona-chat");
        assert_eq!(
            out[0].dialogue,
            vec![
                Turn::new(Role::User, "hi there"),
                Turn::new(Role::Bot,  "hello"),
                Turn::new(Role::User, "bye"),
            ]
        );
    }

    #[test]
    fn test_persona_unknown_prefix_lines_are_dropped() {
        let records = raw(r#"[
            {"dialogue": ["Narrator: once", "User 2: ok"]},
            {"dialogue": ["Narrator: nothing usable"]}
        ]"#);
        let out = persona().format_records(&records).unwrap();
        // second record has no usable lines and is skipped entirely
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dialogue, vec![Turn::new(Role::Bot, "ok")]);
    }

    #[test]
    fn test_persona_missing_or_bad_column_fails() {
        let err = persona().format_records(&raw(r#"[{"lines": []}]"#)).unwrap_err();
        assert_eq!(err, PrepError::MissingField { field: "dialogue".into(), index: 0 });

        let err = persona().format_records(&raw(r#"[{"dialogue": "User 1: hi"}]"#)).unwrap_err();
        assert!(matches!(err, PrepError::InvalidField { index: 0, .. }));
    }

    #[test]
    fn test_id_grouped_alternates_roles_in_first_seen_order() {
        let records = raw(r#"[
            {"dialog_id": "b", "utterance": "b0"},
            {"dialog_id": "a", "utterance": "a0"},
            {"dialog_id": "b", "utterance": "b1"},
            {"dialog_id": "b", "utterance": "b2"},
            {"dialog_id": "a", "utterance": "a1"}
        ]"#);
        let out = daily().format_records(&records).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0].dialogue,
            vec![
                Turn::new(Role::User, "b0"),
                Turn::new(Role::Bot,  "b1"),
                Turn::new(Role::User, "b2"),
            ]
        );
        assert_eq!(out[1].dialogue[1], Turn::new(Role::Bot, "a1"));
    }

    #[test]
    fn test_id_grouped_numeric_ids() {
        let records = raw(r#"[
            {"dialog_id": 1, "utterance": "x"},
            {"dialog_id": 1, "utterance": "y"}
        ]"#);
        let out = daily().format_records(&records).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].turn_count(), 2);
    }

    #[test]
    fn test_id_grouped_missing_id_fails() {
        let err = daily()
            .format_records(&raw(r#"[{"dialog_id": "a", "utterance": "x"}, {"utterance": "y"}]"#))
            .unwrap_err();
        assert_eq!(err, PrepError::MissingField { field: "dialog_id".into(), index: 1 });
    }
}
