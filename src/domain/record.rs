// ============================================================
// Layer 3 — Canonical Record Types
// ============================================================
// Every source schema is mapped into one of two shapes:
//
//   DialogueRecord    { source, dialogue: [ {role, text}, ... ] }
//   InstructionRecord { source, instruction, output }
//
// Raw records stay as untyped JSON objects until a formatter
// copies them into one of these shapes.
//
// Reference: Rust Book §5 (Structs), §6 (Enums)

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::traits::{FieldLookup, TextUnits};

/// A source-specific record exactly as the loader produced it.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Speaker of a dialogue turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User   => "user",
            Role::Bot    => "bot",
            Role::System => "system",
        }
    }

    /// Role for the turn at `position` in a strictly alternating
    /// conversation that starts with the user.
    pub fn alternating(position: usize) -> Self {
        if position % 2 == 0 { Role::User } else { Role::Bot }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One utterance in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self { role, text: text.into() }
    }
}

/// A whole conversation. `dialogue` is never empty once a
/// formatter has produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueRecord {
    pub source:   String,
    pub dialogue: Vec<Turn>,
}

impl DialogueRecord {
    pub fn new(source: impl Into<String>, dialogue: Vec<Turn>) -> Self {
        Self { source: source.into(), dialogue }
    }

    pub fn turn_count(&self) -> usize {
        self.dialogue.len()
    }
}

/// A single-turn instruction/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionRecord {
    /// Absent in plain `{instruction, output}` files
    #[serde(default)]
    pub source:      String,
    pub instruction: String,
    pub output:      String,
}

impl InstructionRecord {
    pub fn new(
        source:      impl Into<String>,
        instruction: impl Into<String>,
        output:      impl Into<String>,
    ) -> Self {
        Self {
            source:      source.into(),
            instruction: instruction.into(),
            output:      output.into(),
        }
    }

    /// Both fields carry text. A leading tag from `tags` (a difficulty
    /// tag such as `<hard>`) does not count as instruction text.
    pub fn is_complete(&self, tags: &BTreeSet<String>) -> bool {
        let instruction = strip_leading_tag(&self.instruction, tags);
        !instruction.trim().is_empty() && !self.output.trim().is_empty()
    }
}

fn strip_leading_tag<'a>(text: &'a str, tags: &BTreeSet<String>) -> &'a str {
    let text = text.trim_start();
    tags.iter()
        .find_map(|tag| text.strip_prefix(tag.as_str()))
        .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        .unwrap_or(text)
}

/// Either canonical shape; used when dialogue and instruction
/// partitions are combined into one output list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalRecord {
    Dialogue(DialogueRecord),
    Instruction(InstructionRecord),
}

impl From<DialogueRecord> for CanonicalRecord {
    fn from(r: DialogueRecord) -> Self {
        CanonicalRecord::Dialogue(r)
    }
}

impl From<InstructionRecord> for CanonicalRecord {
    fn from(r: InstructionRecord) -> Self {
        CanonicalRecord::Instruction(r)
    }
}

// ─── Trait impls ──────────────────────────────────────────────────────────────

impl FieldLookup for DialogueRecord {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "source"   => Some(Cow::Borrowed(self.source.as_str())),
            // The whole conversation as one string, role-tagged so that
            // identical text spoken by different roles does not collide
            "dialogue" => Some(Cow::Owned(
                self.dialogue
                    .iter()
                    .map(|t| format!("{}: {}", t.role, t.text))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )),
            _ => None,
        }
    }
}

impl FieldLookup for InstructionRecord {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "source"      => Some(Cow::Borrowed(self.source.as_str())),
            "instruction" => Some(Cow::Borrowed(self.instruction.as_str())),
            "output"      => Some(Cow::Borrowed(self.output.as_str())),
            _ => None,
        }
    }
}

impl FieldLookup for RawRecord {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match self.get(name)? {
            serde_json::Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            serde_json::Value::Null      => None,
            other                        => Some(Cow::Owned(other.to_string())),
        }
    }
}

impl TextUnits for DialogueRecord {
    fn text_units(&self) -> Vec<&str> {
        self.dialogue.iter().map(|t| t.text.as_str()).collect()
    }
}

impl TextUnits for InstructionRecord {
    fn text_units(&self) -> Vec<&str> {
        vec![self.instruction.as_str(), self.output.as_str()]
    }
}
