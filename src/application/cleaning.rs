//! Applies the normalizer to canonical records.
//!
//! Cleaning can empty a field (a turn that was only a tag, an
//! answer that was only a code block). Empty turns are removed,
//! dialogues left with no turns are removed, and instruction
//! records missing either side are removed (a difficulty tag alone
//! is not an instruction). The counts come back
//! alongside the records so callers can report them.

use std::collections::BTreeSet;

use crate::data::normalizer::TextNormalizer;
use crate::domain::record::{DialogueRecord, InstructionRecord, Turn};

#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned<R> {
    pub records:         Vec<R>,
    pub dropped_turns:   usize,
    pub dropped_records: usize,
}

pub fn clean_dialogues(
    normalizer: &TextNormalizer,
    dialogues:  Vec<DialogueRecord>,
) -> Cleaned<DialogueRecord> {
    let mut records         = Vec::with_capacity(dialogues.len());
    let mut dropped_turns   = 0;
    let mut dropped_records = 0;

    for dialogue in dialogues {
        let texts: Vec<String> = dialogue.dialogue.iter().map(|t| t.text.clone()).collect();
        let clean = normalizer.normalize_dialogue(&texts);

        let before = dialogue.dialogue.len();
        let turns: Vec<Turn> = dialogue
            .dialogue
            .into_iter()
            .zip(clean)
            .filter(|(_, text)| !text.is_empty())
            .map(|(turn, text)| Turn::new(turn.role, text))
            .collect();
        dropped_turns += before - turns.len();

        if turns.is_empty() {
            dropped_records += 1;
            continue;
        }
        records.push(DialogueRecord::new(dialogue.source, turns));
    }

    if dropped_turns > 0 || dropped_records > 0 {
        tracing::warn!(
            "Cleaning emptied {} turns; {} dialogues dropped",
            dropped_turns,
            dropped_records
        );
    }
    Cleaned { records, dropped_turns, dropped_records }
}

pub fn clean_instructions(
    normalizer: &TextNormalizer,
    records:    Vec<InstructionRecord>,
    tags:       &BTreeSet<String>,
) -> Cleaned<InstructionRecord> {
    let total = records.len();

    let cleaned: Vec<InstructionRecord> = records
        .into_iter()
        .map(|r| InstructionRecord {
            instruction: normalizer.normalize_instruction(&r.instruction),
            output:      normalizer.normalize_instruction(&r.output),
            source:      r.source,
        })
        .filter(|r| r.is_complete(tags))
        .collect();

    let dropped_records = total - cleaned.len();
    if dropped_records > 0 {
        tracing::warn!("Dropped {} instruction records emptied by cleaning", dropped_records);
    }
    Cleaned { records: cleaned, dropped_turns: 0, dropped_records }
}
