// ============================================================
// Layer 4 — Model Input Formatters
// ============================================================
// Flatten canonical records into plain training text.
//
// Dialogue:                    Instruction:
//   USER: hi                     question: What is Rust?
//   BOT: hello                   answer: A language.
//   <blank>                      <blank>
//
// Lines are joined with "\n"; every conversation or pair is
// followed by a blank line.

use crate::domain::record::{DialogueRecord, InstructionRecord};
use crate::domain::traits::ModelFormatter;

pub struct DialogueModelFormatter;

impl ModelFormatter<DialogueRecord> for DialogueModelFormatter {
    fn format_for_model(&self, conversations: &[DialogueRecord]) -> String {
        if conversations.is_empty() {
            tracing::warn!("No conversations to format.");
            return String::new();
        }

        let mut lines       = Vec::new();
        let mut total_turns = 0usize;

        for conv in conversations {
            for turn in &conv.dialogue {
                let text = turn.text.trim();
                if text.is_empty() {
                    tracing::debug!("Skipped empty utterance.");
                    continue;
                }
                lines.push(format!("{}: {}", turn.role.as_str().to_uppercase(), text));
                total_turns += 1;
            }
            lines.push(String::new());
        }

        tracing::info!(
            "Formatted {} conversations with {} turns.",
            conversations.len(),
            total_turns
        );
        lines.join("\n")
    }
}

pub struct InstructionModelFormatter;

impl ModelFormatter<InstructionRecord> for InstructionModelFormatter {
    fn format_for_model(&self, records: &[InstructionRecord]) -> String {
        let mut lines = Vec::with_capacity(records.len() * 3);
        for record in records {
            lines.push(format!("question: {}", record.instruction));
            lines.push(format!("answer: {}", record.output));
            lines.push(String::new());
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{Role, Turn};

    #[test]
    fn test_dialogue_text_layout() {
        let convs = vec![
            DialogueRecord::new("s", vec![Turn::new(Role::User, "hi"), Turn::new(Role::Bot, " ")]),
            DialogueRecord::new("s", vec![Turn::new(Role::Bot, "yo")]),
        ];
        let text = DialogueModelFormatter.format_for_model(&convs);
        assert_eq!(text, "USER: hi\n\nBOT: yo\n");
    }

    #[test]
    fn test_dialogue_empty_input() {
        assert_eq!(DialogueModelFormatter.format_for_model(&[]), "");
    }

    #[test]
    fn test_instruction_text_layout() {
        let recs = vec![
            InstructionRecord::new("s", "q1", "a1"),
            InstructionRecord::new("s", "q2", "a2"),
        ];
        let text = InstructionModelFormatter.format_for_model(&recs);
        assert_eq!(text, "question: q1\nanswer: a1\n\nquestion: q2\nanswer: a2\n");
    }
}
