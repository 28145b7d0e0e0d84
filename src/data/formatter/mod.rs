//! Source schema → canonical record formatters.

pub mod dialogue;
pub mod instruction;

pub use dialogue::{DialogueFormat, DialogueFormatter, RolePrefix};
pub use instruction::InstructionFormatter;
