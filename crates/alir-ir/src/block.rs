//! IR [`BasicBlock`]s.

use serde::{Deserialize, Serialize};

use crate::instr::Instruction;

/// A straight-line instruction sequence with a stable label.
///
/// Successor edges are implicit, read off the terminator via
/// [`Instruction::branch_targets`] rather than stored redundantly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasicBlock {
    pub label: String,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(label: impl Into<String>) -> Self {
        BasicBlock {
            label: label.into(),
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, instr: Instruction) {
        self.instructions.push(instr);
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|i| i.is_terminator())
    }

    pub fn has_terminator(&self) -> bool {
        self.terminator().is_some()
    }

    pub fn successors(&self) -> Vec<&str> {
        self.terminator().map(|t| t.branch_targets()).unwrap_or_default()
    }
}
