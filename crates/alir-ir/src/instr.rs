//! IR [`Instruction`]s.

use serde::{Deserialize, Serialize};

use crate::opcode::Opcode;
use crate::value::Value;

/// One `(constant, target label)` pair in a `switch`'s case table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseEntry {
    pub value: i64,
    pub label: String,
}

/// One IR instruction.
///
/// Operand slots are deliberately generic rather than one struct per
/// opcode: `args` doubles as a call's argument vector and as the "false"
/// branch target for `condi` (`args[0]`), matching the abstract opcode
/// table rather than inventing a variant-per-opcode enum.
///
/// Branch-target extraction reads `operands[0]` as `condi`'s true-target
/// label, so a condition value carried alongside it lives at `operands[1]`
/// instead. `switch`'s case table already supplies every target (plus
/// `args[0]` for the default), leaving `operands[0]` free for the selector
/// value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub dest: Option<Value>,
    pub operands: Vec<Value>,
    pub args: Vec<Value>,
    pub cases: Option<Vec<CaseEntry>>,
    pub line: u32,
    pub col: u32,
}

impl Instruction {
    pub fn new(opcode: Opcode, line: u32, col: u32) -> Self {
        Instruction {
            opcode,
            dest: None,
            operands: Vec::new(),
            args: Vec::new(),
            cases: None,
            line,
            col,
        }
    }

    pub fn with_dest(mut self, dest: Value) -> Self {
        self.dest = Some(dest);
        self
    }

    pub fn with_operand(mut self, operand: Value) -> Self {
        self.operands.push(operand);
        self
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_cases(mut self, cases: Vec<CaseEntry>) -> Self {
        self.cases = Some(cases);
        self
    }

    pub fn is_terminator(&self) -> bool {
        self.opcode.is_terminator()
    }

    /// Every block label this instruction can transfer control to, derived
    /// from operand/arg/case-table shape rather than a separate "targets"
    /// field: `jump`'s operand, `condi`'s true (operand) and false (`args[0]`)
    /// targets, and every `switch` case plus its default.
    pub fn branch_targets(&self) -> Vec<&str> {
        let mut targets = Vec::new();
        match self.opcode {
            Opcode::Jump => {
                if let Some(Value::Label { name }) = self.operands.first() {
                    targets.push(name.as_str());
                }
            }
            Opcode::Condi => {
                if let Some(Value::Label { name }) = self.operands.first() {
                    targets.push(name.as_str());
                }
                if let Some(Value::Label { name }) = self.args.first() {
                    targets.push(name.as_str());
                }
            }
            Opcode::Switch => {
                if let Some(cases) = &self.cases {
                    targets.extend(cases.iter().map(|c| c.label.as_str()));
                }
                if let Some(Value::Label { name }) = self.args.first() {
                    targets.push(name.as_str());
                }
            }
            _ => {}
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn jump_branch_targets_reads_sole_operand() {
        let instr = Instruction::new(Opcode::Jump, 1, 1)
            .with_operand(Value::Label { name: "merge".into() });
        assert_eq!(instr.branch_targets(), vec!["merge"]);
    }

    #[test]
    fn condi_branch_targets_reads_operand_and_args() {
        let instr = Instruction::new(Opcode::Condi, 1, 1)
            .with_operand(Value::Label { name: "then".into() })
            .with_args(vec![Value::Label { name: "else_".into() }]);
        assert_eq!(instr.branch_targets(), vec!["then", "else_"]);
    }

    #[test]
    fn switch_branch_targets_includes_every_case_and_default() {
        let instr = Instruction::new(Opcode::Switch, 1, 1)
            .with_cases(vec![
                CaseEntry { value: 1, label: "case_1".into() },
                CaseEntry { value: 2, label: "case_2".into() },
            ])
            .with_args(vec![Value::Label { name: "default".into() }]);
        assert_eq!(instr.branch_targets(), vec!["case_1", "case_2", "default"]);
    }

    #[test]
    fn non_branching_instruction_has_no_targets() {
        let instr = Instruction::new(Opcode::Add, 1, 1);
        assert!(instr.branch_targets().is_empty());
    }

    #[test]
    fn builder_methods_compose() {
        let instr = Instruction::new(Opcode::Store, 3, 4)
            .with_operand(Value::ConstInt { value: 1, ty: Type::int() })
            .with_operand(Value::Local { name: "x".into(), ty: Type::int().pointer_to() });
        assert_eq!(instr.operands.len(), 2);
        assert_eq!(instr.line, 3);
        assert_eq!(instr.col, 4);
    }
}
