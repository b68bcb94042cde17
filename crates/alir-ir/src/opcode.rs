//! The abstract opcode vocabulary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opcode {
    // Memory
    Alloca,
    Load,
    Store,
    GetPtr,
    Bitcast,
    Sizeof,
    AllocHeap,
    Free,

    // Arithmetic (integer)
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Arithmetic (floating)
    FAdd,
    FSub,
    FMul,
    FDiv,

    // Compare
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    Neq,

    // Bitwise
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Not,

    // Control
    Jump,
    Condi,
    Switch,
    Call,
    Ret,
    Cast,

    // Iteration
    IterInit,
    IterValid,
    IterGet,
    IterNext,

    // Coroutine (pre-lowering only; invariant 6 forbids this surviving
    // coroutine lowering)
    Yield,
}

impl Opcode {
    pub fn is_terminator(self) -> bool {
        matches!(self, Opcode::Jump | Opcode::Condi | Opcode::Switch | Opcode::Ret)
    }

    pub fn is_floating_arith(self) -> bool {
        matches!(self, Opcode::FAdd | Opcode::FSub | Opcode::FMul | Opcode::FDiv)
    }

    pub fn is_integer_arith(self) -> bool {
        matches!(self, Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod)
    }

    pub fn is_compare(self) -> bool {
        matches!(
            self,
            Opcode::Lt | Opcode::Gt | Opcode::Lte | Opcode::Gte | Opcode::Eq | Opcode::Neq
        )
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Alloca => "alloca",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::GetPtr => "get_ptr",
            Opcode::Bitcast => "bitcast",
            Opcode::Sizeof => "sizeof",
            Opcode::AllocHeap => "alloc_heap",
            Opcode::Free => "free",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mod => "mod",
            Opcode::FAdd => "fadd",
            Opcode::FSub => "fsub",
            Opcode::FMul => "fmul",
            Opcode::FDiv => "fdiv",
            Opcode::Lt => "lt",
            Opcode::Gt => "gt",
            Opcode::Lte => "lte",
            Opcode::Gte => "gte",
            Opcode::Eq => "eq",
            Opcode::Neq => "neq",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Shl => "shl",
            Opcode::Shr => "shr",
            Opcode::Not => "not",
            Opcode::Jump => "jump",
            Opcode::Condi => "condi",
            Opcode::Switch => "switch",
            Opcode::Call => "call",
            Opcode::Ret => "ret",
            Opcode::Cast => "cast",
            Opcode::IterInit => "iter_init",
            Opcode::IterValid => "iter_valid",
            Opcode::IterGet => "iter_get",
            Opcode::IterNext => "iter_next",
            Opcode::Yield => "yield",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_four_control_opcodes_are_terminators() {
        assert!(Opcode::Jump.is_terminator());
        assert!(Opcode::Condi.is_terminator());
        assert!(Opcode::Switch.is_terminator());
        assert!(Opcode::Ret.is_terminator());
        assert!(!Opcode::Call.is_terminator());
        assert!(!Opcode::Add.is_terminator());
    }

    #[test]
    fn floating_and_integer_arith_are_disjoint() {
        for op in [Opcode::Add, Opcode::Sub, Opcode::Mul, Opcode::Div, Opcode::Mod] {
            assert!(op.is_integer_arith());
            assert!(!op.is_floating_arith());
        }
        for op in [Opcode::FAdd, Opcode::FSub, Opcode::FMul, Opcode::FDiv] {
            assert!(op.is_floating_arith());
            assert!(!op.is_integer_arith());
        }
    }

    #[test]
    fn mnemonic_matches_textual_emitter_spelling() {
        assert_eq!(Opcode::GetPtr.mnemonic(), "get_ptr");
        assert_eq!(Opcode::AllocHeap.mnemonic(), "alloc_heap");
        assert_eq!(Opcode::IterValid.mnemonic(), "iter_valid");
    }
}
