//! IR [`Function`]s.

use serde::{Deserialize, Serialize};

use crate::block::BasicBlock;
use crate::types::Type;

/// One function in an IR [`crate::module::Module`].
///
/// `blocks` is empty for a declaration-only function (no body was lowered);
/// the verifier skips those per convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub mangled_name: String,
    pub return_type: Type,
    pub params: Vec<Type>,
    pub blocks: Vec<BasicBlock>,
    /// Set when this function originated from a `flux` declaration — either
    /// the generated factory or its paired `_Resume` function.
    pub is_flux: bool,
}

impl Function {
    pub fn new(mangled_name: impl Into<String>, return_type: Type, params: Vec<Type>) -> Self {
        Function {
            mangled_name: mangled_name.into(),
            return_type,
            params,
            blocks: Vec::new(),
            is_flux: false,
        }
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn push_block(&mut self, block: BasicBlock) {
        self.blocks.push(block);
    }

    pub fn block(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_function_is_a_declaration_until_a_block_is_pushed() {
        let mut f = Function::new("_Z3addii", Type::int(), vec![Type::int(), Type::int()]);
        assert!(f.is_declaration());
        f.push_block(BasicBlock::new("entry"));
        assert!(!f.is_declaration());
    }

    #[test]
    fn block_lookup_by_label() {
        let mut f = Function::new("f", Type::void(), vec![]);
        f.push_block(BasicBlock::new("entry"));
        f.push_block(BasicBlock::new("end"));
        assert!(f.block("end").is_some());
        assert!(f.block("missing").is_none());
    }
}
