//! The IR Verifier: three independent sub-checks over a
//! [`alir_ir::Module`] — CFG shape, operand types, memory discipline.
//! Functions with no blocks (declarations) are skipped.

pub mod cfg;
pub mod ctx;
pub mod memory;
pub mod typecheck;

use alir_ir::{DiagnosticSink, Module};

use ctx::VerifyCtx;

/// The error count from this stage: a positive count
/// means the module must not be handed to a backend.
pub struct VerifyResult {
    pub error_count: u32,
}

pub fn verify<S: DiagnosticSink>(module: &Module, filename: impl Into<String>, sink: &mut S) -> VerifyResult {
    let mut ctx = VerifyCtx::new(filename, sink);
    for func in &module.functions {
        if func.is_declaration() {
            continue;
        }
        cfg::check_function(&mut ctx, func);
        typecheck::check_function(&mut ctx, func);
        memory::check_function(&mut ctx, func);
    }
    VerifyResult { error_count: ctx.error_count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alir_ir::{BasicBlock, CollectingSink, Function, Instruction, Opcode, Type};

    #[test]
    fn declaration_only_functions_are_skipped() {
        let module = Module { functions: vec![Function::new("extern_fn", Type::void(), vec![])], ..Module::new() };
        let mut sink = CollectingSink::new();
        let result = verify(&module, "main.alir", &mut sink);
        assert_eq!(result.error_count, 0);
    }

    #[test]
    fn a_well_formed_function_verifies_clean() {
        let mut entry = BasicBlock::new("entry");
        entry.push(Instruction::new(Opcode::Ret, 1, 1));
        let mut func = Function::new("_Z3onev", Type::int(), vec![]);
        func.push_block(entry);
        let module = Module { functions: vec![func], ..Module::new() };
        let mut sink = CollectingSink::new();
        let result = verify(&module, "main.alir", &mut sink);
        assert_eq!(result.error_count, 0);
    }

    #[test]
    fn a_dangling_jump_is_reported() {
        let mut entry = BasicBlock::new("entry");
        entry.push(Instruction::new(Opcode::Jump, 1, 1).with_operand(alir_ir::Value::Label { name: "ghost".into() }));
        let mut func = Function::new("_Z3onev", Type::void(), vec![]);
        func.push_block(entry);
        let module = Module { functions: vec![func], ..Module::new() };
        let mut sink = CollectingSink::new();
        let result = verify(&module, "main.alir", &mut sink);
        assert_eq!(result.error_count, 1);
    }
}
