//! CFG shape checks: one terminator per block, in
//! last position; every branch target exists; unreachable blocks warn.

use std::collections::HashSet;

use alir_ir::{DiagnosticSink, Function};

use crate::ctx::VerifyCtx;

pub fn check_function<S: DiagnosticSink>(ctx: &mut VerifyCtx<S>, func: &Function) {
    check_terminators(ctx, func);
    check_branch_targets(ctx, func);
    check_reachability(ctx, func);
}

fn check_terminators<S: DiagnosticSink>(ctx: &mut VerifyCtx<S>, func: &Function) {
    for block in &func.blocks {
        let Some((last, rest)) = block.instructions.split_last() else {
            ctx.error(0, 0, format!("block `{}` in `{}` has no instructions", block.label, func.mangled_name));
            continue;
        };
        if !last.is_terminator() {
            ctx.error(last.line, last.col, format!("block `{}` in `{}` does not end in a terminator", block.label, func.mangled_name));
        }
        for instr in rest {
            if instr.is_terminator() {
                ctx.error(
                    instr.line,
                    instr.col,
                    format!("block `{}` in `{}` has a terminator before its last instruction", block.label, func.mangled_name),
                );
            }
        }
    }
}

fn check_branch_targets<S: DiagnosticSink>(ctx: &mut VerifyCtx<S>, func: &Function) {
    let labels: HashSet<&str> = func.blocks.iter().map(|b| b.label.as_str()).collect();
    for block in &func.blocks {
        let Some(term) = block.terminator() else { continue };
        for target in term.branch_targets() {
            if !labels.contains(target) {
                ctx.error(
                    term.line,
                    term.col,
                    format!("block `{}` in `{}` branches to undefined block `{target}`", block.label, func.mangled_name),
                );
            }
        }
    }
}

/// Reachability from the entry block (the first, by construction). Only a
/// warning: dead code is not a correctness bug at the IR level.
fn check_reachability<S: DiagnosticSink>(ctx: &mut VerifyCtx<S>, func: &Function) {
    let Some(entry) = func.blocks.first() else { return };
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack = vec![entry.label.as_str()];
    while let Some(label) = stack.pop() {
        if !seen.insert(label) {
            continue;
        }
        if let Some(block) = func.block(label) {
            stack.extend(block.successors());
        }
    }
    for block in &func.blocks {
        if !seen.contains(block.label.as_str()) {
            ctx.warning(0, 0, format!("block `{}` in `{}` is unreachable", block.label, func.mangled_name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alir_ir::{BasicBlock, CollectingSink, Instruction, Opcode, Type, Value};

    fn func_with(blocks: Vec<BasicBlock>) -> Function {
        let mut f = Function::new("f", Type::void(), vec![]);
        for b in blocks {
            f.push_block(b);
        }
        f
    }

    #[test]
    fn block_without_terminator_is_an_error() {
        let mut b = BasicBlock::new("entry");
        b.push(Instruction::new(Opcode::Add, 1, 1));
        let func = func_with(vec![b]);
        let mut sink = CollectingSink::new();
        let mut ctx = VerifyCtx::new("main.alir", &mut sink);
        check_function(&mut ctx, &func);
        assert_eq!(ctx.error_count, 1);
    }

    #[test]
    fn jump_to_missing_block_is_an_error() {
        let mut b = BasicBlock::new("entry");
        b.push(Instruction::new(Opcode::Jump, 1, 1).with_operand(Value::Label { name: "nowhere".into() }));
        let func = func_with(vec![b]);
        let mut sink = CollectingSink::new();
        let mut ctx = VerifyCtx::new("main.alir", &mut sink);
        check_function(&mut ctx, &func);
        assert_eq!(ctx.error_count, 1);
    }

    #[test]
    fn unreachable_block_warns_but_does_not_error() {
        let mut entry = BasicBlock::new("entry");
        entry.push(Instruction::new(Opcode::Ret, 1, 1));
        let mut dead = BasicBlock::new("dead");
        dead.push(Instruction::new(Opcode::Ret, 2, 1));
        let func = func_with(vec![entry, dead]);
        let mut sink = CollectingSink::new();
        let mut ctx = VerifyCtx::new("main.alir", &mut sink);
        check_function(&mut ctx, &func);
        assert_eq!(ctx.error_count, 0);
        assert!(sink.diagnostics.iter().any(|d| d.message.contains("unreachable")));
    }
}
