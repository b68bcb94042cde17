//! Memory-discipline checks: `free`/`alloc_heap`
//! pairing, `get_ptr` targets, and constant-address dereferences.
//!
//! Class instances are always heap handles in this IR (manufactured by
//! `alloc_heap` + `bitcast` at construction) rather than carrying an
//! explicit pointer depth, so `get_ptr`/`load` accept a class
//! type as well as a true pointer when checking "target must be a pointer".

use std::collections::HashSet;

use alir_ir::{DiagnosticSink, Function, Instruction, Opcode, Type, Value};

use crate::ctx::VerifyCtx;

pub fn check_function<S: DiagnosticSink>(ctx: &mut VerifyCtx<S>, func: &Function) {
    let mut heap_origin: HashSet<String> = HashSet::new();

    for block in &func.blocks {
        for instr in &block.instructions {
            match instr.opcode {
                Opcode::AllocHeap => {
                    if let Some(dest) = value_key(instr.dest.as_ref()) {
                        heap_origin.insert(dest);
                    }
                }
                Opcode::Bitcast => {
                    let from_heap = instr.operands.first().and_then(value_key).map(|k| heap_origin.contains(&k)).unwrap_or(false);
                    if from_heap {
                        if let Some(dest) = value_key(instr.dest.as_ref()) {
                            heap_origin.insert(dest);
                        }
                    }
                }
                Opcode::Free => check_free(ctx, func, instr, &heap_origin),
                Opcode::GetPtr => check_get_ptr(ctx, func, instr),
                Opcode::Load => check_constant_dereference(ctx, func, instr),
                _ => {}
            }
        }
    }
}

fn value_key(v: Option<&Value>) -> Option<String> {
    match v {
        Some(Value::Temp { id, .. }) => Some(format!("t{id}")),
        Some(Value::Local { name, .. }) => Some(format!("l{name}")),
        _ => None,
    }
}

fn check_free<S: DiagnosticSink>(ctx: &mut VerifyCtx<S>, func: &Function, instr: &Instruction, heap_origin: &HashSet<String>) {
    let tracked = instr.operands.first().and_then(value_key).map(|k| heap_origin.contains(&k)).unwrap_or(false);
    if !tracked {
        ctx.warning(
            instr.line,
            instr.col,
            format!("`free` in `{}` has no traceable prior `alloc_heap`/`bitcast` in this function", func.mangled_name),
        );
    }
}

fn target_is_pointerish(ty: &Type) -> bool {
    ty.is_pointer() || ty.is_class()
}

fn check_get_ptr<S: DiagnosticSink>(ctx: &mut VerifyCtx<S>, func: &Function, instr: &Instruction) {
    let Some(base) = instr.operands.first() else {
        ctx.error(instr.line, instr.col, format!("`get_ptr` in `{}` is missing its base operand", func.mangled_name));
        return;
    };
    if matches!(base, Value::ConstInt { .. }) {
        ctx.error(instr.line, instr.col, format!("`get_ptr` in `{}` dereferences a constant-integer address", func.mangled_name));
        return;
    }
    if let Some(ty) = base.ty() {
        if !target_is_pointerish(ty) {
            ctx.error(instr.line, instr.col, format!("`get_ptr` in `{}` target `{}` is not a pointer or class handle", func.mangled_name, ty.render()));
        }
    }
}

fn check_constant_dereference<S: DiagnosticSink>(ctx: &mut VerifyCtx<S>, func: &Function, instr: &Instruction) {
    if let Some(Value::ConstInt { .. }) = instr.operands.first() {
        ctx.error(instr.line, instr.col, format!("`load` in `{}` dereferences a constant-integer address", func.mangled_name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alir_ir::{BasicBlock, CollectingSink, TempId};

    fn func_with(instrs: Vec<Instruction>) -> Function {
        let mut f = Function::new("f", Type::void(), vec![]);
        let mut b = BasicBlock::new("entry");
        for i in instrs {
            b.push(i);
        }
        b.push(Instruction::new(Opcode::Ret, 99, 1));
        f.push_block(b);
        f
    }

    #[test]
    fn free_after_alloc_heap_is_not_flagged() {
        let raw = Value::Temp { id: TempId(0), ty: Type::void().pointer_to() };
        let instrs = vec![
            Instruction::new(Opcode::AllocHeap, 1, 1).with_dest(raw.clone()).with_operand(Value::ConstInt { value: 8, ty: Type::long() }),
            Instruction::new(Opcode::Free, 2, 1).with_operand(raw),
        ];
        let func = func_with(instrs);
        let mut sink = CollectingSink::new();
        let mut ctx = VerifyCtx::new("main.alir", &mut sink);
        check_function(&mut ctx, &func);
        assert_eq!(ctx.error_count, 0);
        assert!(sink.diagnostics.is_empty());
    }

    #[test]
    fn free_with_no_traceable_origin_warns() {
        let stray = Value::Temp { id: TempId(5), ty: Type::void().pointer_to() };
        let func = func_with(vec![Instruction::new(Opcode::Free, 1, 1).with_operand(stray)]);
        let mut sink = CollectingSink::new();
        let mut ctx = VerifyCtx::new("main.alir", &mut sink);
        check_function(&mut ctx, &func);
        assert_eq!(ctx.error_count, 0);
        assert!(sink.diagnostics.iter().any(|d| d.message.contains("free")));
    }

    #[test]
    fn get_ptr_on_a_class_handle_passes() {
        let obj = Value::Temp { id: TempId(0), ty: Type::class("Animal") };
        let func = func_with(vec![
            Instruction::new(Opcode::GetPtr, 1, 1)
                .with_dest(Value::Temp { id: TempId(1), ty: Type::int().pointer_to() })
                .with_operand(obj)
                .with_operand(Value::ConstInt { value: 0, ty: Type::int() }),
        ]);
        let mut sink = CollectingSink::new();
        let mut ctx = VerifyCtx::new("main.alir", &mut sink);
        check_function(&mut ctx, &func);
        assert_eq!(ctx.error_count, 0);
    }

    #[test]
    fn get_ptr_on_a_constant_integer_is_an_error() {
        let func = func_with(vec![Instruction::new(Opcode::GetPtr, 1, 1)
            .with_dest(Value::Temp { id: TempId(1), ty: Type::int().pointer_to() })
            .with_operand(Value::ConstInt { value: 0x1000, ty: Type::int() })
            .with_operand(Value::ConstInt { value: 0, ty: Type::int() })]);
        let mut sink = CollectingSink::new();
        let mut ctx = VerifyCtx::new("main.alir", &mut sink);
        check_function(&mut ctx, &func);
        assert_eq!(ctx.error_count, 1);
    }
}
