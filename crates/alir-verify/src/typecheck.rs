//! Operand type checks: floating/integer opcode
//! families reject each other's operands, and `store`/`load` agree on
//! pointer depth.

use alir_ir::{DiagnosticSink, Function, Instruction, Opcode, Type, Value};

use crate::ctx::VerifyCtx;

pub fn check_function<S: DiagnosticSink>(ctx: &mut VerifyCtx<S>, func: &Function) {
    for block in &func.blocks {
        for instr in &block.instructions {
            check_instruction(ctx, func, instr);
        }
    }
}

fn check_instruction<S: DiagnosticSink>(ctx: &mut VerifyCtx<S>, func: &Function, instr: &Instruction) {
    if instr.opcode.is_floating_arith() {
        check_operand_kinds(ctx, func, instr, |t| t.is_float(), "floating");
    } else if instr.opcode.is_integer_arith() {
        check_operand_kinds(ctx, func, instr, |t| t.is_integer(), "integer");
    }

    match instr.opcode {
        Opcode::Store => check_store(ctx, func, instr),
        Opcode::Load => check_load(ctx, func, instr),
        _ => {}
    }
}

fn check_operand_kinds<S: DiagnosticSink>(
    ctx: &mut VerifyCtx<S>,
    func: &Function,
    instr: &Instruction,
    accepts: impl Fn(&Type) -> bool,
    family: &str,
) {
    for operand in &instr.operands {
        if let Some(ty) = operand.ty() {
            if !accepts(ty) {
                ctx.error(
                    instr.line,
                    instr.col,
                    format!(
                        "`{}` in `{}` is a {family} opcode but received operand of type `{}`",
                        instr.opcode.mnemonic(),
                        func.mangled_name,
                        ty.render(),
                    ),
                );
            }
        }
    }
}

/// `store val, ptr` (operands[0] = val, operands[1] = ptr): `ptr`'s pointer
/// depth must be one more than `val`'s, with matching base kind — unless
/// `val` is a constant, which only needs a compatible base kind.
fn check_store<S: DiagnosticSink>(ctx: &mut VerifyCtx<S>, func: &Function, instr: &Instruction) {
    let (Some(val), Some(ptr)) = (instr.operands.first(), instr.operands.get(1)) else {
        ctx.error(instr.line, instr.col, format!("`store` in `{}` is missing its value or pointer operand", func.mangled_name));
        return;
    };
    let Some(ptr_ty) = ptr.ty() else {
        ctx.error(instr.line, instr.col, format!("`store` in `{}` target has no type", func.mangled_name));
        return;
    };
    if !ptr_ty.is_pointer() {
        ctx.error(instr.line, instr.col, format!("`store` in `{}` target is not a pointer", func.mangled_name));
        return;
    }
    let Some(val_ty) = val.ty() else { return };
    if val.is_constant() {
        if base_kind_compatible(val_ty, &ptr_ty.dereferenced()) {
            return;
        }
        ctx.error(instr.line, instr.col, format!("`store` in `{}` stores a constant of an incompatible base type", func.mangled_name));
        return;
    }
    if val_ty.pointer_depth + 1 != ptr_ty.pointer_depth || !base_kind_compatible(val_ty, ptr_ty) {
        ctx.error(instr.line, instr.col, format!("`store` in `{}` value/pointer depth mismatch", func.mangled_name));
    }
}

/// `load dst, ptr`: `dst`'s pointer depth is exactly `ptr`'s minus one.
fn check_load<S: DiagnosticSink>(ctx: &mut VerifyCtx<S>, func: &Function, instr: &Instruction) {
    let (Some(dest), Some(ptr)) = (&instr.dest, instr.operands.first()) else {
        ctx.error(instr.line, instr.col, format!("`load` in `{}` is missing its destination or pointer operand", func.mangled_name));
        return;
    };
    let (Some(dest_ty), Some(ptr_ty)) = (dest.ty(), ptr.ty()) else { return };
    if !ptr_ty.is_pointer() {
        ctx.error(instr.line, instr.col, format!("`load` in `{}` source is not a pointer", func.mangled_name));
        return;
    }
    if dest_ty.pointer_depth + 1 != ptr_ty.pointer_depth {
        ctx.error(instr.line, instr.col, format!("`load` in `{}` destination depth does not match pointer depth - 1", func.mangled_name));
    }
}

fn base_kind_compatible(a: &Type, b: &Type) -> bool {
    a.kind == b.kind || (a.is_numeric() && b.is_numeric())
}
