//! Object construction lowering: `new ClassName(args)` and the bare
//! `ClassName(args)` call-site rewrite both lower to the same
//! five-instruction sequence.

use alir_ir::{AstId, DiagnosticSink, Instruction, Opcode, Type, Value};

use crate::ctx::IrGenCtx;
use crate::expr::gen_expr;
use crate::mangle;

/// `sizeof` → `alloc_heap` → `bitcast` → `call ClassName(%obj, args...)` →
/// result is `%obj`.
pub fn gen_construct<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    class_name: &str,
    args: &[AstId],
    line: u32,
    col: u32,
) -> Value {
    let class_ty = Type::class(class_name);
    let size = ctx.fresh_temp(Type::long());
    ctx.emit(
        Instruction::new(Opcode::Sizeof, line, col)
            .with_dest(size.clone())
            .with_operand(Value::TypeRef { class_name: class_name.to_string() }),
    );

    let raw = ctx.fresh_temp(Type::void().pointer_to());
    ctx.emit(Instruction::new(Opcode::AllocHeap, line, col).with_dest(raw.clone()).with_operand(size));

    let obj = ctx.fresh_temp(class_ty.pointer_to());
    ctx.emit(Instruction::new(Opcode::Bitcast, line, col).with_dest(obj.clone()).with_operand(raw));

    let ctor_name = mangle::mangle_method(class_name, class_name);
    let mut call_args = vec![obj.clone()];
    call_args.extend(args.iter().map(|&a| gen_expr(ctx, a)));
    ctx.emit(
        Instruction::new(Opcode::Call, line, col)
            .with_operand(Value::Label { name: ctor_name })
            .with_args(call_args),
    );
    obj
}

#[cfg(test)]
mod tests {
    use super::*;
    use alir_ir::ast::Ast;
    use alir_ir::{CollectingSink, NodeTypeTable};

    #[test]
    fn construction_emits_sizeof_then_alloc_heap_then_bitcast() {
        let ast = Ast::new();
        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
        ctx.new_block("entry");
        let result = gen_construct(&mut ctx, "Animal", &[], 1, 1);

        let blocks = ctx.take_blocks();
        let ops: Vec<Opcode> = blocks[0].instructions.iter().map(|i| i.opcode).collect();
        assert_eq!(ops, vec![Opcode::Sizeof, Opcode::AllocHeap, Opcode::Bitcast, Opcode::Call]);
        assert!(matches!(result, Value::Temp { .. }));
        assert_eq!(result.ty(), Some(&Type::class("Animal").pointer_to()));
    }
}
