//! R-value lowering: `gen_expr`.

use alir_ir::ast::{AssignOp, AstKind, BinOp, LiteralValue, UnOp};
use alir_ir::{AstId, DiagnosticSink, Instruction, Opcode, Type, Value};

use crate::construct;
use crate::ctx::IrGenCtx;
use crate::lvalue;
use crate::mangle;

/// Loads the value stored at `addr`, whose type must be a pointer (an
/// `alloca` register or a prior `get_ptr` result).
pub(crate) fn load_value<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, addr: Value, line: u32, col: u32) -> Value {
    let pointee = addr.ty().map(|t| t.dereferenced()).unwrap_or_else(Type::unknown);
    let dest = ctx.fresh_temp(pointee);
    ctx.emit(Instruction::new(Opcode::Load, line, col).with_dest(dest.clone()).with_operand(addr));
    dest
}

/// `store val, ptr` — operand order matches the IR Verifier's type-check
/// contract.
pub(crate) fn store_value<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, addr: Value, value: Value, line: u32, col: u32) {
    ctx.emit(Instruction::new(Opcode::Store, line, col).with_operand(value).with_operand(addr));
}

pub(crate) fn get_ptr<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    base: Value,
    index: Value,
    result_ty: Type,
    line: u32,
    col: u32,
) -> Value {
    let dest = ctx.fresh_temp(result_ty);
    ctx.emit(Instruction::new(Opcode::GetPtr, line, col).with_dest(dest.clone()).with_operand(base).with_operand(index));
    dest
}

pub fn gen_expr<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, id: AstId) -> Value {
    let node = ctx.ast.get(id).clone();
    match node.kind {
        AstKind::Literal { var_type, value } => gen_literal(ctx, var_type, value),
        AstKind::VarRef { .. } => {
            let addr = lvalue::gen_addr(ctx, id);
            load_value(ctx, addr, node.line, node.col)
        }
        AstKind::BinaryOp { op, left, right } => gen_binary(ctx, id, op, left, right, node.line, node.col),
        AstKind::UnaryOp { op, operand } => gen_unary(ctx, id, op, operand, node.line, node.col),
        AstKind::Call { name, args } => gen_call(ctx, id, &name, &args, node.line, node.col),
        AstKind::MethodCall { object, method_name, args } => {
            gen_method_call(ctx, id, object, &method_name, &args, node.line, node.col)
        }
        AstKind::MemberAccess { object, member_name } => {
            gen_member_access(ctx, id, object, &member_name, node.line, node.col)
        }
        AstKind::ArrayAccess { .. } => {
            let addr = lvalue::gen_addr(ctx, id);
            load_value(ctx, addr, node.line, node.col)
        }
        AstKind::Cast { var_type, operand } => gen_cast(ctx, var_type, operand, node.line, node.col),
        AstKind::ArrayLit { elements } => gen_array_lit(ctx, id, &elements, node.line, node.col),
        AstKind::TraitAccess { object, .. } => gen_expr(ctx, object),
        other => {
            ctx.error(node.line, node.col, format!("node {other:?} is not an expression"));
            Value::ConstInt { value: 0, ty: Type::unknown() }
        }
    }
}

fn gen_literal<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, ty: Type, value: LiteralValue) -> Value {
    match value {
        LiteralValue::Int(v) => Value::ConstInt { value: v, ty },
        LiteralValue::Bool(b) => Value::ConstInt { value: b as i64, ty },
        LiteralValue::Char(c) => Value::ConstInt { value: c as i64, ty },
        LiteralValue::Float(v) => Value::ConstFloat { value: v, ty },
        LiteralValue::Str(s) => {
            let label = ctx.module.intern_string(&s, "str");
            Value::Global { name: label, ty: Type::char().pointer_to() }
        }
    }
}

fn gen_binary<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    id: AstId,
    op: BinOp,
    left: AstId,
    right: AstId,
    line: u32,
    col: u32,
) -> Value {
    let mut lval = gen_expr(ctx, left);
    let mut rval = gen_expr(ctx, right);
    let result_ty = ctx.node_type(id);

    let lty = lval.ty().cloned().unwrap_or_else(Type::unknown);
    let rty = rval.ty().cloned().unwrap_or_else(Type::unknown);
    if lty.is_numeric() && rty.is_numeric() && lty != rty {
        if lty.numeric_rank() < rty.numeric_rank() {
            lval = promote(ctx, lval, rty.clone(), line, col);
        } else if rty.numeric_rank() < lty.numeric_rank() {
            rval = promote(ctx, rval, lty.clone(), line, col);
        }
    }

    let opcode = binary_opcode(op, &result_ty);
    let dest = ctx.fresh_temp(result_ty);
    ctx.emit(Instruction::new(opcode, line, col).with_dest(dest.clone()).with_operand(lval).with_operand(rval));
    dest
}

/// Mixed integer/floating operands auto-promote via a `cast` temporary
/// before the arithmetic opcode runs.
fn promote<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, value: Value, target: Type, line: u32, col: u32) -> Value {
    let dest = ctx.fresh_temp(target);
    ctx.emit(Instruction::new(Opcode::Cast, line, col).with_dest(dest.clone()).with_operand(value));
    dest
}

fn binary_opcode(op: BinOp, result_ty: &Type) -> Opcode {
    let floating = result_ty.is_float();
    match op {
        BinOp::Add if floating => Opcode::FAdd,
        BinOp::Add => Opcode::Add,
        BinOp::Sub if floating => Opcode::FSub,
        BinOp::Sub => Opcode::Sub,
        BinOp::Mul if floating => Opcode::FMul,
        BinOp::Mul => Opcode::Mul,
        BinOp::Div if floating => Opcode::FDiv,
        BinOp::Div => Opcode::Div,
        BinOp::Mod => Opcode::Mod,
        BinOp::Lt => Opcode::Lt,
        BinOp::Gt => Opcode::Gt,
        BinOp::Lte => Opcode::Lte,
        BinOp::Gte => Opcode::Gte,
        BinOp::Eq => Opcode::Eq,
        BinOp::Neq => Opcode::Neq,
        BinOp::And => Opcode::And,
        BinOp::Or => Opcode::Or,
        BinOp::BitAnd => Opcode::And,
        BinOp::BitOr => Opcode::Or,
        BinOp::BitXor => Opcode::Xor,
        BinOp::Shl => Opcode::Shl,
        BinOp::Shr => Opcode::Shr,
    }
}

pub(crate) fn compound_opcode(op: AssignOp, is_float: bool) -> Opcode {
    match (op, is_float) {
        (AssignOp::AddSet, true) => Opcode::FAdd,
        (AssignOp::AddSet, false) => Opcode::Add,
        (AssignOp::SubSet, true) => Opcode::FSub,
        (AssignOp::SubSet, false) => Opcode::Sub,
        (AssignOp::MulSet, true) => Opcode::FMul,
        (AssignOp::MulSet, false) => Opcode::Mul,
        (AssignOp::DivSet, true) => Opcode::FDiv,
        (AssignOp::DivSet, false) => Opcode::Div,
        (AssignOp::Set, _) => unreachable!("AssignOp::Set has no compound opcode"),
    }
}

fn gen_unary<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, id: AstId, op: UnOp, operand: AstId, line: u32, col: u32) -> Value {
    let val = gen_expr(ctx, operand);
    let result_ty = ctx.node_type(id);
    let opcode = match op {
        UnOp::Neg if result_ty.is_float() => Opcode::FSub,
        UnOp::Neg => Opcode::Sub,
        UnOp::Not => Opcode::Not,
        UnOp::BitNot => Opcode::Not,
    };
    let dest = ctx.fresh_temp(result_ty.clone());
    match op {
        UnOp::Neg => {
            let zero = if result_ty.is_float() {
                Value::ConstFloat { value: 0.0, ty: result_ty }
            } else {
                Value::ConstInt { value: 0, ty: result_ty }
            };
            ctx.emit(Instruction::new(opcode, line, col).with_dest(dest.clone()).with_operand(zero).with_operand(val));
        }
        UnOp::Not | UnOp::BitNot => {
            ctx.emit(Instruction::new(opcode, line, col).with_dest(dest.clone()).with_operand(val));
        }
    }
    dest
}

fn gen_call<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, id: AstId, name: &str, args: &[AstId], line: u32, col: u32) -> Value {
    if ctx.module.structs.contains_key(name) {
        return construct::gen_construct(ctx, name, args, line, col);
    }
    let mangled = ctx
        .function_mangled_name(name)
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            ctx.warning(line, col, format!("call to unresolved function `{name}` during lowering"));
            name.to_string()
        });
    let arg_vals: Vec<Value> = args.iter().map(|&a| gen_expr(ctx, a)).collect();
    emit_call(ctx, mangled, arg_vals, ctx.node_type(id), line, col)
}

fn gen_method_call<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    id: AstId,
    object: AstId,
    method_name: &str,
    args: &[AstId],
    line: u32,
    col: u32,
) -> Value {
    let obj_val = gen_expr(ctx, object);
    let class_name = obj_val.ty().and_then(|t| t.class_name.clone()).unwrap_or_default();
    let mangled = mangle::mangle_method(&class_name, method_name);
    let mut arg_vals = vec![obj_val];
    arg_vals.extend(args.iter().map(|&a| gen_expr(ctx, a)));
    emit_call(ctx, mangled, arg_vals, ctx.node_type(id), line, col)
}

fn emit_call<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, mangled: String, args: Vec<Value>, ret_ty: Type, line: u32, col: u32) -> Value {
    if ret_ty.is_void() {
        ctx.emit(Instruction::new(Opcode::Call, line, col).with_operand(Value::Label { name: mangled }).with_args(args));
        Value::ConstInt { value: 0, ty: Type::void() }
    } else {
        let dest = ctx.fresh_temp(ret_ty);
        ctx.emit(
            Instruction::new(Opcode::Call, line, col)
                .with_dest(dest.clone())
                .with_operand(Value::Label { name: mangled })
                .with_args(args),
        );
        dest
    }
}

fn gen_member_access<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    id: AstId,
    object: AstId,
    member_name: &str,
    line: u32,
    col: u32,
) -> Value {
    let obj_val = gen_expr(ctx, object);
    if member_name == "length" && obj_val.ty().map(|t| t.is_string()).unwrap_or(false) {
        let dest = ctx.fresh_temp(Type::int());
        ctx.emit(
            Instruction::new(Opcode::Call, line, col)
                .with_dest(dest.clone())
                .with_operand(Value::Label { name: "string_length".into() })
                .with_args(vec![obj_val]),
        );
        return dest;
    }
    let class_name = obj_val.ty().and_then(|t| t.class_name.clone()).unwrap_or_default();
    let idx = crate::layout::field_index(ctx, &class_name, member_name, line, col);
    let field_ty = ctx.node_type(id);
    let addr = get_ptr(ctx, obj_val, Value::ConstInt { value: idx as i64, ty: Type::int() }, field_ty.pointer_to(), line, col);
    load_value(ctx, addr, line, col)
}

fn gen_cast<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, var_type: Type, operand: AstId, line: u32, col: u32) -> Value {
    let val = gen_expr(ctx, operand);
    let dest = ctx.fresh_temp(var_type);
    ctx.emit(Instruction::new(Opcode::Cast, line, col).with_dest(dest.clone()).with_operand(val));
    dest
}

/// Materializes an array literal into fresh stack storage and returns its
/// address (arrays decay to their base address at expression sites, the
/// usual array-to-pointer rule).
fn gen_array_lit<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, id: AstId, elements: &[AstId], line: u32, col: u32) -> Value {
    let arr_ty = ctx.node_type(id);
    let mut elem_ty = arr_ty.clone();
    elem_ty.array_size = 0;
    let label = ctx.fresh_label("arraylit");
    let addr = Value::Local { name: label, ty: arr_ty.pointer_to() };
    ctx.emit(Instruction::new(Opcode::Alloca, line, col).with_dest(addr.clone()));
    for (i, &el) in elements.iter().enumerate() {
        let val = gen_expr(ctx, el);
        let elem_addr = get_ptr(
            ctx,
            addr.clone(),
            Value::ConstInt { value: i as i64, ty: Type::int() },
            elem_ty.clone().pointer_to(),
            line,
            col,
        );
        store_value(ctx, elem_addr, val, line, col);
    }
    addr
}

#[cfg(test)]
mod tests {
    use super::*;
    use alir_ir::{Ast, CollectingSink, NodeTypeTable};

    fn ast_with(node: impl FnOnce(&mut Ast) -> AstId) -> (Ast, AstId) {
        let mut ast = Ast::new();
        let id = node(&mut ast);
        (ast, id)
    }

    #[test]
    fn integer_literal_lowers_to_a_const_int_value() {
        let (ast, id) = ast_with(|a| a.push(1, 1, AstKind::Literal { var_type: Type::int(), value: LiteralValue::Int(7) }));
        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
        assert_eq!(gen_expr(&mut ctx, id), Value::ConstInt { value: 7, ty: Type::int() });
    }

    #[test]
    fn string_literal_interns_into_module_globals() {
        let (ast, id) =
            ast_with(|a| a.push(1, 1, AstKind::Literal { var_type: Type::string(), value: LiteralValue::Str("hi".into()) }));
        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
        let v = gen_expr(&mut ctx, id);
        assert!(matches!(v, Value::Global { .. }));
        assert_eq!(ctx.module.globals.len(), 1);
    }

    #[test]
    fn binary_opcode_picks_floating_variant_for_double_result() {
        assert_eq!(binary_opcode(BinOp::Add, &Type::double()), Opcode::FAdd);
        assert_eq!(binary_opcode(BinOp::Add, &Type::int()), Opcode::Add);
        assert_eq!(binary_opcode(BinOp::Lt, &Type::int()), Opcode::Lt);
    }

    #[test]
    fn compound_opcode_matches_assign_op_and_floatness() {
        assert_eq!(compound_opcode(AssignOp::AddSet, false), Opcode::Add);
        assert_eq!(compound_opcode(AssignOp::MulSet, true), Opcode::FMul);
    }
}
