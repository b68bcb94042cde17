//! L-value address computation: `gen_addr`. Every caller that needs to read or write
//! through an assignable expression starts here rather than re-deriving the
//! address logic inline.

use alir_ir::ast::AstKind;
use alir_ir::{AstId, DiagnosticSink, Type, Value};

use crate::ctx::IrGenCtx;
use crate::expr::{gen_expr, get_ptr};
use crate::layout;

/// Computes the address an assignable expression refers to. The returned
/// `Value` is always pointer-typed: a resolved local/parameter slot, or a
/// `get_ptr` result for a field or array element.
pub fn gen_addr<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, id: AstId) -> Value {
    let node = ctx.ast.get(id).clone();
    match node.kind {
        AstKind::VarRef { name, is_class_member } => {
            if let Some(addr) = ctx.resolve_addr(&name) {
                return addr;
            }
            if is_class_member {
                return class_member_addr(ctx, &name, id, node.line, node.col);
            }
            ctx.error(node.line, node.col, format!("reference to unbound name `{name}` during lowering"));
            Value::Local { name, ty: Type::unknown() }
        }
        AstKind::MemberAccess { object, member_name } => {
            let base = gen_expr(ctx, object);
            let class_name = base.ty().and_then(|t| t.class_name.clone()).unwrap_or_default();
            let idx = layout::field_index(ctx, &class_name, &member_name, node.line, node.col);
            let field_ty = ctx.node_type(id);
            get_ptr(ctx, base, Value::ConstInt { value: idx as i64, ty: Type::int() }, field_ty.pointer_to(), node.line, node.col)
        }
        AstKind::ArrayAccess { target, index } => {
            let base = gen_addr(ctx, target);
            let idx_val = gen_expr(ctx, index);
            let elem_ty = ctx.node_type(id);
            get_ptr(ctx, base, idx_val, elem_ty.pointer_to(), node.line, node.col)
        }
        other => {
            ctx.error(node.line, node.col, format!("node {other:?} is not an assignable expression"));
            Value::Local { name: "<invalid>".into(), ty: Type::unknown() }
        }
    }
}

/// An unqualified name inside a method body that resolves to a field on the
/// implicit `this`: load `this`, then `get_ptr this, idx`.
fn class_member_addr<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, field_name: &str, id: AstId, line: u32, col: u32) -> Value {
    let Some(this_addr) = ctx.resolve_addr("this") else {
        ctx.error(line, col, format!("implicit member `{field_name}` referenced outside a method body"));
        return Value::Local { name: field_name.into(), ty: Type::unknown() };
    };
    let this_val = crate::expr::load_value(ctx, this_addr, line, col);
    let class_name = this_val.ty().and_then(|t| t.class_name.clone()).unwrap_or_default();
    let idx = layout::field_index(ctx, &class_name, field_name, line, col);
    let field_ty = ctx.node_type(id);
    get_ptr(ctx, this_val, Value::ConstInt { value: idx as i64, ty: Type::int() }, field_ty.pointer_to(), line, col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alir_ir::ast::Ast;
    use alir_ir::{ClassLayout, CollectingSink, Field, NodeTypeTable};

    #[test]
    fn var_ref_address_resolves_through_bound_env() {
        let mut ast = Ast::new();
        let id = ast.push(1, 1, AstKind::VarRef { name: "x".into(), is_class_member: false });
        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
        ctx.bind("x", Value::Local { name: "x_slot".into(), ty: Type::int().pointer_to() });
        match gen_addr(&mut ctx, id) {
            Value::Local { name, .. } => assert_eq!(name, "x_slot"),
            other => panic!("expected local address, got {other:?}"),
        }
    }

    #[test]
    fn unbound_var_ref_reports_error_instead_of_panicking() {
        let mut ast = Ast::new();
        let id = ast.push(1, 1, AstKind::VarRef { name: "ghost".into(), is_class_member: false });
        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
        gen_addr(&mut ctx, id);
        assert_eq!(ctx.error_count, 1);
    }

    #[test]
    fn implicit_member_reference_loads_this_and_indexes_field() {
        let mut ast = Ast::new();
        let member = ast.push(1, 1, AstKind::VarRef { name: "hp".into(), is_class_member: true });
        let mut types = NodeTypeTable::new();
        types.record(member, Type::int());
        let mut sink = CollectingSink::new();
        let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
        ctx.module.structs.insert(
            "Animal".into(),
            ClassLayout { fields: vec![Field { name: "hp".into(), ty: Type::int(), index: 0 }] },
        );
        ctx.new_block("entry");
        ctx.bind("this", Value::Local { name: "this_slot".into(), ty: Type::class("Animal").pointer_to() });
        let addr = gen_addr(&mut ctx, member);
        assert!(addr.ty().unwrap().is_pointer());
        assert_eq!(ctx.error_count, 0);
    }
}
