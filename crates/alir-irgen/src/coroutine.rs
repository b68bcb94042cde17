//! `flux` lowering: a `flux` function
//! compiles to a pair of ordinary functions — a factory that heap-allocates
//! a context struct, and a `_Resume` function that dispatches on the
//! context's `state` field and runs until the next `emit` or the body's
//! natural end.

use alir_ir::ast::AstKind;
use alir_ir::{Ast, AstId, CaseEntry, ClassLayout, DiagnosticSink, Field, Function, Instruction, Opcode, Type, Value};

use crate::ctx::IrGenCtx;
use crate::expr::{gen_expr, get_ptr, load_value, store_value};
use crate::mangle;
use crate::stmt;

/// Walks a `flux` body collecting every local it declares (including loop
/// variables), since each one must survive in the context struct across a
/// suspend point rather than live in a stack alloca.
fn collect_locals(ast: &Ast, body: &[AstId]) -> Vec<(String, Type)> {
    let mut out = Vec::new();
    walk(ast, body, &mut out);
    out
}

fn walk(ast: &Ast, ids: &[AstId], out: &mut Vec<(String, Type)>) {
    for &id in ids {
        match &ast.get(id).kind {
            AstKind::VarDecl { name, var_type, is_array, array_size, .. } => {
                let ty = if *is_array { Type::array_of(var_type.clone(), array_size.unwrap_or(0)) } else { var_type.clone() };
                out.push((name.clone(), ty));
            }
            AstKind::If { then_body, else_body, .. } => {
                walk(ast, then_body, out);
                if let Some(e) = else_body {
                    walk(ast, e, out);
                }
            }
            AstKind::While { body, .. } | AstKind::Loop { body, .. } => walk(ast, body, out),
            AstKind::ForIn { var_name, iter_type, body, .. } => {
                out.push((var_name.clone(), iter_type.clone()));
                walk(ast, body, out);
            }
            AstKind::Switch { cases, default_case, .. } => {
                for &c in cases {
                    if let AstKind::Case { body, .. } = &ast.get(c).kind {
                        walk(ast, body, out);
                    }
                }
                if let Some(d) = default_case {
                    walk(ast, d, out);
                }
            }
            _ => {}
        }
    }
}

fn field_addr<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, base: Value, layout: &ClassLayout, field: &str, line: u32, col: u32) -> Value {
    let f = layout.field(field).expect("flux context field always present by construction");
    let ty = f.ty.clone();
    let idx = f.index;
    get_ptr(ctx, base, Value::ConstInt { value: idx as i64, ty: Type::int() }, ty.pointer_to(), line, col)
}

fn store_field<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, base: Value, layout: &ClassLayout, field: &str, value: Value, line: u32, col: u32) {
    let addr = field_addr(ctx, base, layout, field, line, col);
    store_value(ctx, addr, value, line, col);
}

/// `emit <value>`: stash the value, advance the state, suspend
/// by returning, then open the block the dispatch `switch` resumes into.
pub(crate) fn gen_emit<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, value: AstId, line: u32, col: u32) {
    let val = gen_expr(ctx, value);
    let Some(result_addr) = ctx.resolve_addr("__flux_result") else {
        ctx.error(line, col, "emit used outside a flux function body during lowering");
        return;
    };
    store_value(ctx, result_addr, val, line, col);

    let state_id = ctx.fresh_flux_state();
    let state_addr = ctx.resolve_addr("__flux_state").expect("flux state slot bound alongside result");
    store_value(ctx, state_addr, Value::ConstInt { value: state_id, ty: Type::int() }, line, col);
    ctx.emit(Instruction::new(Opcode::Ret, line, col));

    let resume_label = ctx.fresh_label("resume_after_emit");
    let idx = ctx.new_block(resume_label.clone());
    ctx.set_current(idx);
    ctx.record_resume_point(state_id, resume_label);
}

/// Lowers one `flux` declaration into its factory and `_Resume` functions.
pub fn lower_flux_function<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    name: &str,
    mangled_name: &str,
    class_name: Option<&str>,
    params: &[(String, Type)],
    ret_type: Type,
    body: &[AstId],
    line: u32,
    col: u32,
) -> (Function, Function) {
    let struct_name = mangle::flux_struct_name(name);
    let locals = collect_locals(ctx.ast, body);

    let mut fields = Vec::new();
    fields.push(Field { name: "state".into(), ty: Type::int(), index: fields.len() as u32 });
    fields.push(Field { name: "finished".into(), ty: Type::bool_(), index: fields.len() as u32 });
    fields.push(Field { name: "result".into(), ty: ret_type.clone(), index: fields.len() as u32 });
    if let Some(cn) = class_name {
        fields.push(Field { name: "this".into(), ty: Type::class(cn), index: fields.len() as u32 });
    }
    for (pname, pty) in params {
        fields.push(Field { name: pname.clone(), ty: pty.clone(), index: fields.len() as u32 });
    }
    for (lname, lty) in &locals {
        fields.push(Field { name: lname.clone(), ty: lty.clone(), index: fields.len() as u32 });
    }
    let layout = ClassLayout { fields };
    ctx.module.structs.insert(struct_name.clone(), layout.clone());
    let ctx_ty = Type::class(struct_name.clone());

    let factory = lower_factory(ctx, mangled_name, class_name, params, &layout, ctx_ty.clone(), line, col);
    let resume = lower_resume(ctx, name, class_name, params, &locals, &layout, ctx_ty, body, line, col);
    (factory, resume)
}

fn lower_factory<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    mangled_name: &str,
    class_name: Option<&str>,
    params: &[(String, Type)],
    layout: &ClassLayout,
    ctx_ty: Type,
    line: u32,
    col: u32,
) -> Function {
    ctx.start_function();
    ctx.new_block("entry");

    let struct_name = ctx_ty.class_name.clone().unwrap_or_default();
    let size = ctx.fresh_temp(Type::long());
    ctx.emit(
        Instruction::new(Opcode::Sizeof, line, col)
            .with_dest(size.clone())
            .with_operand(Value::TypeRef { class_name: struct_name }),
    );
    let raw = ctx.fresh_temp(Type::void().pointer_to());
    ctx.emit(Instruction::new(Opcode::AllocHeap, line, col).with_dest(raw.clone()).with_operand(size));
    let handle = ctx.fresh_temp(ctx_ty.clone());
    ctx.emit(Instruction::new(Opcode::Bitcast, line, col).with_dest(handle.clone()).with_operand(raw.clone()));

    store_field(ctx, handle.clone(), layout, "state", Value::ConstInt { value: 0, ty: Type::int() }, line, col);
    store_field(ctx, handle.clone(), layout, "finished", Value::ConstInt { value: 0, ty: Type::bool_() }, line, col);
    if let Some(cn) = class_name {
        let this_val = Value::Local { name: "this".into(), ty: Type::class(cn) };
        store_field(ctx, handle.clone(), layout, "this", this_val, line, col);
    }
    for (pname, pty) in params {
        let incoming = Value::Local { name: pname.clone(), ty: pty.clone() };
        store_field(ctx, handle.clone(), layout, pname, incoming, line, col);
    }
    ctx.emit(Instruction::new(Opcode::Ret, line, col).with_operand(raw));

    let mut factory_params = Vec::new();
    if let Some(cn) = class_name {
        factory_params.push(Type::class(cn));
    }
    factory_params.extend(params.iter().map(|(_, t)| t.clone()));

    let mut factory = Function::new(mangled_name, Type::void().pointer_to(), factory_params);
    factory.is_flux = true;
    for b in ctx.take_blocks() {
        factory.push_block(b);
    }
    factory
}

fn lower_resume<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    name: &str,
    class_name: Option<&str>,
    params: &[(String, Type)],
    locals: &[(String, Type)],
    layout: &ClassLayout,
    ctx_ty: Type,
    body: &[AstId],
    line: u32,
    col: u32,
) -> Function {
    ctx.start_function();
    let entry_idx = ctx.new_block("resume_entry");
    ctx.set_current(entry_idx);

    let raw_self = Value::Local { name: "__flux_self".into(), ty: Type::void().pointer_to() };
    let handle = ctx.fresh_temp(ctx_ty.clone());
    ctx.emit(Instruction::new(Opcode::Bitcast, line, col).with_dest(handle.clone()).with_operand(raw_self));

    let state_addr = field_addr(ctx, handle.clone(), layout, "state", line, col);
    let finished_addr = field_addr(ctx, handle.clone(), layout, "finished", line, col);
    let result_addr = field_addr(ctx, handle.clone(), layout, "result", line, col);
    ctx.bind("__flux_state", state_addr.clone());
    ctx.bind("__flux_finished", finished_addr);
    ctx.bind("__flux_result", result_addr);
    if let Some(cn) = class_name {
        let this_addr = field_addr(ctx, handle.clone(), layout, "this", line, col);
        ctx.bind("this", this_addr);
    }
    for (pname, _) in params {
        let addr = field_addr(ctx, handle.clone(), layout, pname, line, col);
        ctx.bind(pname, addr);
    }
    for (lname, _) in locals {
        let addr = field_addr(ctx, handle.clone(), layout, lname, line, col);
        ctx.bind(lname, addr);
    }

    let state_val = load_value(ctx, state_addr, line, col);

    let body_entry_label = ctx.fresh_label("resume_body");
    let body_idx = ctx.new_block(body_entry_label.clone());
    ctx.set_current(body_idx);
    ctx.record_resume_point(0, body_entry_label);
    stmt::gen_block(ctx, body);
    if !ctx.current_has_terminator() {
        let finished_addr = ctx.resolve_addr("__flux_finished").expect("bound at resume entry");
        store_value(ctx, finished_addr, Value::ConstInt { value: 1, ty: Type::bool_() }, line, col);
        ctx.emit(Instruction::new(Opcode::Ret, line, col));
    }

    let dispatch = ctx.take_flux_dispatch();
    let cases: Vec<CaseEntry> = dispatch.into_iter().map(|(v, l)| CaseEntry { value: v, label: l }).collect();
    let trap_label = ctx.fresh_label("resume_trap");
    ctx.set_current(entry_idx);
    ctx.emit(
        Instruction::new(Opcode::Switch, line, col)
            .with_operand(state_val)
            .with_cases(cases)
            .with_args(vec![Value::Label { name: trap_label.clone() }]),
    );

    let trap_idx = ctx.new_block(trap_label);
    ctx.set_current(trap_idx);
    ctx.emit(Instruction::new(Opcode::Ret, line, col));

    let resume_name = mangle::resume_function_name(name);
    let mut resume = Function::new(resume_name, Type::void(), vec![Type::void().pointer_to()]);
    resume.is_flux = true;
    for b in ctx.take_blocks() {
        resume.push_block(b);
    }
    resume
}

#[cfg(test)]
mod tests {
    use super::*;
    use alir_ir::ast::LiteralValue;
    use alir_ir::{CollectingSink, NodeTypeTable};

    #[test]
    fn flux_lowering_produces_a_factory_and_a_resume_function() {
        let mut ast = Ast::new();
        let lit = ast.push(1, 1, AstKind::Literal { var_type: Type::int(), value: LiteralValue::Int(1) });
        let emit = ast.push(1, 1, AstKind::Emit { value: lit });
        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);

        let (factory, resume) = lower_flux_function(&mut ctx, "counter", "counter", None, &[], Type::int(), &[emit], 1, 1);

        assert_eq!(factory.mangled_name, "counter");
        assert!(factory.is_flux);
        assert_eq!(resume.mangled_name, "counter_Resume");
        assert!(!resume.blocks.is_empty());
        let entry = &resume.blocks[0];
        assert_eq!(entry.instructions.last().unwrap().opcode, Opcode::Switch);
        // state 0 (initial entry) and state 1 (after the sole emit).
        assert_eq!(entry.instructions.last().unwrap().cases.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn flux_context_struct_carries_state_finished_and_result_fields() {
        let ast = Ast::new();
        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
        lower_flux_function(&mut ctx, "counter", "counter", None, &[], Type::int(), &[], 1, 1);
        let layout = ctx.module.structs.get("FluxCtx_counter").unwrap();
        assert!(layout.field("state").is_some());
        assert!(layout.field("finished").is_some());
        assert!(layout.field("result").is_some());
    }
}
