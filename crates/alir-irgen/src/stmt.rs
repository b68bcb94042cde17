//! Statement lowering into a control-flow graph of basic blocks.

use alir_ir::ast::{AssignOp, AstKind, LiteralValue, UnOp};
use alir_ir::{AstId, CaseEntry, DiagnosticSink, Instruction, Opcode, Type, Value};

use crate::coroutine;
use crate::ctx::IrGenCtx;
use crate::expr::{compound_opcode, gen_expr, get_ptr, load_value, store_value};
use crate::lvalue;

/// Allocates storage for a parameter (or `this`) and stores the incoming
/// value into it, so the body can treat it exactly like any other local
/// under the usual alloca-then-store parameter contract.
pub fn bind_param<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, name: &str, ty: Type, line: u32, col: u32) {
    let slot = ctx.fresh_label(name);
    let addr = Value::Local { name: slot, ty: ty.clone().pointer_to() };
    ctx.emit(Instruction::new(Opcode::Alloca, line, col).with_dest(addr.clone()));
    let incoming = Value::Local { name: name.to_string(), ty };
    store_value(ctx, addr.clone(), incoming, line, col);
    ctx.bind(name, addr);
}

pub fn gen_stmt<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, id: AstId) {
    if ctx.current_has_terminator() {
        return;
    }
    let node = ctx.ast.get(id).clone();
    let (line, col) = (node.line, node.col);
    match node.kind {
        AstKind::VarDecl { name, var_type, initializer, is_array, array_size, .. } => {
            gen_var_decl(ctx, name, var_type, initializer, is_array, array_size, line, col)
        }
        AstKind::Assign { name, target, value, op, index } => gen_assign(ctx, name, target, value, op, index, line, col),
        AstKind::Return { value } => gen_return(ctx, value, line, col),
        AstKind::If { cond, then_body, else_body } => gen_if(ctx, cond, &then_body, else_body.as_deref(), line, col),
        AstKind::While { cond, body, is_do_while } => gen_while(ctx, cond, &body, is_do_while, line, col),
        AstKind::Loop { iterations, body } => gen_loop(ctx, iterations, &body, line, col),
        AstKind::ForIn { var_name, iter_type, collection, body } => {
            gen_for_in(ctx, &var_name, iter_type, collection, &body, line, col)
        }
        AstKind::Switch { condition, cases, default_case } => gen_switch(ctx, condition, &cases, default_case, line, col),
        AstKind::Break => gen_break(ctx, line, col),
        AstKind::Continue => gen_continue(ctx, line, col),
        AstKind::Emit { value } => {
            coroutine::gen_emit(ctx, value, line, col);
        }
        AstKind::Call { .. } | AstKind::MethodCall { .. } => {
            gen_expr(ctx, id);
        }
        other => {
            ctx.error(line, col, format!("node {other:?} is not a statement"));
        }
    }
}

pub fn gen_block<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, body: &[AstId]) {
    for &s in body {
        gen_stmt(ctx, s);
    }
}

fn gen_var_decl<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    name: String,
    var_type: Type,
    initializer: Option<AstId>,
    is_array: bool,
    array_size: Option<u32>,
    line: u32,
    col: u32,
) {
    let ty = if is_array { Type::array_of(var_type, array_size.unwrap_or(0)) } else { var_type };
    let slot = ctx.fresh_label(&name);
    let addr = Value::Local { name: slot, ty: ty.pointer_to() };
    ctx.emit(Instruction::new(Opcode::Alloca, line, col).with_dest(addr.clone()));
    if let Some(init) = initializer {
        let v = gen_expr(ctx, init);
        store_value(ctx, addr.clone(), v, line, col);
    }
    ctx.bind(name, addr);
}

fn gen_assign<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    name: Option<String>,
    target: Option<AstId>,
    value: AstId,
    op: AssignOp,
    index: Option<AstId>,
    line: u32,
    col: u32,
) {
    let addr = if let Some(idx_id) = index {
        let Some(base_id) = target else {
            ctx.error(line, col, "indexed assignment missing its base target during lowering");
            return;
        };
        let base_addr = lvalue::gen_addr(ctx, base_id);
        let idx_val = gen_expr(ctx, idx_id);
        let mut elem_ty = ctx.node_type(base_id);
        elem_ty.array_size = 0;
        get_ptr(ctx, base_addr, idx_val, elem_ty.pointer_to(), line, col)
    } else if let Some(t) = target {
        lvalue::gen_addr(ctx, t)
    } else if let Some(n) = name {
        match ctx.resolve_addr(&n) {
            Some(a) => a,
            None => {
                ctx.error(line, col, format!("assignment to unbound name `{n}` during lowering"));
                return;
            }
        }
    } else {
        ctx.error(line, col, "assignment with neither name nor target during lowering");
        return;
    };

    let rhs = gen_expr(ctx, value);
    match op {
        AssignOp::Set => store_value(ctx, addr, rhs, line, col),
        _ => {
            let cur = load_value(ctx, addr.clone(), line, col);
            let is_float = cur.ty().map(|t| t.is_float()).unwrap_or(false);
            let opcode = compound_opcode(op, is_float);
            let dest_ty = cur.ty().cloned().unwrap_or_else(Type::unknown);
            let dest = ctx.fresh_temp(dest_ty);
            ctx.emit(Instruction::new(opcode, line, col).with_dest(dest.clone()).with_operand(cur).with_operand(rhs));
            store_value(ctx, addr, dest, line, col);
        }
    }
}

fn gen_return<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, value: Option<AstId>, line: u32, col: u32) {
    match value {
        Some(v) => {
            let val = gen_expr(ctx, v);
            ctx.emit(Instruction::new(Opcode::Ret, line, col).with_operand(val));
        }
        None => {
            ctx.emit(Instruction::new(Opcode::Ret, line, col));
        }
    }
}

fn gen_if<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, cond: AstId, then_body: &[AstId], else_body: Option<&[AstId]>, line: u32, col: u32) {
    let then_label = ctx.fresh_label("if_then");
    let merge_label = ctx.fresh_label("if_merge");
    let else_label = if else_body.is_some() { ctx.fresh_label("if_else") } else { merge_label.clone() };

    let cond_val = gen_expr(ctx, cond);
    ctx.emit(
        Instruction::new(Opcode::Condi, line, col)
            .with_operand(Value::Label { name: then_label.clone() })
            .with_operand(cond_val)
            .with_args(vec![Value::Label { name: else_label.clone() }]),
    );

    let then_idx = ctx.new_block(then_label);
    ctx.set_current(then_idx);
    gen_block(ctx, then_body);
    if !ctx.current_has_terminator() {
        ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: merge_label.clone() }));
    }

    if let Some(else_stmts) = else_body {
        let else_idx = ctx.new_block(else_label);
        ctx.set_current(else_idx);
        gen_block(ctx, else_stmts);
        if !ctx.current_has_terminator() {
            ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: merge_label.clone() }));
        }
    }

    let merge_idx = ctx.new_block(merge_label);
    ctx.set_current(merge_idx);
}

/// `while`/`do-while` share one shape: a `body` block and a `cond` block
/// that branches back to `body` or out to `end`. The two forms differ only
/// in which block the loop is entered through.
fn gen_while<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, cond: AstId, body: &[AstId], is_do_while: bool, line: u32, col: u32) {
    let cond_label = ctx.fresh_label("while_cond");
    let body_label = ctx.fresh_label("while_body");
    let end_label = ctx.fresh_label("while_end");
    let entry_label = if is_do_while { body_label.clone() } else { cond_label.clone() };

    if !ctx.current_has_terminator() {
        ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: entry_label }));
    }

    let body_idx = ctx.new_block(body_label);
    ctx.set_current(body_idx);
    ctx.push_loop(Some(cond_label.clone()), end_label.clone());
    gen_block(ctx, body);
    ctx.pop_loop();
    if !ctx.current_has_terminator() {
        ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: cond_label.clone() }));
    }

    let cond_idx = ctx.new_block(cond_label);
    ctx.set_current(cond_idx);
    let cond_val = gen_expr(ctx, cond);
    ctx.emit(
        Instruction::new(Opcode::Condi, line, col)
            .with_operand(Value::Label { name: ctx_block_label(ctx, body_idx) })
            .with_operand(cond_val)
            .with_args(vec![Value::Label { name: end_label.clone() }]),
    );

    let end_idx = ctx.new_block(end_label);
    ctx.set_current(end_idx);
}

fn ctx_block_label<S: DiagnosticSink>(ctx: &IrGenCtx<S>, idx: usize) -> String {
    ctx.block_label_at(idx).to_string()
}

fn gen_loop<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, iterations: Option<AstId>, body: &[AstId], line: u32, col: u32) {
    match iterations {
        None => gen_infinite_loop(ctx, body, line, col),
        Some(count_expr) => gen_counted_loop(ctx, count_expr, body, line, col),
    }
}

fn gen_infinite_loop<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, body: &[AstId], line: u32, col: u32) {
    let body_label = ctx.fresh_label("loop_body");
    let end_label = ctx.fresh_label("loop_end");

    if !ctx.current_has_terminator() {
        ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: body_label.clone() }));
    }
    let body_idx = ctx.new_block(body_label.clone());
    ctx.set_current(body_idx);
    ctx.push_loop(Some(body_label.clone()), end_label.clone());
    gen_block(ctx, body);
    ctx.pop_loop();
    if !ctx.current_has_terminator() {
        ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: body_label }));
    }

    let end_idx = ctx.new_block(end_label);
    ctx.set_current(end_idx);
}

/// `loop N { ... }`: a counted loop desugars into a hidden counter local
/// decremented each iteration, since the IR has no dedicated counted-loop
/// opcode.
fn gen_counted_loop<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, count_expr: AstId, body: &[AstId], line: u32, col: u32) {
    let count_val = gen_expr(ctx, count_expr);
    let counter_slot = ctx.fresh_label("loop_counter");
    let counter_addr = Value::Local { name: counter_slot, ty: Type::int().pointer_to() };
    ctx.emit(Instruction::new(Opcode::Alloca, line, col).with_dest(counter_addr.clone()));
    store_value(ctx, counter_addr.clone(), count_val, line, col);

    let cond_label = ctx.fresh_label("loop_cond");
    let body_label = ctx.fresh_label("loop_body");
    let end_label = ctx.fresh_label("loop_end");

    if !ctx.current_has_terminator() {
        ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: cond_label.clone() }));
    }

    let cond_idx = ctx.new_block(cond_label.clone());
    ctx.set_current(cond_idx);
    let remaining = load_value(ctx, counter_addr.clone(), line, col);
    let zero = Value::ConstInt { value: 0, ty: Type::int() };
    let keep_going = ctx.fresh_temp(Type::bool_());
    ctx.emit(Instruction::new(Opcode::Gt, line, col).with_dest(keep_going.clone()).with_operand(remaining).with_operand(zero));
    ctx.emit(
        Instruction::new(Opcode::Condi, line, col)
            .with_operand(Value::Label { name: body_label.clone() })
            .with_operand(keep_going)
            .with_args(vec![Value::Label { name: end_label.clone() }]),
    );

    let body_idx = ctx.new_block(body_label);
    ctx.set_current(body_idx);
    ctx.push_loop(Some(cond_label.clone()), end_label.clone());
    gen_block(ctx, body);
    ctx.pop_loop();
    if !ctx.current_has_terminator() {
        let remaining = load_value(ctx, counter_addr.clone(), line, col);
        let one = Value::ConstInt { value: 1, ty: Type::int() };
        let decremented = ctx.fresh_temp(Type::int());
        ctx.emit(Instruction::new(Opcode::Sub, line, col).with_dest(decremented.clone()).with_operand(remaining).with_operand(one));
        store_value(ctx, counter_addr, decremented, line, col);
        ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: cond_label }));
    }

    let end_idx = ctx.new_block(end_label);
    ctx.set_current(end_idx);
}

fn gen_for_in<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    var_name: &str,
    iter_type: Type,
    collection: AstId,
    body: &[AstId],
    line: u32,
    col: u32,
) {
    let coll_val = gen_expr(ctx, collection);
    let iter_val = ctx.fresh_temp(iter_type.clone().pointer_to());
    ctx.emit(Instruction::new(Opcode::IterInit, line, col).with_dest(iter_val.clone()).with_operand(coll_val));

    let cond_label = ctx.fresh_label("for_cond");
    let body_label = ctx.fresh_label("for_body");
    let next_label = ctx.fresh_label("for_next");
    let end_label = ctx.fresh_label("for_end");

    if !ctx.current_has_terminator() {
        ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: cond_label.clone() }));
    }

    let cond_idx = ctx.new_block(cond_label.clone());
    ctx.set_current(cond_idx);
    let valid = ctx.fresh_temp(Type::bool_());
    ctx.emit(Instruction::new(Opcode::IterValid, line, col).with_dest(valid.clone()).with_operand(iter_val.clone()));
    ctx.emit(
        Instruction::new(Opcode::Condi, line, col)
            .with_operand(Value::Label { name: body_label.clone() })
            .with_operand(valid)
            .with_args(vec![Value::Label { name: end_label.clone() }]),
    );

    let body_idx = ctx.new_block(body_label);
    ctx.set_current(body_idx);
    let elem_val = ctx.fresh_temp(iter_type.clone());
    ctx.emit(Instruction::new(Opcode::IterGet, line, col).with_dest(elem_val.clone()).with_operand(iter_val.clone()));
    let elem_slot = ctx.fresh_label(var_name);
    let elem_addr = Value::Local { name: elem_slot, ty: iter_type.pointer_to() };
    ctx.emit(Instruction::new(Opcode::Alloca, line, col).with_dest(elem_addr.clone()));
    store_value(ctx, elem_addr.clone(), elem_val, line, col);

    ctx.push_env();
    ctx.bind(var_name, elem_addr);
    ctx.push_loop(Some(next_label.clone()), end_label.clone());
    gen_block(ctx, body);
    ctx.pop_loop();
    ctx.pop_env();
    if !ctx.current_has_terminator() {
        ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: next_label.clone() }));
    }

    let next_idx = ctx.new_block(next_label);
    ctx.set_current(next_idx);
    ctx.emit(Instruction::new(Opcode::IterNext, line, col).with_operand(iter_val));
    ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: cond_label }));

    let end_idx = ctx.new_block(end_label);
    ctx.set_current(end_idx);
}

fn gen_switch<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    condition: AstId,
    cases: &[AstId],
    default_case: Option<Vec<AstId>>,
    line: u32,
    col: u32,
) {
    let selector = gen_expr(ctx, condition);
    let end_label = ctx.fresh_label("switch_end");

    let mut case_labels = Vec::with_capacity(cases.len());
    let mut entries = Vec::with_capacity(cases.len());
    for &case_id in cases {
        let label = ctx.fresh_label("case");
        if let AstKind::Case { value, .. } = &ctx.ast.get(case_id).kind {
            let value = *value;
            let constant = eval_constant_int(ctx, value);
            entries.push(CaseEntry { value: constant, label: label.clone() });
        }
        case_labels.push(label);
    }
    let default_label = if default_case.is_some() { ctx.fresh_label("default") } else { end_label.clone() };

    ctx.emit(
        Instruction::new(Opcode::Switch, line, col)
            .with_operand(selector)
            .with_cases(entries)
            .with_args(vec![Value::Label { name: default_label.clone() }]),
    );

    for (i, &case_id) in cases.iter().enumerate() {
        let idx = ctx.new_block(case_labels[i].clone());
        ctx.set_current(idx);
        let (body, is_leak) = match &ctx.ast.get(case_id).kind {
            AstKind::Case { body, is_leak, .. } => (body.clone(), *is_leak),
            _ => (Vec::new(), false),
        };
        ctx.push_loop(None, end_label.clone());
        gen_block(ctx, &body);
        ctx.pop_loop();
        if !ctx.current_has_terminator() {
            let target = if is_leak && i + 1 < case_labels.len() { case_labels[i + 1].clone() } else { end_label.clone() };
            ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: target }));
        }
    }

    if let Some(default_body) = default_case {
        let idx = ctx.new_block(default_label);
        ctx.set_current(idx);
        ctx.push_loop(None, end_label.clone());
        gen_block(ctx, &default_body);
        ctx.pop_loop();
        if !ctx.current_has_terminator() {
            ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: end_label.clone() }));
        }
    }

    let end_idx = ctx.new_block(end_label);
    ctx.set_current(end_idx);
}

/// Resolves a `switch` case label to a compile-time `i64`: an int/char
/// literal, `EnumName.Member` (an enum member access folds to the value
/// recorded in `ctx.module.enums` during the class-layout pass), or a
/// unary minus over either of those.
fn eval_constant_int<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, id: AstId) -> i64 {
    let node = ctx.ast.get(id).clone();
    match node.kind {
        AstKind::Literal { value: LiteralValue::Int(v), .. } => v,
        AstKind::Literal { value: LiteralValue::Char(c), .. } => c as i64,
        AstKind::UnaryOp { op: UnOp::Neg, operand } => -eval_constant_int(ctx, operand),
        AstKind::MemberAccess { object, member_name } => {
            if let AstKind::VarRef { name: enum_name, .. } = &ctx.ast.get(object).kind {
                if let Some(v) = ctx.module.enum_value(enum_name, &member_name) {
                    return v;
                }
            }
            ctx.error(node.line, node.col, "case label is not a compile-time constant");
            0
        }
        _ => {
            ctx.error(node.line, node.col, "case label is not a compile-time constant");
            0
        }
    }
}

fn gen_break<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, line: u32, col: u32) {
    match ctx.break_target() {
        Some(target) => {
            let target = target.to_string();
            ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: target }));
        }
        None => ctx.error(line, col, "break outside a loop or switch during lowering"),
    }
}

fn gen_continue<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, line: u32, col: u32) {
    match ctx.continue_target() {
        Some(target) => {
            let target = target.to_string();
            ctx.emit(Instruction::new(Opcode::Jump, line, col).with_operand(Value::Label { name: target }));
        }
        None => ctx.error(line, col, "continue outside a loop during lowering"),
    }
}
