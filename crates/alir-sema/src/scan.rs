//! Pass 1 — Scan.
//!
//! Walks top-level declarations only; never visits a function or method
//! body. Registers function/class/enum/namespace symbols up front so
//! mutual references resolve regardless of source order.

use alir_ir::ast::{Ast, AstId, AstKind};
use alir_ir::{DiagnosticSink, ScopeRole, Symbol};

use crate::ctx::SemanticCtx;

pub fn scan_program<S: DiagnosticSink>(ast: &Ast, ctx: &mut SemanticCtx<S>) {
    for &root in &ast.roots {
        scan_item(ast, ctx, root);
    }
}

fn scan_item<S: DiagnosticSink>(ast: &Ast, ctx: &mut SemanticCtx<S>, id: AstId) {
    let node = ast.get(id);
    match &node.kind {
        AstKind::FuncDef { name, ret_type, params, class_name: None, .. } => {
            let param_types = params.iter().map(|(_, t)| t.clone()).collect();
            if ctx.scope().get(name).is_some() {
                ctx.error(node.line, node.col, format!("function `{name}` redeclared"));
                return;
            }
            ctx.scope_mut().declare(Symbol::func(name, ret_type.clone(), param_types));
        }
        AstKind::FuncDef { class_name: Some(_), .. } => {
            // Registered as part of its owning Class's member walk below;
            // free-standing at this level only when malformed input reaches
            // us directly, which Scan simply ignores (Check never visits it).
        }
        AstKind::Class { name, parent_name, members, .. } => {
            scan_class(ast, ctx, node.line, node.col, name, parent_name.clone(), members);
        }
        AstKind::Enum { name, entries } => {
            scan_enum(ctx, node.line, node.col, name, entries);
        }
        AstKind::Namespace { name, body } => {
            scan_namespace(ast, ctx, name, body);
        }
        AstKind::VarDecl { name, var_type, is_mutable, .. } => {
            ctx.scope_mut().declare(Symbol::var(name, var_type.clone(), *is_mutable));
        }
        _ => {}
    }
}

fn scan_class<S: DiagnosticSink>(
    ast: &Ast,
    ctx: &mut SemanticCtx<S>,
    line: u32,
    col: u32,
    name: &str,
    parent_name: Option<String>,
    members: &[AstId],
) {
    let previous = ctx.current_scope();
    let inner = ctx.scopes.push(ScopeRole::Class, previous);
    ctx.scopes.get_mut(inner).owning_class = Some(name.to_string());

    let before = ctx.enter_scope(inner);
    for &member_id in members {
        let member = ast.get(member_id);
        match &member.kind {
            AstKind::VarDecl { name: field_name, var_type, is_mutable, .. } => {
                if ctx.scope().get(field_name).is_some() {
                    ctx.error(member.line, member.col, format!("duplicate field `{field_name}` in class `{name}`"));
                    continue;
                }
                ctx.scope_mut().declare(Symbol::var(field_name, var_type.clone(), *is_mutable));
            }
            AstKind::FuncDef { name: method_name, ret_type, params, .. } => {
                let param_types = params.iter().map(|(_, t)| t.clone()).collect();
                ctx.scope_mut()
                    .declare(Symbol::func(method_name, ret_type.clone(), param_types));
            }
            _ => {}
        }
    }
    ctx.enter_scope(before);

    let mut class_symbol = Symbol::class(name, parent_name);
    class_symbol.inner_scope = Some(inner);
    ctx.register_class(class_symbol.clone());
    if ctx.scope().get(name).is_some() {
        ctx.error(line, col, format!("class `{name}` redeclared"));
        return;
    }
    ctx.scope_mut().declare(class_symbol);
}

fn scan_enum<S: DiagnosticSink>(
    ctx: &mut SemanticCtx<S>,
    line: u32,
    col: u32,
    name: &str,
    entries: &[(String, Option<i64>)],
) {
    let previous = ctx.current_scope();
    let inner = ctx.scopes.push(ScopeRole::Block, previous);

    let before = ctx.enter_scope(inner);
    let mut next_value = 0i64;
    for (member_name, explicit_value) in entries {
        let value = explicit_value.unwrap_or(next_value);
        next_value = value + 1;
        let mut member = alir_ir::Symbol::var(member_name, alir_ir::Type::enum_(name), false);
        member.is_initialized = true;
        ctx.scope_mut().declare(member);
        let _ = value; // integer value itself lives in Module::enums, built by IR Gen's layout pass.
    }
    ctx.enter_scope(before);

    let mut enum_symbol = Symbol::enum_(name);
    enum_symbol.inner_scope = Some(inner);
    if ctx.scope().get(name).is_some() {
        ctx.error(line, col, format!("enum `{name}` redeclared"));
        return;
    }
    ctx.scope_mut().declare(enum_symbol);
}

fn scan_namespace<S: DiagnosticSink>(ast: &Ast, ctx: &mut SemanticCtx<S>, name: &str, body: &[AstId]) {
    let previous = ctx.current_scope();
    let inner = ctx.scopes.push(ScopeRole::Namespace, previous);

    let mut ns_symbol = Symbol::namespace(name);
    ns_symbol.inner_scope = Some(inner);
    ctx.scope_mut().declare(ns_symbol);

    let before = ctx.enter_scope(inner);
    for &item in body {
        scan_item(ast, ctx, item);
    }
    ctx.enter_scope(before);
}
