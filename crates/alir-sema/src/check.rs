//! Pass 2 — Check.
//!
//! Walks the program in order, entering each function's scope, binding
//! `this`/parameters, then checking the body statement by statement.
//! Produces the node→type side table and resolves `Auto`/mangled-name
//! fields as the only permitted AST mutations.

use alir_ir::ast::{Ast, AssignOp, AstId, AstKind, BinOp, UnOp};
use alir_ir::{DiagnosticSink, ScopeRole, Symbol, Type};

use crate::ctx::SemanticCtx;
use crate::{hint, lookup, mangle, typing};

pub fn check_program<S: DiagnosticSink>(ast: &mut Ast, ctx: &mut SemanticCtx<S>) {
    let roots = ast.roots.clone();
    for root in roots {
        check_item(ast, ctx, root);
    }
}

fn check_item<S: DiagnosticSink>(ast: &mut Ast, ctx: &mut SemanticCtx<S>, id: AstId) {
    let node = ast.get(id).clone();
    match node.kind {
        AstKind::FuncDef { name, ret_type, params, body, class_name, .. } => {
            check_funcdef(ast, ctx, id, node.line, node.col, &name, &ret_type, &params, body, class_name.as_deref());
        }
        AstKind::Class { name, members, .. } => {
            let previous_class = ctx.current_class.take();
            ctx.current_class = Some(name.clone());
            if let Some(class_sym) = ctx.class(&name).cloned() {
                if let Some(inner) = class_sym.inner_scope {
                    let previous_scope = ctx.enter_scope(inner);
                    for member in members {
                        check_item(ast, ctx, member);
                    }
                    ctx.enter_scope(previous_scope);
                }
            }
            ctx.current_class = previous_class;
        }
        AstKind::Namespace { name, body } => {
            if let Some(ns_sym) = ctx.scope().get(&name).cloned() {
                if let Some(inner) = ns_sym.inner_scope {
                    let previous = ctx.enter_scope(inner);
                    for item in body {
                        check_item(ast, ctx, item);
                    }
                    ctx.enter_scope(previous);
                }
            }
        }
        AstKind::Enum { .. } => {}
        AstKind::VarDecl { .. } => check_var_decl(ast, ctx, id),
        _ => {}
    }
}

#[allow(clippy::too_many_arguments)]
fn check_funcdef<S: DiagnosticSink>(
    ast: &mut Ast,
    ctx: &mut SemanticCtx<S>,
    id: AstId,
    _line: u32,
    _col: u32,
    name: &str,
    ret_type: &Type,
    params: &[(String, Type)],
    body: Option<Vec<AstId>>,
    class_name: Option<&str>,
) {
    let param_types: Vec<Type> = params.iter().map(|(_, t)| t.clone()).collect();
    let mangled = mangle::mangle_function(name, &param_types);
    ast.set_mangled_name(id, mangled);

    let Some(body) = body else {
        return; // declaration only; nothing to type-check
    };

    let previous_scope = ctx.push_scope(ScopeRole::Function);
    ctx.set_return_type(ret_type.clone());

    if let Some(cn) = class_name {
        let mut this_sym = Symbol::var("this", Type::class(cn).pointer_to(), false);
        this_sym.is_initialized = true;
        ctx.scope_mut().declare(this_sym);
    }
    for (pname, ptype) in params {
        let mut sym = Symbol::var(pname, ptype.clone(), true);
        sym.is_initialized = true;
        ctx.scope_mut().declare(sym);
    }

    for stmt in body {
        check_stmt(ast, ctx, stmt);
    }

    ctx.pop_scope_to(previous_scope);
}

fn check_stmt<S: DiagnosticSink>(ast: &mut Ast, ctx: &mut SemanticCtx<S>, id: AstId) {
    let node = ast.get(id).clone();
    match node.kind {
        AstKind::VarDecl { .. } => check_var_decl(ast, ctx, id),
        AstKind::Assign { .. } => check_assign(ast, ctx, id),
        AstKind::Return { value } => check_return(ast, ctx, node.line, node.col, value),
        AstKind::If { cond, then_body, else_body } => {
            check_expr(ast, ctx, cond);
            let previous = ctx.push_scope(ScopeRole::Block);
            for s in then_body {
                check_stmt(ast, ctx, s);
            }
            ctx.pop_scope_to(previous);
            if let Some(else_body) = else_body {
                let previous = ctx.push_scope(ScopeRole::Block);
                for s in else_body {
                    check_stmt(ast, ctx, s);
                }
                ctx.pop_scope_to(previous);
            }
        }
        AstKind::While { cond, body, .. } => {
            check_expr(ast, ctx, cond);
            let previous = ctx.push_scope(ScopeRole::Block);
            ctx.enter_loop();
            for s in body {
                check_stmt(ast, ctx, s);
            }
            ctx.exit_loop();
            ctx.pop_scope_to(previous);
        }
        AstKind::Loop { iterations, body } => {
            if let Some(it) = iterations {
                check_expr(ast, ctx, it);
            }
            let previous = ctx.push_scope(ScopeRole::Block);
            ctx.enter_loop();
            for s in body {
                check_stmt(ast, ctx, s);
            }
            ctx.exit_loop();
            ctx.pop_scope_to(previous);
        }
        AstKind::ForIn { var_name, iter_type, collection, body } => {
            check_expr(ast, ctx, collection);
            let previous = ctx.push_scope(ScopeRole::Block);
            let mut sym = Symbol::var(&var_name, iter_type, true);
            sym.is_initialized = true;
            ctx.scope_mut().declare(sym);
            ctx.enter_loop();
            for s in body {
                check_stmt(ast, ctx, s);
            }
            ctx.exit_loop();
            ctx.pop_scope_to(previous);
        }
        AstKind::Switch { condition, cases, default_case } => {
            let cond_ty = check_expr(ast, ctx, condition);
            ctx.enter_switch();
            for case in cases {
                check_case(ast, ctx, case, &cond_ty);
            }
            if let Some(default_body) = default_case {
                let previous = ctx.push_scope(ScopeRole::Block);
                for s in default_body {
                    check_stmt(ast, ctx, s);
                }
                ctx.pop_scope_to(previous);
            }
            ctx.exit_switch();
        }
        AstKind::Break => {
            if !ctx.in_loop() && !ctx.in_switch() {
                ctx.error(node.line, node.col, "`break` outside of a loop or switch");
            }
        }
        AstKind::Continue => {
            if !ctx.in_loop() {
                ctx.error(node.line, node.col, "`continue` outside of a loop");
            }
        }
        AstKind::Emit { value } => {
            check_expr(ast, ctx, value);
        }
        AstKind::FuncDef { .. } | AstKind::Class { .. } | AstKind::Namespace { .. } | AstKind::Enum { .. } => {
            check_item(ast, ctx, id);
        }
        _ => {
            check_expr(ast, ctx, id);
        }
    }
}

fn check_case<S: DiagnosticSink>(ast: &mut Ast, ctx: &mut SemanticCtx<S>, id: AstId, cond_ty: &Type) {
    let node = ast.get(id).clone();
    let AstKind::Case { value, body, .. } = node.kind else { return };
    let value_ty = check_expr(ast, ctx, value);
    if !value_ty.is_unknown() && !cond_ty.is_unknown() && !typing::is_assignable(&value_ty, cond_ty) {
        ctx.error(
            node.line,
            node.col,
            format!("case label type `{}` does not match switch selector type `{}`", value_ty.render(), cond_ty.render()),
        );
    }
    let previous = ctx.push_scope(ScopeRole::Block);
    for s in body {
        check_stmt(ast, ctx, s);
    }
    ctx.pop_scope_to(previous);
}

fn check_return<S: DiagnosticSink>(ast: &mut Ast, ctx: &mut SemanticCtx<S>, line: u32, col: u32, value: Option<AstId>) {
    let value_ty = value.map(|v| check_expr(ast, ctx, v)).unwrap_or_else(Type::void);
    let expected = ctx.expected_return_type().cloned().unwrap_or_else(Type::void);
    if value_ty.is_unknown() {
        return;
    }
    if !typing::is_assignable(&value_ty, &expected) {
        ctx.error(
            line,
            col,
            format!("return type mismatch: expected `{}`, found `{}`", expected.render(), value_ty.render()),
        );
    } else if let Some(note) = typing::implicit_cast_note(&value_ty, &expected) {
        ctx.info(line, col, note);
    }
}

fn check_var_decl<S: DiagnosticSink>(ast: &mut Ast, ctx: &mut SemanticCtx<S>, id: AstId) {
    let node = ast.get(id).clone();
    let AstKind::VarDecl { name, var_type, initializer, is_mutable, .. } = node.kind else { return };

    let init_ty = initializer.map(|e| check_expr(ast, ctx, e));
    match typing::infer_let_type(&var_type, init_ty.as_ref()) {
        Ok(resolved) => {
            if var_type.is_auto() {
                ast.resolve_auto(id, resolved.clone());
            }
            if let Some(ity) = &init_ty {
                if !ity.is_unknown() && !typing::is_assignable(ity, &resolved) {
                    ctx.error(
                        node.line,
                        node.col,
                        format!(
                            "cannot initialize `{name}` of type `{}` with value of type `{}`",
                            resolved.render(),
                            ity.render()
                        ),
                    );
                } else if let Some(note) = typing::implicit_cast_note(ity, &resolved) {
                    ctx.info(node.line, node.col, note);
                }
            }
            ctx.types.record(id, resolved.clone());
            let mut sym = Symbol::var(&name, resolved, is_mutable);
            sym.is_initialized = init_ty.is_some();
            ctx.scope_mut().declare(sym);
        }
        Err(msg) => {
            ctx.error(node.line, node.col, msg);
            ctx.types.record(id, Type::unknown());
            ctx.scope_mut().declare(Symbol::var(&name, Type::unknown(), is_mutable));
        }
    }
}

fn check_assign<S: DiagnosticSink>(ast: &mut Ast, ctx: &mut SemanticCtx<S>, id: AstId) {
    let node = ast.get(id).clone();
    let AstKind::Assign { name, target, value, op, index } = node.kind else { return };

    let value_ty = check_expr(ast, ctx, value);

    let mut dest_ty = if let Some(n) = &name {
        match lookup::resolve(ctx, ctx.current_scope(), n) {
            Some(sym) => {
                if !sym.is_mutable {
                    ctx.error(node.line, node.col, format!("cannot assign to immutable `{n}`"));
                }
                sym.ty
            }
            None => {
                let suggestion = hint::suggest(n, visible_names(ctx));
                let mut msg = format!("undefined name `{n}`");
                if let Some(s) = suggestion {
                    ctx.hint(node.line, node.col, format!("did you mean `{s}`?"));
                    msg.push_str(&format!(" (did you mean `{s}`?)"));
                }
                ctx.error(node.line, node.col, msg);
                Type::unknown()
            }
        }
    } else if let Some(t) = target {
        check_expr(ast, ctx, t)
    } else {
        Type::unknown()
    };

    if let Some(idx) = index {
        let _idx_ty = check_expr(ast, ctx, idx);
        if dest_ty.is_array() || dest_ty.is_pointer() {
            dest_ty = element_type(&dest_ty);
        }
    }

    if dest_ty.is_unknown() || value_ty.is_unknown() {
        return;
    }

    let compatible = match op {
        AssignOp::Set => typing::is_assignable(&value_ty, &dest_ty),
        AssignOp::AddSet => typing::binary_result_type(BinOp::Add, &dest_ty, &value_ty).is_ok(),
        AssignOp::SubSet => typing::binary_result_type(BinOp::Sub, &dest_ty, &value_ty).is_ok(),
        AssignOp::MulSet => typing::binary_result_type(BinOp::Mul, &dest_ty, &value_ty).is_ok(),
        AssignOp::DivSet => typing::binary_result_type(BinOp::Div, &dest_ty, &value_ty).is_ok(),
    };

    if !compatible {
        ctx.error(
            node.line,
            node.col,
            format!("cannot assign value of type `{}` to target of type `{}`", value_ty.render(), dest_ty.render()),
        );
    } else if matches!(op, AssignOp::Set) {
        if let Some(note) = typing::implicit_cast_note(&value_ty, &dest_ty) {
            ctx.info(node.line, node.col, note);
        }
    }
}

fn element_type(ty: &Type) -> Type {
    if ty.is_pointer() {
        ty.dereferenced()
    } else {
        let mut t = ty.clone();
        t.array_size = 0;
        t
    }
}

fn visible_names<S: DiagnosticSink>(ctx: &SemanticCtx<S>) -> Vec<&str> {
    let mut names = Vec::new();
    let mut current = Some(ctx.current_scope());
    while let Some(id) = current {
        let scope = ctx.scopes.get(id);
        names.extend(scope.symbols.keys().map(|s| s.as_str()));
        current = scope.parent;
    }
    names
}

pub fn check_expr<S: DiagnosticSink>(ast: &mut Ast, ctx: &mut SemanticCtx<S>, id: AstId) -> Type {
    let node = ast.get(id).clone();
    let ty = check_expr_kind(ast, ctx, node.line, node.col, node.kind);
    ctx.types.record(id, ty.clone());
    ty
}

fn check_expr_kind<S: DiagnosticSink>(ast: &mut Ast, ctx: &mut SemanticCtx<S>, line: u32, col: u32, kind: AstKind) -> Type {
    match kind {
        AstKind::Literal { var_type, .. } => var_type,
        AstKind::VarRef { name, is_class_member } => check_var_ref(ctx, line, col, &name, is_class_member),
        AstKind::BinaryOp { op, left, right } => {
            let lt = check_expr(ast, ctx, left);
            let rt = check_expr(ast, ctx, right);
            if let Some(p) = typing::poisoned(&[&lt, &rt]) {
                return p;
            }
            match typing::binary_result_type(op, &lt, &rt) {
                Ok(t) => t,
                Err(msg) => {
                    ctx.error(line, col, msg);
                    Type::unknown()
                }
            }
        }
        AstKind::UnaryOp { op, operand } => {
            let ty = check_expr(ast, ctx, operand);
            if ty.is_unknown() {
                return ty;
            }
            match op {
                UnOp::Neg if ty.is_numeric() => ty,
                UnOp::BitNot if ty.is_integer() => ty,
                UnOp::Not => Type::bool_(),
                _ => {
                    ctx.error(line, col, format!("operator {op:?} not defined for type `{}`", ty.render()));
                    Type::unknown()
                }
            }
        }
        AstKind::Call { name, args } => {
            for a in &args {
                check_expr(ast, ctx, *a);
            }
            if ctx.class(&name).is_some() {
                Type::class(&name).pointer_to()
            } else {
                match lookup::resolve(ctx, ctx.current_scope(), &name) {
                    Some(sym) => sym.ty,
                    None => {
                        let suggestion = hint::suggest(&name, visible_names(ctx));
                        if let Some(s) = suggestion {
                            ctx.hint(line, col, format!("did you mean `{s}`?"));
                        }
                        ctx.error(line, col, format!("call to undefined function `{name}`"));
                        Type::unknown()
                    }
                }
            }
        }
        AstKind::MethodCall { object, method_name, args } => {
            let obj_ty = check_expr(ast, ctx, object);
            for a in &args {
                check_expr(ast, ctx, *a);
            }
            if obj_ty.is_unknown() {
                return Type::unknown();
            }
            let class_name = match &obj_ty.class_name {
                Some(n) if obj_ty.is_class() => n.clone(),
                _ => {
                    ctx.error(line, col, format!("method call on non-class type `{}`", obj_ty.render()));
                    return Type::unknown();
                }
            };
            match lookup::find_class_member(ctx, &class_name, &method_name) {
                Some(sym) => sym.ty,
                None => {
                    ctx.error(line, col, format!("class `{class_name}` has no method `{method_name}`"));
                    Type::unknown()
                }
            }
        }
        AstKind::MemberAccess { object, member_name } => {
            let obj_ty = check_expr(ast, ctx, object);
            if obj_ty.is_unknown() {
                return Type::unknown();
            }
            if obj_ty.is_string() && member_name == "length" {
                return Type::int();
            }
            if obj_ty.is_class() {
                let class_name = obj_ty.class_name.clone().unwrap_or_default();
                return match lookup::find_class_member(ctx, &class_name, &member_name) {
                    Some(sym) => sym.ty,
                    None => {
                        ctx.error(line, col, format!("class `{class_name}` has no member `{member_name}`"));
                        Type::unknown()
                    }
                };
            }
            ctx.error(line, col, format!("type `{}` has no member `{member_name}`", obj_ty.render()));
            Type::unknown()
        }
        AstKind::ArrayAccess { target, index } => {
            let target_ty = check_expr(ast, ctx, target);
            let _ = check_expr(ast, ctx, index);
            if target_ty.is_unknown() {
                return Type::unknown();
            }
            if target_ty.is_array() || target_ty.is_pointer() {
                element_type(&target_ty)
            } else {
                ctx.error(line, col, format!("type `{}` cannot be indexed", target_ty.render()));
                Type::unknown()
            }
        }
        AstKind::Cast { var_type, operand } => {
            check_expr(ast, ctx, operand);
            var_type
        }
        AstKind::ArrayLit { elements } => {
            if elements.is_empty() {
                return Type::unknown();
            }
            let mut element_ty = None;
            for e in &elements {
                let t = check_expr(ast, ctx, *e);
                element_ty.get_or_insert(t);
            }
            let first = element_ty.unwrap();
            Type::array_of(first, elements.len() as u32)
        }
        AstKind::TraitAccess { object, trait_name: _ } => check_expr(ast, ctx, object),
        _ => Type::unknown(),
    }
}

fn check_var_ref<S: DiagnosticSink>(ctx: &mut SemanticCtx<S>, line: u32, col: u32, name: &str, is_class_member: bool) -> Type {
    if is_class_member {
        if let Some(class_name) = ctx.current_class.clone() {
            if let Some(sym) = lookup::find_class_member(ctx, &class_name, name) {
                return sym.ty;
            }
        }
        ctx.error(line, col, format!("undefined class member `{name}`"));
        return Type::unknown();
    }
    match lookup::resolve(ctx, ctx.current_scope(), name) {
        Some(sym) => sym.ty,
        None => {
            let suggestion = hint::suggest(name, visible_names(ctx));
            if let Some(s) = suggestion {
                ctx.hint(line, col, format!("did you mean `{s}`?"));
            }
            ctx.error(line, col, format!("undefined name `{name}`"));
            Type::unknown()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alir_ir::{ast::LiteralValue, CollectingSink};

    fn lit_int(ast: &mut Ast, v: i64) -> AstId {
        ast.push(1, 1, AstKind::Literal { var_type: Type::int(), value: LiteralValue::Int(v) })
    }

    #[test]
    fn scenario_s1_integer_function() {
        let mut ast = Ast::new();
        let a_ref = ast.push(1, 1, AstKind::VarRef { name: "a".into(), is_class_member: false });
        let b_ref = ast.push(1, 1, AstKind::VarRef { name: "b".into(), is_class_member: false });
        let sum = ast.push(1, 1, AstKind::BinaryOp { op: BinOp::Add, left: a_ref, right: b_ref });
        let ret = ast.push(1, 1, AstKind::Return { value: Some(sum) });
        let f = ast.push(
            1,
            1,
            AstKind::FuncDef {
                name: "add".into(),
                ret_type: Type::int(),
                params: vec![("a".into(), Type::int()), ("b".into(), Type::int())],
                body: Some(vec![ret]),
                class_name: None,
                is_flux: false,
                is_varargs: false,
                mangled_name: None,
            },
        );
        ast.add_root(f);

        let mut sink = CollectingSink::new();
        let mut ctx = SemanticCtx::new("main.alir", &mut sink);
        crate::scan::scan_program(&ast, &mut ctx);
        check_program(&mut ast, &mut ctx);

        assert_eq!(ctx.error_count, 0);
        match &ast.get(f).kind {
            AstKind::FuncDef { mangled_name, .. } => {
                assert_eq!(mangled_name.as_deref(), Some("_Z3addii"))
            }
            _ => panic!(),
        }
        assert_eq!(*ctx.types.expect(sum), Type::int());
    }

    #[test]
    fn scenario_s2_inference_and_mismatch_errors() {
        let mut ast = Ast::new();
        let init = lit_int(&mut ast, 42);
        let x = ast.push(
            1,
            1,
            AstKind::VarDecl {
                name: "x".into(),
                var_type: Type::auto(),
                initializer: Some(init),
                is_mutable: true,
                is_array: false,
                array_size: None,
            },
        );
        let y = ast.push(
            2,
            1,
            AstKind::VarDecl {
                name: "y".into(),
                var_type: Type::auto(),
                initializer: None,
                is_mutable: true,
                is_array: false,
                array_size: None,
            },
        );
        let x_ref = ast.push(3, 10, AstKind::VarRef { name: "x".into(), is_class_member: false });
        let s = ast.push(
            3,
            1,
            AstKind::VarDecl {
                name: "s".into(),
                var_type: Type::string(),
                initializer: Some(x_ref),
                is_mutable: true,
                is_array: false,
                array_size: None,
            },
        );
        ast.add_root(x);
        ast.add_root(y);
        ast.add_root(s);

        let mut sink = CollectingSink::new();
        let mut ctx = SemanticCtx::new("main.alir", &mut sink);
        crate::scan::scan_program(&ast, &mut ctx);
        check_program(&mut ast, &mut ctx);

        // y has no initializer (error); x:int is not assignable to string s (error).
        assert_eq!(ctx.error_count, 2);
    }

    #[test]
    fn scenario_s3_class_with_parent_layout_is_visible_via_lookup() {
        let mut ast = Ast::new();
        let x_field = ast.push(
            1,
            1,
            AstKind::VarDecl {
                name: "x".into(),
                var_type: Type::int(),
                initializer: None,
                is_mutable: true,
                is_array: false,
                array_size: None,
            },
        );
        let class_a = ast.push(1, 1, AstKind::Class { name: "A".into(), parent_name: None, members: vec![x_field], traits: vec![] });
        let y_field = ast.push(
            2,
            1,
            AstKind::VarDecl {
                name: "y".into(),
                var_type: Type::int(),
                initializer: None,
                is_mutable: true,
                is_array: false,
                array_size: None,
            },
        );
        let class_b = ast.push(
            2,
            1,
            AstKind::Class { name: "B".into(), parent_name: Some("A".into()), members: vec![y_field], traits: vec![] },
        );
        ast.add_root(class_a);
        ast.add_root(class_b);

        let mut sink = CollectingSink::new();
        let mut ctx = SemanticCtx::new("main.alir", &mut sink);
        crate::scan::scan_program(&ast, &mut ctx);
        check_program(&mut ast, &mut ctx);

        assert_eq!(ctx.error_count, 0);
        assert!(lookup::find_class_member(&ctx, "B", "x").is_some());
        assert!(lookup::find_class_member(&ctx, "B", "y").is_some());
    }

    #[test]
    fn break_outside_loop_or_switch_is_an_error() {
        let mut ast = Ast::new();
        let brk = ast.push(1, 1, AstKind::Break);
        let f = ast.push(
            1,
            1,
            AstKind::FuncDef {
                name: "f".into(),
                ret_type: Type::void(),
                params: vec![],
                body: Some(vec![brk]),
                class_name: None,
                is_flux: false,
                is_varargs: false,
                mangled_name: None,
            },
        );
        ast.add_root(f);

        let mut sink = CollectingSink::new();
        let mut ctx = SemanticCtx::new("main.alir", &mut sink);
        crate::scan::scan_program(&ast, &mut ctx);
        check_program(&mut ast, &mut ctx);
        assert_eq!(ctx.error_count, 1);
    }
}
