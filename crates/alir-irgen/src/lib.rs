//! The IR Generator: lowers a type-annotated AST into an IR
//! [`Module`](alir_ir::Module). Depends on `alir-sema` only for the
//! [`alir_ir::NodeTypeTable`] contract Semantic already populated; does not
//! re-run name resolution or typing.

pub mod construct;
pub mod coroutine;
pub mod ctx;
pub mod expr;
pub mod layout;
pub mod lvalue;
pub mod mangle;
pub mod stmt;

use alir_ir::ast::{Ast, AstKind};
use alir_ir::{AstId, DiagnosticSink, Function, Instruction, Module, NodeTypeTable, Opcode, Type};

use ctx::IrGenCtx;

/// Everything the IR Verifier needs from this stage: the module plus the
/// total error count, mirroring Semantic's own contract — a positive count
/// means verification must not run.
pub struct GenerateResult {
    pub module: Module,
    pub error_count: u32,
}

/// Runs the class-layout pass, then lowers every function body, reporting
/// through `sink`.
pub fn generate<S: DiagnosticSink>(ast: &Ast, types: &NodeTypeTable, filename: impl Into<String>, sink: &mut S) -> GenerateResult {
    let mut ctx = IrGenCtx::new(ast, types, filename, sink);
    layout::collect_declarations(&mut ctx);

    let roots = ctx.ast.roots.clone();
    lower_decls(&mut ctx, &roots);

    GenerateResult { module: ctx.module, error_count: ctx.error_count }
}

fn lower_decls<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>, ids: &[AstId]) {
    for &id in ids {
        let node = ctx.ast.get(id).clone();
        match node.kind {
            AstKind::FuncDef { name, ret_type, params, body, class_name, is_flux, mangled_name, .. } => {
                lower_function(ctx, &name, ret_type, &params, body, class_name.as_deref(), is_flux, mangled_name, node.line, node.col);
            }
            AstKind::Class { members, .. } => lower_decls(ctx, &members),
            AstKind::Namespace { body, .. } => lower_decls(ctx, &body),
            _ => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn lower_function<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    name: &str,
    ret_type: Type,
    params: &[(String, Type)],
    body: Option<Vec<AstId>>,
    class_name: Option<&str>,
    is_flux: bool,
    mangled_name: Option<String>,
    line: u32,
    col: u32,
) {
    let mangled = resolve_mangled(ctx, name, class_name, mangled_name);

    let Some(body) = body else {
        // Declaration-only: an empty-`blocks` Function, skipped by the
        // verifier.
        ctx.module.functions.push(Function::new(mangled, ret_type, full_params(class_name, params)));
        return;
    };

    if is_flux {
        let (factory, resume) = coroutine::lower_flux_function(ctx, name, &mangled, class_name, params, ret_type, &body, line, col);
        ctx.module.functions.push(factory);
        ctx.module.functions.push(resume);
        return;
    }

    ctx.start_function();
    ctx.new_block("entry");
    if let Some(cn) = class_name {
        stmt::bind_param(ctx, "this", Type::class(cn), line, col);
    }
    for (pname, pty) in params {
        stmt::bind_param(ctx, pname, pty.clone(), line, col);
    }
    stmt::gen_block(ctx, &body);
    if !ctx.current_has_terminator() {
        if !ret_type.is_void() {
            ctx.warning(line, col, format!("function `{name}` falls off its end without a return"));
        }
        ctx.emit(Instruction::new(Opcode::Ret, line, col));
    }

    let mut function = Function::new(mangled, ret_type, full_params(class_name, params));
    for b in ctx.take_blocks() {
        function.push_block(b);
    }
    ctx.module.functions.push(function);
}

fn full_params(class_name: Option<&str>, params: &[(String, Type)]) -> Vec<Type> {
    let mut out = Vec::new();
    if let Some(cn) = class_name {
        out.push(Type::class(cn));
    }
    out.extend(params.iter().map(|(_, t)| t.clone()));
    out
}

fn resolve_mangled<S: DiagnosticSink>(ctx: &IrGenCtx<S>, name: &str, class_name: Option<&str>, mangled_name: Option<String>) -> String {
    match class_name {
        Some(cn) => mangle::mangle_method(cn, name),
        None => mangled_name.or_else(|| ctx.function_mangled_name(name).map(String::from)).unwrap_or_else(|| name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alir_ir::ast::LiteralValue;
    use alir_ir::{CollectingSink, Type};

    #[test]
    fn generate_lowers_a_trivial_function_to_a_single_returning_block() {
        let mut ast = Ast::new();
        let lit = ast.push(1, 1, AstKind::Literal { var_type: Type::int(), value: LiteralValue::Int(1) });
        let ret = ast.push(1, 1, AstKind::Return { value: Some(lit) });
        let f = ast.push(
            1,
            1,
            AstKind::FuncDef {
                name: "one".into(),
                ret_type: Type::int(),
                params: vec![],
                body: Some(vec![ret]),
                class_name: None,
                is_flux: false,
                is_varargs: false,
                mangled_name: Some("_Z3onev".into()),
            },
        );
        ast.add_root(f);

        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let result = generate(&ast, &types, "main.alir", &mut sink);

        assert_eq!(result.error_count, 0);
        let func = result.module.function("_Z3onev").unwrap();
        assert_eq!(func.blocks.len(), 1);
        assert_eq!(func.blocks[0].instructions.last().unwrap().opcode, Opcode::Ret);
    }

    #[test]
    fn generate_leaves_declaration_only_functions_blockless() {
        let mut ast = Ast::new();
        let f = ast.push(
            1,
            1,
            AstKind::FuncDef {
                name: "extern_fn".into(),
                ret_type: Type::void(),
                params: vec![],
                body: None,
                class_name: None,
                is_flux: false,
                is_varargs: false,
                mangled_name: Some("_Z9extern_fnv".into()),
            },
        );
        ast.add_root(f);

        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let result = generate(&ast, &types, "main.alir", &mut sink);
        let func = result.module.function("_Z9extern_fnv").unwrap();
        assert!(func.is_declaration());
    }
}
