//! The Semantic Analyzer: two-pass name resolution, hierarchical
//! scopes, `let` type inference, type compatibility, function mangling, and
//! the node→type side table IR Generation reads from.

pub mod check;
pub mod ctx;
pub mod hint;
pub mod lookup;
pub mod mangle;
pub mod scan;
pub mod typing;

use alir_ir::ast::Ast;
use alir_ir::{DiagnosticSink, NodeTypeTable, ScopeTree};

pub use ctx::SemanticCtx;

/// Everything later stages need out of Semantic: the populated scope tree,
/// the node→type side table, and the total error count — a positive count
/// means later stages must not run.
pub struct SemanticResult {
    pub scopes: ScopeTree,
    pub types: NodeTypeTable,
    pub error_count: u32,
}

/// Runs Scan then Check over `ast`, reporting through `sink`.
///
/// `ast` is mutated only through [`alir_ir::Ast::resolve_auto`] and
/// [`alir_ir::Ast::set_mangled_name`], both invoked from `check`.
pub fn analyze<S: DiagnosticSink>(ast: &mut Ast, filename: impl Into<String>, sink: &mut S) -> SemanticResult {
    let mut ctx = SemanticCtx::new(filename, sink);
    scan::scan_program(ast, &mut ctx);
    check::check_program(ast, &mut ctx);
    SemanticResult {
        scopes: ctx.scopes,
        types: ctx.types,
        error_count: ctx.error_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alir_ir::ast::{AstKind, LiteralValue};
    use alir_ir::{CollectingSink, Type};

    #[test]
    fn analyze_reports_zero_errors_for_a_well_typed_program() {
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
                mangled_name: None,
            },
        );
        ast.add_root(f);

        let mut sink = CollectingSink::new();
        let result = analyze(&mut ast, "main.alir", &mut sink);
        assert_eq!(result.error_count, 0);
        assert_eq!(*result.types.expect(lit), Type::int());
    }
}
