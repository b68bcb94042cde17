//! Name lookup.
//!
//! Three steps, in order: walk lexical parent scopes; if that crosses a
//! class scope and still fails, walk the class's `parent_name` chain; if
//! that still fails, scan visible `Enum` symbols for a matching member
//! (implicit enum-member resolution — see Design Notes, "Open question —
//! enum scoping", resolved to keep this fallback).

use alir_ir::{DiagnosticSink, ScopeId, ScopeRole, Symbol, SymbolKind};

use crate::ctx::SemanticCtx;

/// Resolves `name` starting from `start`, per the three-step algorithm.
pub fn resolve<S: DiagnosticSink>(ctx: &SemanticCtx<S>, start: ScopeId, name: &str) -> Option<Symbol> {
    if let Some((_, sym)) = ctx.scopes.resolve_in_chain(start, name) {
        return Some(sym.clone());
    }

    if let Some(found) = resolve_via_inheritance(ctx, start, name) {
        return Some(found);
    }

    resolve_via_enum_fallback(ctx, start, name)
}

/// Finds the nearest class scope on the lexical chain from `start` and
/// walks its `parent_name` links, checking each ancestor's member table.
fn resolve_via_inheritance<S: DiagnosticSink>(
    ctx: &SemanticCtx<S>,
    start: ScopeId,
    name: &str,
) -> Option<Symbol> {
    let mut current = Some(start);
    let mut owning_class = None;
    while let Some(id) = current {
        let scope = ctx.scopes.get(id);
        if scope.role == ScopeRole::Class {
            owning_class = scope.owning_class.clone();
            break;
        }
        current = scope.parent;
    }

    let mut class_name = owning_class?;
    loop {
        let class_symbol = ctx.class(&class_name)?;
        let parent_name = class_symbol.parent_name.clone()?;
        let parent_symbol = ctx.class(&parent_name)?;
        if let Some(inner) = parent_symbol.inner_scope {
            if let Some(member) = ctx.scopes.get(inner).get(name) {
                return Some(member.clone());
            }
        }
        class_name = parent_name;
    }
}

/// Finds a member (field or method signature) on `class_name`, walking up
/// its `parent_name` chain — the member-access/method-call counterpart of
/// [`resolve_via_inheritance`], entered directly from a known class name
/// rather than discovered from a lexical scope.
pub fn find_class_member<S: DiagnosticSink>(
    ctx: &SemanticCtx<S>,
    class_name: &str,
    member: &str,
) -> Option<Symbol> {
    let mut current = class_name.to_string();
    loop {
        let class_symbol = ctx.class(&current)?;
        if let Some(inner) = class_symbol.inner_scope {
            if let Some(sym) = ctx.scopes.get(inner).get(member) {
                return Some(sym.clone());
            }
        }
        current = class_symbol.parent_name.clone()?;
    }
}

/// Scans every `Enum` symbol visible from `start` (by lexical scope chain)
/// for an inner-scope member named `name`.
fn resolve_via_enum_fallback<S: DiagnosticSink>(
    ctx: &SemanticCtx<S>,
    start: ScopeId,
    name: &str,
) -> Option<Symbol> {
    let mut current = Some(start);
    while let Some(id) = current {
        let scope = ctx.scopes.get(id);
        for sym in scope.symbols.values() {
            if sym.kind == SymbolKind::Enum {
                if let Some(inner) = sym.inner_scope {
                    if let Some(member) = ctx.scopes.get(inner).get(name) {
                        return Some(member.clone());
                    }
                }
            }
        }
        current = scope.parent;
    }
    None
}
