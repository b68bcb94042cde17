//! `SemanticCtx`: the bundle of shared state threaded by hand through Scan
//! and Check (Design Notes, "Global singletons" — no globals, explicit
//! threading instead).

use indexmap::IndexMap;

use alir_ir::{DiagnosticSink, NodeTypeTable, Scope, ScopeId, ScopeRole, ScopeTree, Span, Symbol, Type};

/// Shared state for one compilation's Semantic pass.
///
/// `S` is the injected [`DiagnosticSink`]; Semantic never constructs its own
/// sink and never opens a terminal.
pub struct SemanticCtx<'a, S: DiagnosticSink> {
    pub filename: String,
    pub scopes: ScopeTree,
    pub types: NodeTypeTable,
    pub sink: &'a mut S,
    pub error_count: u32,
    current_scope: ScopeId,
    in_loop: u32,
    in_switch: u32,
    /// Name of the class currently being checked, for `this`-binding and
    /// `parent_name` chain walks. `None` at top level.
    pub current_class: Option<String>,
    /// Global-by-name registry of every class declared anywhere in the
    /// program, populated by Scan (Pass 1). Lookup consults this to walk a
    /// `parent_name` chain that is independent of lexical scope nesting.
    pub classes: IndexMap<String, Symbol>,
}

impl<'a, S: DiagnosticSink> SemanticCtx<'a, S> {
    pub fn new(filename: impl Into<String>, sink: &'a mut S) -> Self {
        let scopes = ScopeTree::new();
        let current_scope = ScopeTree::global_id();
        SemanticCtx {
            filename: filename.into(),
            scopes,
            types: NodeTypeTable::new(),
            sink,
            error_count: 0,
            current_scope,
            in_loop: 0,
            in_switch: 0,
            current_class: None,
            classes: IndexMap::new(),
        }
    }

    pub fn register_class(&mut self, symbol: Symbol) {
        self.classes.insert(symbol.name.clone(), symbol);
    }

    pub fn class(&self, name: &str) -> Option<&Symbol> {
        self.classes.get(name)
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current_scope
    }

    pub fn scope(&self) -> &Scope {
        self.scopes.get(self.current_scope)
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        self.scopes.get_mut(self.current_scope)
    }

    /// Pushes a child scope and makes it current; returns the previous
    /// scope so the caller can restore it after the block closes.
    pub fn push_scope(&mut self, role: ScopeRole) -> ScopeId {
        let previous = self.current_scope;
        self.current_scope = self.scopes.push(role, previous);
        previous
    }

    pub fn pop_scope_to(&mut self, previous: ScopeId) {
        self.current_scope = previous;
    }

    /// Makes an already-created scope current (used when the scope's id was
    /// needed before recursing into its body, e.g. to register a
    /// namespace/class symbol's `inner_scope` ahead of time). Returns the
    /// previous current scope.
    pub fn enter_scope(&mut self, id: ScopeId) -> ScopeId {
        let previous = self.current_scope;
        self.current_scope = id;
        previous
    }

    pub fn enter_loop(&mut self) {
        self.in_loop += 1;
    }

    pub fn exit_loop(&mut self) {
        self.in_loop -= 1;
    }

    pub fn enter_switch(&mut self) {
        self.in_switch += 1;
    }

    pub fn exit_switch(&mut self) {
        self.in_switch -= 1;
    }

    pub fn in_loop(&self) -> bool {
        self.in_loop > 0
    }

    pub fn in_switch(&self) -> bool {
        self.in_switch > 0
    }

    pub fn span(&self, line: u32, col: u32) -> Span {
        Span::new(self.filename.clone(), line, col)
    }

    pub fn error(&mut self, line: u32, col: u32, msg: impl Into<String>) {
        self.error_count += 1;
        let span = self.span(line, col);
        self.sink.error(span, msg.into());
    }

    pub fn info(&mut self, line: u32, col: u32, msg: impl Into<String>) {
        let span = self.span(line, col);
        self.sink.info(span, msg.into());
    }

    pub fn hint(&mut self, line: u32, col: u32, msg: impl Into<String>) {
        let span = self.span(line, col);
        self.sink.hint(span, msg.into());
    }

    pub fn warning(&mut self, line: u32, col: u32, msg: impl Into<String>) {
        let span = self.span(line, col);
        self.sink.warning(span, msg.into());
    }

    /// Records the expected return type for the function scope currently
    /// being entered.
    pub fn set_return_type(&mut self, ty: Type) {
        self.scope_mut().return_type = Some(ty);
    }

    /// Walks outward from the current scope to find the nearest enclosing
    /// function's expected return type.
    pub fn expected_return_type(&self) -> Option<&Type> {
        let mut id = Some(self.current_scope);
        while let Some(scope_id) = id {
            let scope = self.scopes.get(scope_id);
            if scope.return_type.is_some() {
                return scope.return_type.as_ref();
            }
            id = scope.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alir_ir::CollectingSink;

    #[test]
    fn push_and_pop_scope_restores_current() {
        let mut sink = CollectingSink::new();
        let mut ctx = SemanticCtx::new("main.alir", &mut sink);
        let global = ctx.current_scope();
        let prev = ctx.push_scope(ScopeRole::Block);
        assert_ne!(ctx.current_scope(), global);
        ctx.pop_scope_to(prev);
        assert_eq!(ctx.current_scope(), global);
    }

    #[test]
    fn loop_and_switch_counters_nest() {
        let mut sink = CollectingSink::new();
        let mut ctx = SemanticCtx::new("main.alir", &mut sink);
        assert!(!ctx.in_loop());
        ctx.enter_loop();
        ctx.enter_loop();
        assert!(ctx.in_loop());
        ctx.exit_loop();
        assert!(ctx.in_loop());
        ctx.exit_loop();
        assert!(!ctx.in_loop());
    }

    #[test]
    fn error_increments_count_and_forwards_to_sink() {
        let mut sink = CollectingSink::new();
        let mut ctx = SemanticCtx::new("main.alir", &mut sink);
        ctx.error(1, 1, "bad");
        assert_eq!(ctx.error_count, 1);
        assert_eq!(ctx.sink.error_count, 1);
    }

    #[test]
    fn expected_return_type_walks_up_through_blocks() {
        let mut sink = CollectingSink::new();
        let mut ctx = SemanticCtx::new("main.alir", &mut sink);
        ctx.push_scope(ScopeRole::Function);
        ctx.set_return_type(Type::int());
        ctx.push_scope(ScopeRole::Block);
        assert_eq!(ctx.expected_return_type(), Some(&Type::int()));
    }
}
