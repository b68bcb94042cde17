//! Symbols and the scope tree.
//!
//! Scopes form a tree rooted at the global scope, created on block/function/
//! class/namespace entry and retained for the whole compilation so IR
//! generation and diagnostics can walk them after Semantic finishes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::ScopeId;
use crate::types::Type;

/// What a [`Symbol`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Var,
    Func,
    Class,
    Enum,
    Namespace,
}

/// One named entity visible in a [`Scope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub is_mutable: bool,
    pub is_initialized: bool,
    /// Set only for `Class` symbols with a base class.
    pub parent_name: Option<String>,
    /// Inner scope for classes, namespaces, and functions.
    pub inner_scope: Option<ScopeId>,
    /// Ordered parameter types, set only for `Func` symbols.
    pub param_types: Vec<Type>,
}

impl Symbol {
    pub fn var(name: impl Into<String>, ty: Type, is_mutable: bool) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Var,
            ty,
            is_mutable,
            is_initialized: false,
            parent_name: None,
            inner_scope: None,
            param_types: Vec::new(),
        }
    }

    pub fn func(name: impl Into<String>, return_type: Type, param_types: Vec<Type>) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Func,
            ty: return_type,
            is_mutable: false,
            is_initialized: true,
            parent_name: None,
            inner_scope: None,
            param_types,
        }
    }

    pub fn class(name: impl Into<String>, parent_name: Option<String>) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Class,
            ty: Type::void(),
            is_mutable: false,
            is_initialized: true,
            parent_name,
            inner_scope: None,
            param_types: Vec::new(),
        }
    }

    pub fn enum_(name: impl Into<String>) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Enum,
            ty: Type::void(),
            is_mutable: false,
            is_initialized: true,
            parent_name: None,
            inner_scope: None,
            param_types: Vec::new(),
        }
    }

    pub fn namespace(name: impl Into<String>) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Namespace,
            ty: Type::void(),
            is_mutable: false,
            is_initialized: true,
            parent_name: None,
            inner_scope: None,
            param_types: Vec::new(),
        }
    }
}

/// What kind of construct opened a [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeRole {
    Global,
    Block,
    Function,
    Class,
    Namespace,
}

/// One level of lexical nesting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    pub role: ScopeRole,
    pub parent: Option<ScopeId>,
    /// Insertion-ordered so sibling-declaration order stays visible for
    /// diagnostics and for the name-resolution tie-break rule.
    pub symbols: IndexMap<String, Symbol>,
    /// Set for `Function` scopes: the type `return` must match.
    pub return_type: Option<Type>,
    /// Set for `Class` scopes: the class symbol this scope belongs to, so
    /// lookup can walk `parent_name` upward without a separate table.
    pub owning_class: Option<String>,
}

impl Scope {
    pub fn new(role: ScopeRole, parent: Option<ScopeId>) -> Self {
        Scope {
            role,
            parent,
            symbols: IndexMap::new(),
            return_type: None,
            owning_class: None,
        }
    }

    pub fn declare(&mut self, symbol: Symbol) -> Option<Symbol> {
        self.symbols.insert(symbol.name.clone(), symbol)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }
}

/// Arena owning every [`Scope`] created during one compilation.
///
/// Scopes are never removed once created; IR generation and diagnostics
/// consult the same tree Semantic built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    /// Creates a tree already containing the root global scope at id 0.
    pub fn new() -> Self {
        ScopeTree {
            scopes: vec![Scope::new(ScopeRole::Global, None)],
        }
    }

    pub fn global_id() -> ScopeId {
        ScopeId(0)
    }

    pub fn push(&mut self, role: ScopeRole, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(role, Some(parent)));
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Parent-chain walk only (no class/enum fallback — that lives in
    /// `alir-sema::lookup`, which has the class-symbol table needed to
    /// follow `parent_name`).
    pub fn resolve_in_chain(&self, start: ScopeId, name: &str) -> Option<(ScopeId, &Symbol)> {
        let mut current = Some(start);
        while let Some(id) = current {
            let scope = self.get(id);
            if let Some(sym) = scope.get(name) {
                return Some((id, sym));
            }
            current = scope.parent;
        }
        None
    }
}
